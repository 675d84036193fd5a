//! Cached end-to-end module transformation.
//!
//! ```text
//! transform(file_id, source)
//!     │
//!     ├── cache hit ──────────────────────────────► { data }
//!     │
//!     └── transpile ─► parse/plan ─► select ─► generate ─► minify? ─► cache.set
//!                                                                       │
//!          any failure ─► { error } (nothing cached)                    ▼
//!                                                                    { data }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::TransformError;
use super::codegen::{CodegenOptions, generate};
use super::external::{MinifyMode, Minifier, OxcMinifier, Passthrough, Transpiler};
use super::plan::{TransformPlan, plan_module};
use super::strategy::Strategy;
use crate::cache::CompilationCache;
use crate::config::{ClassifyConfig, ReliveConfig};
use crate::debug;

// =============================================================================
// Result
// =============================================================================

/// Structured outcome of a transformation. Exactly one field is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub error: Option<String>,
    pub data: Option<String>,
}

impl TransformResult {
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            error: None,
            data: Some(data.into()),
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<String, String> {
        match (self.error, self.data) {
            (Some(error), _) => Err(error),
            (None, Some(data)) => Ok(data),
            (None, None) => Err("empty transform result".to_string()),
        }
    }
}

/// Generated text together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub strategy: Strategy,
    pub code: String,
}

// =============================================================================
// Transformer
// =============================================================================

/// Transpile, plan, generate and optionally minify modules, behind the
/// compilation cache.
pub struct ModuleTransformer {
    classify: ClassifyConfig,
    codegen: CodegenOptions,
    minify: Option<MinifyMode>,
    /// Everything that changes output, hashed into cache keys.
    options: serde_json::Value,
    cache: Arc<CompilationCache>,
    transpiler: Box<dyn Transpiler>,
    minifier: Box<dyn Minifier>,
}

impl ModuleTransformer {
    pub fn new(config: &ReliveConfig) -> Self {
        Self {
            classify: config.classify.clone(),
            codegen: CodegenOptions::from(&config.transform),
            minify: config.transform.minify.then_some(config.transform.minify_mode),
            options: config.transform_options(),
            cache: Arc::new(CompilationCache::from_config(config)),
            transpiler: Box::new(Passthrough),
            minifier: Box::new(OxcMinifier),
        }
    }

    pub fn with_cache(mut self, cache: Arc<CompilationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_transpiler(mut self, transpiler: impl Transpiler + 'static) -> Self {
        self.transpiler = Box::new(transpiler);
        self
    }

    pub fn with_minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.minifier = Box::new(minifier);
        self
    }

    pub fn cache(&self) -> &Arc<CompilationCache> {
        &self.cache
    }

    /// Transform module text. Never panics and never returns `Err`: failures
    /// are reported in [`TransformResult::error`].
    pub fn transform(&self, file_id: &str, source: &str) -> TransformResult {
        if let Some(hit) = self
            .cache
            .get_content(file_id, source.as_bytes(), Some(&self.options))
        {
            debug!("cache"; "hit {}", file_id);
            return TransformResult::ok(hit);
        }

        match self.compile(file_id, source) {
            Ok(compiled) => {
                debug!("transform"; "{} -> {}", file_id, compiled.strategy);
                self.cache
                    .set_content(file_id, source.as_bytes(), Some(&self.options), compiled.code.as_str());
                TransformResult::ok(compiled.code)
            }
            Err(err) => {
                debug!("transform"; "{}", err);
                TransformResult::err(err)
            }
        }
    }

    /// Read and transform a file on disk.
    pub fn transform_file(&self, path: &Path) -> TransformResult {
        match fs::read_to_string(path) {
            Ok(source) => self.transform(&path.to_string_lossy(), &source),
            Err(err) => TransformResult::err(format!("failed to read `{}`: {err}", path.display())),
        }
    }

    /// Uncached transformation, reporting the chosen strategy.
    pub fn compile(&self, file_id: &str, source: &str) -> Result<Compiled, TransformError> {
        let plan = self.plan(file_id, source)?;
        let strategy = Strategy::for_plan(&plan);
        let mut code = generate(&plan, strategy, &self.codegen);

        if let Some(mode) = self.minify {
            code = self
                .minifier
                .minify(&code, file_id, mode)
                .map_err(|message| TransformError::Minify {
                    file: file_id.to_string(),
                    message,
                })?;
        }

        Ok(Compiled { strategy, code })
    }

    /// Transpile and plan without generating.
    pub fn plan(&self, file_id: &str, source: &str) -> Result<TransformPlan, TransformError> {
        let executable = self
            .transpiler
            .transpile(source, file_id)
            .map_err(|message| TransformError::Transpile {
                file: file_id.to_string(),
                message,
            })?;
        plan_module(file_id, &executable, &self.classify)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls so cache hits are observable.
    #[derive(Clone, Default)]
    struct CountingTranspiler(Arc<AtomicUsize>);

    impl Transpiler for CountingTranspiler {
        fn transpile(&self, source: &str, _file_id: &str) -> Result<String, String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(source.to_string())
        }
    }

    struct FailingTranspiler;

    impl Transpiler for FailingTranspiler {
        fn transpile(&self, _source: &str, _file_id: &str) -> Result<String, String> {
            Err("unexpected token `:`".to_string())
        }
    }

    fn transformer(toml: &str) -> ModuleTransformer {
        ModuleTransformer::new(&test_parse_config(toml))
    }

    const UTILS: &str = "import { a, b } from './dep.js';\nconsole.log(a, b);";

    #[test]
    fn test_transform_wraps_plain_module() {
        let result = transformer("").transform("utils.js", UTILS);
        let data = result.into_result().unwrap();
        assert_eq!(
            data,
            "import { a, b } from './dep.js';\n(async () => {\nconsole.log(a, b);\n})();\n"
        );
    }

    #[test]
    fn test_second_transform_hits_cache() {
        let calls = CountingTranspiler::default();
        let t = transformer("").with_transpiler(calls.clone());

        let first = t.transform("utils.js", UTILS);
        let second = t.transform("utils.js", UTILS);
        assert_eq!(first, second);
        assert_eq!(calls.0.load(Ordering::SeqCst), 1);
        assert_eq!(t.cache().len(), 1);
    }

    #[test]
    fn test_option_change_misses_cache() {
        let calls = CountingTranspiler::default();
        let cache = Arc::new(CompilationCache::default());

        let plain = transformer("")
            .with_cache(cache.clone())
            .with_transpiler(calls.clone());
        let minified = transformer("[transform]\nminify = true")
            .with_cache(cache.clone())
            .with_transpiler(calls.clone());

        plain.transform("utils.js", UTILS);
        minified.transform("utils.js", UTILS);
        assert_eq!(calls.0.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_parse_error_is_structured() {
        let t = transformer("");
        let result = t.transform("broken.js", "import { from");

        assert!(!result.is_ok());
        assert!(result.data.is_none());
        assert!(result.error.unwrap().contains("broken.js"));
        assert!(t.cache().is_empty());
    }

    #[test]
    fn test_transpile_error_is_structured() {
        let result = transformer("")
            .with_transpiler(FailingTranspiler)
            .transform("a.ts", "let x: number = 1;");
        assert!(result.error.unwrap().contains("unexpected token"));
    }

    #[test]
    fn test_result_serializes_with_null_data() {
        let json = serde_json::to_value(TransformResult::err("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom", "data": null}));
    }

    #[test]
    fn test_compile_reports_strategy() {
        let compiled = transformer("")
            .compile("utils.js", UTILS)
            .unwrap();
        assert_eq!(compiled.strategy, Strategy::ModuleStaticWrapped);
    }

    /// Records the mode it was asked for and returns the text unchanged.
    #[derive(Clone, Default)]
    struct RecordingMinifier(Arc<parking_lot::Mutex<Vec<MinifyMode>>>);

    impl Minifier for RecordingMinifier {
        fn minify(&self, text: &str, _file_id: &str, mode: MinifyMode) -> Result<String, String> {
            self.0.lock().push(mode);
            Ok(text.to_string())
        }
    }

    #[test]
    fn test_minify_mode_comes_from_config() {
        let seen = RecordingMinifier::default();
        transformer("[transform]\nminify = true\nminify_mode = \"full\"")
            .with_minifier(seen.clone())
            .transform("utils.js", UTILS);
        assert_eq!(*seen.0.lock(), [MinifyMode::Full]);

        let unused = RecordingMinifier::default();
        transformer("[transform]\nminify_mode = \"full\"")
            .with_minifier(unused.clone())
            .transform("utils.js", UTILS);
        assert!(unused.0.lock().is_empty());
    }

    #[test]
    fn test_minify_runs_when_enabled() {
        let data = transformer("[transform]\nminify = true")
            .transform("utils.js", UTILS)
            .into_result()
            .unwrap();
        assert!(data.contains("async"));
        assert!(!data.contains("(async () => {"));
    }
}
