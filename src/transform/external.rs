//! External collaborators: transpilation and minification.
//!
//! Both are consumed through narrow traits so the pipeline never depends on
//! a particular tool. The defaults are an identity transpiler and an oxc
//! based minifier.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use serde::{Deserialize, Serialize};

// =============================================================================
// Transpiler
// =============================================================================

/// Turns typed/annotated source into executable module text.
pub trait Transpiler: Send + Sync {
    fn transpile(&self, source: &str, file_id: &str) -> Result<String, String>;
}

/// Identity transpiler for sources that are already plain modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Transpiler for Passthrough {
    fn transpile(&self, source: &str, _file_id: &str) -> Result<String, String> {
        Ok(source.to_string())
    }
}

// =============================================================================
// Minifier
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifyMode {
    /// Strip whitespace and comments only; names survive.
    #[default]
    Whitespace,
    /// Compress and mangle.
    Full,
}

pub trait Minifier: Send + Sync {
    fn minify(&self, text: &str, file_id: &str, mode: MinifyMode) -> Result<String, String>;
}

/// Minifier backed by oxc.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcMinifier;

impl Minifier for OxcMinifier {
    fn minify(&self, text: &str, file_id: &str, mode: MinifyMode) -> Result<String, String> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, text, SourceType::mjs()).parse();
        if let Some(err) = ret.errors.first() {
            return Err(format!("{file_id}: {err}"));
        }
        let mut program = ret.program;

        let codegen = Codegen::new().with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        });

        let code = match mode {
            MinifyMode::Whitespace => codegen.build(&program).code,
            MinifyMode::Full => {
                let options = MinifierOptions {
                    mangle: Some(MangleOptions::default()),
                    compress: Some(CompressOptions::smallest()),
                };
                let ret = oxc::minifier::Minifier::new(options).minify(&allocator, &mut program);
                codegen.with_scoping(ret.scoping).build(&program).code
            }
        };
        Ok(code)
    }
}
