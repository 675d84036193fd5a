//! `[transform]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [transform]
//! minify = false              # Run the minifier on generated output
//! minify_mode = "whitespace"  # "whitespace" keeps names, "full" compresses and mangles
//! placeholder_param = "hmr"   # Query parameter carrying dependency placeholders
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::transform::MinifyMode;

/// Code generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Minify generated module text.
    pub minify: bool,

    /// How hard the minifier works when `minify` is on.
    pub minify_mode: MinifyMode,

    /// Query parameter name for per-dependency placeholder tokens.
    pub placeholder_param: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            minify: false,
            minify_mode: MinifyMode::Whitespace,
            placeholder_param: "hmr".into(),
        }
    }
}

impl TransformConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let param = &self.placeholder_param;
        if param.is_empty()
            || !param
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        {
            diag.error_with_hint(
                FieldPath::new("transform.placeholder_param"),
                format!("`{param}` is not a usable query parameter name"),
                "use ASCII letters, digits, `_` or `-`",
            );
        }
    }
}
