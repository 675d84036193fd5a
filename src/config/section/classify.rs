//! `[classify]` section configuration.
//!
//! Marker tokens used to classify a module before planning.
//!
//! # Example
//!
//! ```toml
//! [classify]
//! component_marker = "defineComponent"   # Component-definition marker
//! app_marker = "createApp"               # Application-creation marker
//! mount_marker = ".mount("               # Mount invocation marker
//! resolve_call = "resolveComponent"      # Name-based component resolution call
//! component_extensions = ["vue"]         # Extensions of component files
//! core_ratio = 0.7                       # Import/export share for core-definition files
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Module classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Token whose presence marks a component definition file.
    pub component_marker: String,

    /// Application-creation marker (entry point detection, with `mount_marker`).
    pub app_marker: String,

    /// Mount invocation marker (entry point detection, with `app_marker`).
    pub mount_marker: String,

    /// Name of the framework's name-based component resolution call.
    pub resolve_call: String,

    /// File extensions (without dot) of component-kind modules.
    pub component_extensions: Vec<String>,

    /// Minimum `(import + export) / total` statement ratio for a
    /// core-definition file.
    pub core_ratio: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            component_marker: "defineComponent".into(),
            app_marker: "createApp".into(),
            mount_marker: ".mount(".into(),
            resolve_call: "resolveComponent".into(),
            component_extensions: vec!["vue".into()],
            core_ratio: 0.7,
        }
    }
}

impl ClassifyConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let markers = [
            (FieldPath::new("classify.component_marker"), &self.component_marker),
            (FieldPath::new("classify.app_marker"), &self.app_marker),
            (FieldPath::new("classify.mount_marker"), &self.mount_marker),
            (FieldPath::new("classify.resolve_call"), &self.resolve_call),
        ];
        for (field, value) in markers {
            if value.trim().is_empty() {
                diag.error(field, "marker must not be empty");
            }
        }

        if !(self.core_ratio > 0.0 && self.core_ratio <= 1.0) {
            diag.error_with_hint(
                FieldPath::new("classify.core_ratio"),
                format!("ratio {} is out of range", self.core_ratio),
                "use a value in (0, 1]",
            );
        }

        if self
            .component_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            diag.error_with_hint(
                FieldPath::new("classify.component_extensions"),
                "extensions must be non-empty and written without a leading dot",
                "write `vue`, not `.vue`",
            );
        }
    }

    /// Whether `ext` (without dot) names a component-kind file.
    pub fn is_component_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.component_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}
