//! Module Transformation
//!
//! Rewrites a module's import/export surface into a shape whose
//! dependencies can be swapped at runtime.
//!
//! # Architecture
//!
//! ```text
//! source ─► Transpiler ─► ModuleRecord ─► TransformPlan ─► Strategy ─► codegen ─► Minifier
//!           (external)     (oxc parse)     (classify)       (table)               (optional)
//! ```
//!
//! # Modules
//!
//! - `module` - Parsed module: top-level statements and import bindings
//! - `classify` - Component / entry point / core-definition detection
//! - `plan` - Split imports into passthrough and rebindable groups
//! - `strategy` - Closed set of output shapes and the selection table
//! - `codegen` - Text generation per strategy
//! - `external` - Transpiler and minifier collaborators
//! - `pipeline` - Cached end-to-end transformation

pub mod classify;
pub mod codegen;
pub mod external;
pub mod module;
pub mod pipeline;
pub mod plan;
pub mod strategy;

use thiserror::Error;

pub use classify::{ModuleFlags, SpecifierKind};
pub use codegen::{CodegenOptions, generate};
pub use external::{MinifyMode, Minifier, OxcMinifier, Passthrough, Transpiler};
pub use module::{BindingKind, ImportBinding, ModuleRecord};
pub use pipeline::{ModuleTransformer, TransformResult};
pub use plan::{ImportGroup, TransformPlan, plan};
pub use strategy::{ModuleShape, Strategy};

/// Errors raised while turning source text into patchable module text.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to parse `{file}`: {message}")]
    Parse { file: String, message: String },

    #[error("failed to transpile `{file}`: {message}")]
    Transpile { file: String, message: String },

    #[error("failed to minify `{file}`: {message}")]
    Minify { file: String, message: String },
}
