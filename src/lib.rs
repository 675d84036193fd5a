//! relive - hot-reload module transformer.
//!
//! Rewrites source modules so a subset of their imports can be swapped at
//! runtime, caches the output, and reconciles change events against a live
//! component tree.
//!
//! # Module Structure
//!
//! ```text
//! transform/   # classify, plan, generate (oxc)
//! cache/       # five-field compilation cache
//! reload/      # runtime reconciler and event dispatch
//! config/      # relive.toml
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod logger;
pub mod reload;
pub mod transform;
pub mod utils;

pub use cache::CompilationCache;
pub use config::ReliveConfig;
pub use reload::{ComponentHost, HotReloader, ReloadOutcome};
pub use transform::{ModuleTransformer, TransformResult};
