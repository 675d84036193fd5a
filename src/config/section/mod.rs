//! Configuration section definitions.
//!
//! Each module corresponds to a section in `relive.toml`:
//!
//! | Module      | TOML Section   | Purpose                                  |
//! |-------------|----------------|------------------------------------------|
//! | `classify`  | `[classify]`   | Marker tokens and core-definition ratio  |
//! | `cache`     | `[cache]`      | Compilation cache bounds and key inputs  |
//! | `transform` | `[transform]`  | Code generation and minification         |
//! | `log`       | `[log]`        | Logging verbosity                        |

mod cache;
mod classify;
mod log;
mod transform;

pub use cache::CacheConfig;
pub use classify::ClassifyConfig;
pub use log::LogConfig;
pub use transform::TransformConfig;
