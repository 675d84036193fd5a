//! `[cache]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! capacity = 512                          # Max entries, 0 = unbounded
//! ttl_secs = 0                            # Entry lifetime, 0 = never expire
//! env = ["NODE_ENV", "BASE_URL", "MODE"]  # Env allow-list hashed into keys
//! manifest = "package.json"               # Dependency manifest hashed into keys
//! ```

use std::path::PathBuf;
use std::time::Duration;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Compilation cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries (0 = unbounded).
    pub capacity: usize,

    /// Entry lifetime in seconds (0 = never expire).
    pub ttl_secs: u64,

    /// Ordered allow-list of environment variables that affect output.
    pub env: Vec<String>,

    /// Dependency manifest whose content is part of every key
    /// (relative to the config file directory).
    pub manifest: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            ttl_secs: 0,
            env: vec!["NODE_ENV".into(), "BASE_URL".into(), "MODE".into()],
            manifest: PathBuf::from("package.json"),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let mut seen = FxHashSet::default();
        for name in &self.env {
            if name.is_empty() || name.contains('=') {
                diag.error(
                    FieldPath::new("cache.env"),
                    format!("`{name}` is not a valid environment variable name"),
                );
            } else if !seen.insert(name.as_str()) {
                diag.error(FieldPath::new("cache.env"), format!("`{name}` listed twice"));
            }
        }
        if self.manifest.as_os_str().is_empty() {
            diag.error(FieldPath::new("cache.manifest"), "manifest path must not be empty");
        }
    }
}
