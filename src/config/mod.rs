//! Configuration management for `relive.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── cache      # [cache]
//! │   ├── classify   # [classify]
//! │   ├── log        # [log]
//! │   └── transform  # [transform]
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config file discovery
//! └── mod.rs         # ReliveConfig (this file)
//! ```

pub mod section;
pub mod types;
mod util;

pub use section::{CacheConfig, ClassifyConfig, LogConfig, TransformConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use crate::log;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "relive.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing relive.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReliveConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Module classification markers
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Compilation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Code generation settings
    #[serde(default)]
    pub transform: TransformConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl ReliveConfig {
    /// Load configuration from a file path.
    ///
    /// A missing file yields the defaults rooted at the file's directory;
    /// a present but malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", path.display());
            Self::default()
        };

        config.config_path = path.to_path_buf();
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.set_root(&root);
        config.validate()?;

        crate::logger::set_verbose(config.log.verbose || crate::logger::is_verbose());
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Absolute path of the dependency manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root_join(&self.cache.manifest)
    }

    /// Options that influence generated output, as hashed into cache keys.
    ///
    /// Only `[classify]` and `[transform]` are included: cache bounds and
    /// logging never change what a module compiles to.
    pub fn transform_options(&self) -> serde_json::Value {
        serde_json::json!({
            "classify": self.classify,
            "transform": self.transform,
        })
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, collecting every error before failing.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.classify.validate(&mut diag);
        self.cache.validate(&mut diag);
        self.transform.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ReliveConfig {
    let (parsed, ignored) = ReliveConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = ReliveConfig::from_str("[classify\nmarker = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[classify]\ncore_ratio = 0.5\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ReliveConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.classify.core_ratio, 0.5);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[classify]\ncore_ratio = 1.5\nresolve_call = \"\"\n[transform]\nplaceholder_param = \"\"",
        );
        let err = config.validate().unwrap_err();
        let diag = match err.downcast::<ConfigError>().unwrap() {
            ConfigError::Diagnostics(diag) => diag,
            other => panic!("expected diagnostics, got {other:?}"),
        };
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = ReliveConfig::load(&path).unwrap();
        assert_eq!(config.get_root(), dir.path());
        assert_eq!(config.manifest_path(), dir.path().join("package.json"));
        assert_eq!(config.cache.capacity, 512);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[cache]\ncapacity = 8\nmanifest = \"deps.lock\"").unwrap();

        let config = ReliveConfig::load(&path).unwrap();
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.manifest_path(), dir.path().join("deps.lock"));
    }

    #[test]
    fn test_transform_options_ignore_cache_section() {
        let a = test_parse_config("[cache]\ncapacity = 1");
        let b = test_parse_config("[cache]\ncapacity = 2");
        assert_eq!(a.transform_options(), b.transform_options());

        let c = test_parse_config("[transform]\nminify = true");
        assert_ne!(a.transform_options(), c.transform_options());
    }
}
