//! Compilation Cache
//!
//! Fronts the transform pipeline so unchanged modules skip classify and
//! codegen. Entries are keyed on the full five-field [`CacheKey`]; a hit
//! needs every field to match.
//!
//! - Capacity bound: the oldest-inserted entry is evicted on overflow
//!   (insertion order, not access order).
//! - Expiry: optional, checked lazily on lookup.
//! - Failures (unreadable source, unserializable config) count as a miss.

pub mod key;

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

pub use key::{CacheKey, ContentHash, config_hash, env_hash, hash_file, normalize_config};

use crate::config::ReliveConfig;
use crate::debug;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to serialize configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Environment
// =============================================================================

/// Where allow-listed environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of values.
    Fixed(FxHashMap<String, String>),
}

impl EnvSource {
    pub fn lookup(&self, name: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var(name).ok(),
            Self::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub result_text: String,
    pub inserted_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: FxHashMap<String, CacheEntry>,
    /// Rendered keys, oldest insertion first.
    order: VecDeque<String>,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(entry)
    }
}

/// Thread-safe compilation cache.
#[derive(Debug)]
pub struct CompilationCache {
    state: Mutex<CacheState>,
    /// Maximum number of entries, `0` for unbounded.
    capacity: usize,
    ttl: Option<Duration>,
    env_allow_list: Vec<String>,
    env_source: EnvSource,
    manifest: Option<PathBuf>,
}

impl Default for CompilationCache {
    fn default() -> Self {
        Self::new(0, None)
    }
}

impl CompilationCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
            ttl,
            env_allow_list: Vec::new(),
            env_source: EnvSource::Process,
            manifest: None,
        }
    }

    pub fn from_config(config: &ReliveConfig) -> Self {
        Self::new(config.cache.capacity, config.cache.ttl())
            .with_env(config.cache.env.clone(), EnvSource::Process)
            .with_manifest(config.manifest_path())
    }

    pub fn with_env(mut self, allow_list: Vec<String>, source: EnvSource) -> Self {
        self.env_allow_list = allow_list;
        self.env_source = source;
        self
    }

    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Build the key for `file_id` with the given content and configuration.
    pub fn key<C: Serialize + ?Sized>(
        &self,
        file_id: &str,
        content: &[u8],
        config: Option<&C>,
    ) -> Result<CacheKey, CacheError> {
        let env = env_hash(&self.env_allow_list, |name| self.env_source.lookup(name));
        let deps = self
            .manifest
            .as_deref()
            .map_or_else(ContentHash::empty, hash_file);

        Ok(CacheKey::new(
            file_id,
            ContentHash::of(content),
            config_hash(config)?,
            env,
            deps,
        ))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up `file_id`, hashing the file's current content from disk.
    pub fn get<C: Serialize + ?Sized>(&self, file_id: &str, config: Option<&C>) -> Option<String> {
        let content = read_source(file_id).map_err(log_miss).ok()?;
        self.get_content(file_id, &content, config)
    }

    /// Look up `file_id` for content already in memory.
    pub fn get_content<C: Serialize + ?Sized>(
        &self,
        file_id: &str,
        content: &[u8],
        config: Option<&C>,
    ) -> Option<String> {
        let key = self.key(file_id, content, config).map_err(log_miss).ok()?;
        self.lookup(&key.to_string())
    }

    fn lookup(&self, rendered: &str) -> Option<String> {
        let mut state = self.state.lock();
        let expired = {
            let entry = state.entries.get(rendered)?;
            self.ttl.is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
        };

        if expired {
            state.remove(rendered);
            debug!("cache"; "expired {}", rendered);
            return None;
        }

        state.entries.get(rendered).map(|entry| entry.result_text.clone())
    }

    // ========================================================================
    // Store
    // ========================================================================

    /// Store `text` for `file_id`, hashing the file's current content from disk.
    pub fn set<C: Serialize + ?Sized>(&self, file_id: &str, config: Option<&C>, text: impl Into<String>) {
        match read_source(file_id) {
            Ok(content) => self.set_content(file_id, &content, config, text),
            Err(err) => log_skip(err),
        }
    }

    /// Store `text` for `file_id` and in-memory content.
    pub fn set_content<C: Serialize + ?Sized>(
        &self,
        file_id: &str,
        content: &[u8],
        config: Option<&C>,
        text: impl Into<String>,
    ) {
        match self.key(file_id, content, config) {
            Ok(key) => self.insert(key, text.into()),
            Err(err) => log_skip(err),
        }
    }

    fn insert(&self, key: CacheKey, result_text: String) {
        let rendered = key.to_string();
        let mut state = self.state.lock();

        // Re-setting a key counts as a fresh insertion.
        state.remove(&rendered);
        state.order.push_back(rendered.clone());
        state.entries.insert(
            rendered,
            CacheEntry {
                key,
                result_text,
                inserted_at: Instant::now(),
            },
        );

        while self.capacity > 0 && state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            debug!("cache"; "evicted {}", oldest);
        }
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }
}

fn read_source(file_id: &str) -> Result<Vec<u8>, CacheError> {
    let path = Path::new(file_id);
    fs::read(path).map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn log_miss(err: CacheError) -> CacheError {
    debug!("cache"; "treating as miss: {}", err);
    err
}

fn log_skip(err: CacheError) {
    debug!("cache"; "not storing: {}", err);
}

// =============================================================================
// Tests
// =============================================================================
