//! Cache key construction.
//!
//! A key is the ordered 5-tuple
//! `(normalizedFileId, contentHash, configHash, envHash, depsHash)`
//! rendered as five pipe-delimited fields. Hashes are lowercase hex and file
//! identities have `|` percent-encoded, so the delimiter never appears inside
//! a field.

use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use serde_json::{Map, Value};

use super::CacheError;

/// Field delimiter of the rendered key.
pub const KEY_DELIMITER: char = '|';

/// Characters escaped in file identities: the delimiter, and `%` so the
/// encoding stays unambiguous.
const FILE_ID_ESCAPE: &AsciiSet = &CONTROLS.add(b'|').add(b'%');

// =============================================================================
// Content Hash
// =============================================================================

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash representing "no content" (all zeros).
    #[inline]
    pub const fn empty() -> Self {
        Self([0; 32])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Streaming blake3 hash of a file. Missing or unreadable files hash as
/// [`ContentHash::empty`].
pub fn hash_file(path: &Path) -> ContentHash {
    let Ok(file) = File::open(path) else {
        return ContentHash::empty();
    };

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return ContentHash::empty(),
        }
    }

    ContentHash::new(*hasher.finalize().as_bytes())
}

// =============================================================================
// Key Components
// =============================================================================

/// Normalize a file identity: forward slashes, delimiter escaped.
pub fn normalize_file_id(file_id: &str) -> String {
    let slashed = file_id.replace('\\', "/");
    utf8_percent_encode(&slashed, FILE_ID_ESCAPE).to_string()
}

/// Canonical form of a configuration value.
///
/// Object keys are sorted recursively. Arrays of primitives are sorted by
/// their string representation; arrays holding objects or arrays keep their
/// order and are normalized element-wise.
pub fn normalize_config(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .map(|k| (k.clone(), normalize_config(&map[k])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) if items.iter().all(is_primitive) => {
            let mut items = items.clone();
            items.sort_by(primitive_order);
            Value::Array(items)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_config).collect()),
        other => other.clone(),
    }
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Total order over primitives: raw string form first, JSON form breaks ties
/// (so `"1"` and `1` still sort deterministically).
fn primitive_order(a: &Value, b: &Value) -> Ordering {
    raw_string(a)
        .cmp(&raw_string(b))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

fn raw_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Hash of the normalized configuration. `None` and `null` hash like `{}`.
pub fn config_hash<C: Serialize + ?Sized>(config: Option<&C>) -> Result<ContentHash, CacheError> {
    let value = match config {
        Some(config) => serde_json::to_value(config)?,
        None => Value::Null,
    };
    let value = match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let canonical = serde_json::to_string(&normalize_config(&value))?;
    Ok(ContentHash::of(canonical))
}

/// Ordered hash over an explicit allow-list of environment variables.
///
/// Unset and empty variables hash differently.
pub fn env_hash<F>(allow_list: &[String], lookup: F) -> ContentHash
where
    F: Fn(&str) -> Option<String>,
{
    let mut hasher = blake3::Hasher::new();
    for name in allow_list {
        hasher.update(name.as_bytes());
        match lookup(name) {
            Some(value) => {
                hasher.update(&[1]);
                hasher.update(&(value.len() as u64).to_le_bytes());
                hasher.update(value.as_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(&[0xff]);
    }
    ContentHash::new(*hasher.finalize().as_bytes())
}

// =============================================================================
// Cache Key
// =============================================================================

/// Five-field compilation cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub file_id: String,
    pub content: ContentHash,
    pub config: ContentHash,
    pub env: ContentHash,
    pub deps: ContentHash,
}

impl CacheKey {
    pub fn new(
        file_id: &str,
        content: ContentHash,
        config: ContentHash,
        env: ContentHash,
        deps: ContentHash,
    ) -> Self {
        Self {
            file_id: normalize_file_id(file_id),
            content,
            config,
            env,
            deps,
        }
    }

    /// The five rendered fields, in key order.
    pub fn fields(&self) -> [String; 5] {
        [
            self.file_id.clone(),
            self.content.to_hex(),
            self.config.to_hex(),
            self.env.to_hex(),
            self.deps.to_hex(),
        ]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields();
        f.write_str(&fields.join(&KEY_DELIMITER.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
