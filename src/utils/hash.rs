//! Fast non-cryptographic hashing using FxHash.
//!
//! Used for short deterministic fingerprints (placeholder tokens).
//! Cache keys use blake3 instead, see `cache::key`.
//!
//! ```ignore
//! let h = hash::compute("./dep.js"); // -> u64
//! let fp = hash::fingerprint("./dep.js"); // -> "a1b2c3d4"
//! ```

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Compute hash and return as 8-char hex fingerprint.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    format!("{:016x}", compute(value))[..8].to_string()
}
