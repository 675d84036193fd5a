//! Path and module specifier utilities.
//!
//! Pure functions, no side effects except `normalize_path` (which may
//! touch the filesystem to canonicalize).

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first, falls back to joining with cwd.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Check if a specifier carries a URL scheme (`https:`, `node:`, `data:` ...)
///
/// A valid scheme has at least 2 characters before the colon (so Windows
/// drive letters like `C:` do not count) and only contains ASCII
/// alphanumerics or `+`, `-`, `.`, starting with a letter.
#[inline]
pub fn has_scheme(specifier: &str) -> bool {
    specifier.find(':').is_some_and(|pos| {
        let scheme = &specifier[..pos];
        pos > 1
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Check if a specifier is relative or absolute (`./x`, `../x`, `/x`).
#[inline]
pub fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
        || specifier == "."
        || specifier == ".."
}

/// Split a specifier into path and query (`./a.js?x=1` -> (`./a.js`, `x=1`)).
#[inline]
pub fn split_query(specifier: &str) -> (&str, &str) {
    specifier.split_once('?').unwrap_or((specifier, ""))
}

/// Extension of a specifier's path part, without the dot.
pub fn specifier_extension(specifier: &str) -> Option<&str> {
    let (path, _) = split_query(specifier);
    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}
