//! Cache-busted module URLs.
//!
//! Plain reloads append `?t=<timestamp>`. Rewritten component imports carry
//! a per-dependency placeholder (`__relive_<fingerprint>__`) which is filled
//! at reload time: the changed dependency gets a fresh stamp, every other
//! dependency gets `0` so its module identity is kept.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::utils::hash::fingerprint;

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"__relive_([0-9a-f]{8})__").ok());

/// Value substituted for dependencies that did not change.
pub const STABLE_STAMP: &str = "0";

/// Deterministic placeholder token for a source path.
pub fn placeholder_token(source_path: &str) -> String {
    format!("__relive_{}__", fingerprint(source_path))
}

/// `path?t=<timestamp>` (or `&t=` when a query exists).
pub fn bust_url(relative_path: &str, timestamp: u64) -> String {
    let separator = if relative_path.contains('?') { '&' } else { '?' };
    format!("{relative_path}{separator}t={timestamp}")
}

/// Substitute every placeholder in `code`.
///
/// The placeholder belonging to one of `changed` becomes `stamp`, all others
/// become [`STABLE_STAMP`].
pub fn fill_placeholders(code: &str, changed: &[&str], stamp: &str) -> String {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return code.to_string();
    };
    let changed: Vec<String> = changed.iter().map(|path| fingerprint(*path)).collect();

    re.replace_all(code, |caps: &Captures<'_>| {
        if changed.iter().any(|fp| fp == &caps[1]) {
            stamp.to_string()
        } else {
            STABLE_STAMP.to_string()
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bust_url() {
        assert_eq!(bust_url("/src/Card.vue", 42), "/src/Card.vue?t=42");
        assert_eq!(bust_url("/src/Card.vue?vue&type=script", 42), "/src/Card.vue?vue&type=script&t=42");
    }

    #[test]
    fn test_placeholder_token_is_per_path() {
        assert_eq!(placeholder_token("./a.js"), placeholder_token("./a.js"));
        assert_ne!(placeholder_token("./a.js"), placeholder_token("./b.js"));
        assert!(placeholder_token("./a.js").starts_with("__relive_"));
    }

    #[test]
    fn test_fill_only_changed_dependency() {
        let code = format!(
            "import {{ a }} from \"./a.js?hmr={}\";\nimport {{ b }} from \"./b.js?hmr={}\";",
            placeholder_token("./a.js"),
            placeholder_token("./b.js"),
        );
        let filled = fill_placeholders(&code, &["./a.js"], "1700");
        assert!(filled.contains("./a.js?hmr=1700"));
        assert!(filled.contains("./b.js?hmr=0"));
        assert!(!filled.contains("__relive_"));
    }
}
