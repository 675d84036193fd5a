//! Module Classification
//!
//! Pure functions deciding what kind of module a file is and what kind of
//! dependency each import specifier names. No parsing happens here: the
//! statement list comes from `module::parse_statements`.

use regex::Regex;
use rustc_hash::FxHashSet;

use super::module::{StatementKind, TopLevelStatement};
use crate::config::ClassifyConfig;
use crate::utils::path::{has_scheme, is_path_specifier};

// =============================================================================
// Module Flags
// =============================================================================

/// Derived classification of a module.
///
/// Component and entry point checks run first; core-definition detection
/// only happens when neither holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleFlags {
    pub is_component_file: bool,
    pub is_entry_point_file: bool,
    pub is_core_definition_file: bool,
}

impl ModuleFlags {
    /// Whether every import of this module must stay static.
    pub fn forces_static_imports(&self) -> bool {
        self.is_entry_point_file || self.is_core_definition_file
    }
}

/// Classify a module from its text and top-level statements.
pub fn classify(
    source: &str,
    statements: &[TopLevelStatement],
    config: &ClassifyConfig,
) -> ModuleFlags {
    let is_component_file = source.contains(config.component_marker.as_str());
    let is_entry_point_file = source.contains(config.app_marker.as_str())
        && source.contains(config.mount_marker.as_str());

    let is_core_definition_file = !is_component_file
        && !is_entry_point_file
        && is_core_definition(statements, config.core_ratio);

    ModuleFlags {
        is_component_file,
        is_entry_point_file,
        is_core_definition_file,
    }
}

/// A core-definition file is almost entirely an import/re-export surface.
///
/// Requires at least two statements, at least one local import, and an
/// import-or-export share of at least `ratio`.
fn is_core_definition(statements: &[TopLevelStatement], ratio: f64) -> bool {
    if statements.len() < 2 {
        return false;
    }

    let has_local_import = statements.iter().any(|stmt| match &stmt.kind {
        StatementKind::Import(decl) => specifier_kind(&decl.source_path) == SpecifierKind::Local,
        _ => false,
    });
    if !has_local_import {
        return false;
    }

    let surface = statements
        .iter()
        .filter(|s| s.is_import() || s.is_export())
        .count();

    #[allow(clippy::cast_precision_loss)]
    let share = surface as f64 / statements.len() as f64;
    share >= ratio
}

// =============================================================================
// Specifiers
// =============================================================================

/// Where an import specifier points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Bare package name or scheme-prefixed URL, resolved outside the project.
    External,
    /// Relative or absolute path inside the project.
    Local,
}

pub fn specifier_kind(specifier: &str) -> SpecifierKind {
    if has_scheme(specifier) || !is_path_specifier(specifier) {
        SpecifierKind::External
    } else {
        SpecifierKind::Local
    }
}

// =============================================================================
// Name-based Resolution
// =============================================================================

/// Collect every string literal passed as first argument to `resolve_call`.
///
/// Scans the whole module text, so calls inside render functions are found
/// as well as top-level ones. Compiled templates alias the call with leading
/// underscores (`_resolveComponent`), which is accepted too.
pub fn resolved_names(source: &str, resolve_call: &str) -> FxHashSet<String> {
    let pattern = format!(
        r#"(?-u:\b)_*{}[ \t\r\n]*\([ \t\r\n]*(?:"([^"\\]*)"|'([^'\\]*)'|`([^`\\$]*)`)"#,
        regex::escape(resolve_call)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return FxHashSet::default();
    };

    re.captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
