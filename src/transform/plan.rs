//! Transform Planning
//!
//! Decides, binding by binding, which imports stay static (passthrough) and
//! which become runtime-rebindable, then merges rebindable bindings into one
//! group per source path.

use std::ops::Range;

use rustc_hash::FxHashSet;

use super::TransformError;
use super::classify::{ModuleFlags, SpecifierKind, resolved_names, specifier_kind};
use super::codegen::render_import;
use super::module::{ImportBinding, ImportDecl, ModuleRecord, StatementKind};
use crate::config::ClassifyConfig;
use crate::utils::path::specifier_extension;

// =============================================================================
// Import Groups
// =============================================================================

/// All rebindable bindings of one source path, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportGroup {
    pub source_path: String,
    pub bindings: Vec<ImportBinding>,
}

impl ImportGroup {
    fn new(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            bindings: Vec::new(),
        }
    }

    /// Add a binding unless its local name is already bound by this group.
    fn push(&mut self, binding: ImportBinding) {
        if !self.binds(&binding.local_name) {
            self.bindings.push(binding);
        }
    }

    pub fn binds(&self, local_name: &str) -> bool {
        self.bindings.iter().any(|b| b.local_name == local_name)
    }

    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.local_name.as_str())
    }
}

// =============================================================================
// Transform Plan
// =============================================================================

/// What to do with one import declaration of the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportEdit {
    pub range: Range<usize>,
    /// Index into `passthrough_import_text` of the static part, if any.
    pub passthrough: Option<usize>,
    /// Index into `rebindable_groups` when this declaration is the first one
    /// seen for that group (the group is emitted here).
    pub group_head: Option<usize>,
}

/// The planner's output: a module split into static imports, rebindable
/// groups, body and exports.
///
/// Every binding introduced by a top-level import lands in exactly one of
/// `passthrough_import_text` or `rebindable_groups`.
#[derive(Debug, Clone)]
pub struct TransformPlan {
    pub flags: ModuleFlags,
    pub passthrough_import_text: Vec<String>,
    pub rebindable_groups: Vec<ImportGroup>,
    pub body_text: String,
    pub export_text: Vec<String>,
    pub(crate) source: String,
    pub(crate) import_edits: Vec<ImportEdit>,
}

impl TransformPlan {
    pub fn has_rebindable_groups(&self) -> bool {
        !self.rebindable_groups.is_empty()
    }

    pub fn has_exports(&self) -> bool {
        !self.export_text.is_empty()
    }

    /// Every rebindable local name, group by group.
    pub fn rebindable_names(&self) -> impl Iterator<Item = &str> {
        self.rebindable_groups.iter().flat_map(ImportGroup::local_names)
    }

    pub fn group(&self, source_path: &str) -> Option<&ImportGroup> {
        self.rebindable_groups
            .iter()
            .find(|g| g.source_path == source_path)
    }
}

/// Parse and plan a module in one step.
pub fn plan_module(
    path: &str,
    source: &str,
    config: &ClassifyConfig,
) -> Result<TransformPlan, TransformError> {
    let record = ModuleRecord::parse(path, source, config)?;
    Ok(plan(&record, config))
}

/// Build a transform plan for a parsed module.
pub fn plan(record: &ModuleRecord, config: &ClassifyConfig) -> TransformPlan {
    let policy = RebindPolicy::new(record, config);

    let mut passthrough_import_text = Vec::new();
    let mut rebindable_groups: Vec<ImportGroup> = Vec::new();
    let mut import_edits = Vec::new();
    let mut body = Vec::new();
    let mut export_text = Vec::new();

    for stmt in &record.statements {
        let text = stmt.text(&record.source);
        let decl = match &stmt.kind {
            StatementKind::Import(decl) => decl,
            StatementKind::Export => {
                export_text.push(text.to_string());
                continue;
            }
            StatementKind::Other => {
                body.push(text);
                continue;
            }
        };

        let (rebindable, fixed): (Vec<_>, Vec<_>) = decl
            .bindings
            .iter()
            .partition(|binding| policy.is_rebindable(decl, binding));

        let passthrough = if rebindable.is_empty() {
            // Fully static: keep the original text byte for byte.
            passthrough_import_text.push(text.to_string());
            Some(passthrough_import_text.len() - 1)
        } else if fixed.is_empty() {
            None
        } else {
            passthrough_import_text.push(render_import(&decl.source_path, &fixed));
            Some(passthrough_import_text.len() - 1)
        };

        let mut group_head = None;
        if !rebindable.is_empty() {
            let index = match rebindable_groups
                .iter()
                .position(|g| g.source_path == decl.source_path)
            {
                Some(index) => index,
                None => {
                    rebindable_groups.push(ImportGroup::new(&decl.source_path));
                    group_head = Some(rebindable_groups.len() - 1);
                    rebindable_groups.len() - 1
                }
            };
            for binding in rebindable {
                rebindable_groups[index].push(binding.clone());
            }
        }

        import_edits.push(ImportEdit {
            range: stmt.range.clone(),
            passthrough,
            group_head,
        });
    }

    TransformPlan {
        flags: record.flags,
        passthrough_import_text,
        rebindable_groups,
        body_text: body.join("\n"),
        export_text,
        source: record.source.clone(),
        import_edits,
    }
}

// =============================================================================
// Rebind Policy
// =============================================================================

/// Per-module facts needed to decide whether a binding is rebindable.
struct RebindPolicy<'a> {
    flags: ModuleFlags,
    has_exports: bool,
    resolved: FxHashSet<String>,
    config: &'a ClassifyConfig,
}

impl<'a> RebindPolicy<'a> {
    fn new(record: &ModuleRecord, config: &'a ClassifyConfig) -> Self {
        Self {
            flags: record.flags,
            has_exports: record.has_exports(),
            resolved: resolved_names(&record.source, &config.resolve_call),
            config,
        }
    }

    fn is_rebindable(&self, decl: &ImportDecl, binding: &ImportBinding) -> bool {
        if specifier_kind(&binding.source_path) == SpecifierKind::External
            || decl.has_attributes
            || self.flags.forces_static_imports()
        {
            return false;
        }

        // The framework resolves these by name at render time.
        if self.resolved.contains(&binding.local_name) {
            return false;
        }

        if self.flags.is_component_file {
            // Only the component's auxiliary modules, never other components.
            return !specifier_extension(&binding.source_path)
                .is_some_and(|ext| self.config.is_component_extension(ext));
        }

        // A module without exports is re-run whole on reload.
        self.has_exports
    }
}

// =============================================================================
// Tests
// =============================================================================
