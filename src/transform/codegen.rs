//! Code Generation
//!
//! Turns a [`TransformPlan`] into module text. One generator per
//! [`Strategy`]; which one runs is decided entirely by `strategy::select`.
//!
//! Passthrough imports are never reordered relative to each other, and a
//! group's bindings are emitted where the group first appeared.

use super::module::{BindingKind, ImportBinding};
use super::plan::{ImportGroup, TransformPlan};
use super::strategy::Strategy;
use crate::config::TransformConfig;
use crate::reload::url::placeholder_token;

/// Prefix of identifiers introduced by generated code.
const GENERATED_PREFIX: &str = "__relive_m";

/// Options that shape generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Query parameter carrying per-dependency placeholder tokens.
    pub placeholder_param: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self::from(&TransformConfig::default())
    }
}

impl From<&TransformConfig> for CodegenOptions {
    fn from(config: &TransformConfig) -> Self {
        Self {
            placeholder_param: config.placeholder_param.clone(),
        }
    }
}

/// Generate module text for `plan` using `strategy`.
pub fn generate(plan: &TransformPlan, strategy: Strategy, options: &CodegenOptions) -> String {
    match strategy {
        Strategy::ComponentStatic => plan.source.clone(),
        Strategy::ComponentPatchable => component_patchable(plan, options),
        Strategy::ModulePatchable | Strategy::ModuleFallback => reconstruct(plan),
        Strategy::ModuleStaticWrapped => static_wrapped(plan),
    }
}

// =============================================================================
// Component Modules
// =============================================================================

/// Rewrite rebindable imports in place to carry a placeholder query.
///
/// Everything outside import declarations is copied verbatim, so the
/// component's own export still resolves synchronously.
fn component_patchable(plan: &TransformPlan, options: &CodegenOptions) -> String {
    let source = plan.source.as_str();
    let mut out = String::with_capacity(source.len() + 64 * plan.rebindable_groups.len());
    let mut cursor = 0;

    for edit in &plan.import_edits {
        out.push_str(&source[cursor..edit.range.start]);
        cursor = edit.range.end;

        let mut parts = Vec::with_capacity(2);
        if let Some(index) = edit.passthrough {
            parts.push(plan.passthrough_import_text[index].clone());
        }
        if let Some(index) = edit.group_head {
            let group = &plan.rebindable_groups[index];
            let url = placeholder_url(&group.source_path, &options.placeholder_param);
            let bindings: Vec<_> = group.bindings.iter().collect();
            parts.push(render_import(&url, &bindings));
        }
        out.push_str(&parts.join("\n"));
    }

    out.push_str(&source[cursor..]);
    out
}

/// `path?param=__relive_<fingerprint>__`, appending to an existing query.
pub fn placeholder_url(source_path: &str, param: &str) -> String {
    let separator = if source_path.contains('?') { '&' } else { '?' };
    format!(
        "{source_path}{separator}{param}={}",
        placeholder_token(source_path)
    )
}

// =============================================================================
// Non-component Modules
// =============================================================================

/// passthrough imports, forward declarations, initializers, body, exports.
///
/// Only statement spans survive: comments between top-level statements are
/// dropped. Exports move after the body, so a body statement that reads an
/// exported `const`/`let` before its new position hits the temporal dead
/// zone (`export const x = 1; use(x);`).
fn reconstruct(plan: &TransformPlan) -> String {
    let mut sections: Vec<String> = plan.passthrough_import_text.clone();

    if plan.has_rebindable_groups() {
        let names: Vec<_> = plan.rebindable_names().collect();
        sections.push(format!("let {};", names.join(", ")));
        sections.extend(
            plan.rebindable_groups
                .iter()
                .enumerate()
                .map(|(index, group)| initializer(index, group)),
        );
    }

    if !plan.body_text.is_empty() {
        sections.push(plan.body_text.clone());
    }
    sections.extend(plan.export_text.iter().cloned());

    let mut out = sections.join("\n");
    out.push('\n');
    out
}

/// One dynamic load per group, assigning its bindings in group order.
fn initializer(index: usize, group: &ImportGroup) -> String {
    let module = format!("{GENERATED_PREFIX}{index}");
    let mut lines = vec![format!(
        "const {module} = await import({});",
        quote(&group.source_path)
    )];

    let named: Vec<_> = group
        .bindings
        .iter()
        .filter(|b| b.kind == BindingKind::Named)
        .collect();
    let mut destructured = false;

    for binding in &group.bindings {
        match binding.kind {
            BindingKind::Default => lines.push(format!("{} = {module}.default;", binding.local_name)),
            BindingKind::Namespace => lines.push(format!("{} = {module};", binding.local_name)),
            BindingKind::Named if !destructured => {
                destructured = true;
                let fields: Vec<_> = named.iter().map(|b| destructure_field(b)).collect();
                lines.push(format!("({{ {} }} = {module});", fields.join(", ")));
            }
            BindingKind::Named => {}
        }
    }

    format!("{{\n  {}\n}}", lines.join("\n  "))
}

fn destructure_field(binding: &ImportBinding) -> String {
    let imported = binding.imported_name.as_deref().unwrap_or(&binding.local_name);
    if imported == binding.local_name {
        binding.local_name.clone()
    } else {
        format!("{}: {}", property_key(imported), binding.local_name)
    }
}

/// Keep imports static and run the body inside an async IIFE.
fn static_wrapped(plan: &TransformPlan) -> String {
    let mut out = String::new();
    for import in &plan.passthrough_import_text {
        out.push_str(import);
        out.push('\n');
    }
    out.push_str("(async () => {\n");
    if !plan.body_text.is_empty() {
        out.push_str(&plan.body_text);
        out.push('\n');
    }
    out.push_str("})();\n");
    out
}

// =============================================================================
// Import Rendering
// =============================================================================

/// Render import declarations binding `bindings` from `source`.
///
/// A declaration can hold one default plus either one namespace or a named
/// list, so extra defaults and namespaces get statements of their own.
pub(crate) fn render_import(source: &str, bindings: &[&ImportBinding]) -> String {
    let from = quote(source);
    let mut defaults = bindings.iter().filter(|b| b.kind == BindingKind::Default);
    let namespaces = bindings.iter().filter(|b| b.kind == BindingKind::Namespace);
    let named: Vec<_> = bindings
        .iter()
        .filter(|b| b.kind == BindingKind::Named)
        .map(|b| import_specifier(b))
        .collect();

    let mut statements = Vec::new();
    if !named.is_empty() {
        let head = match defaults.next() {
            Some(default) => format!("{}, ", default.local_name),
            None => String::new(),
        };
        statements.push(format!("import {head}{{ {} }} from {from};", named.join(", ")));
    }
    for default in defaults {
        statements.push(format!("import {} from {from};", default.local_name));
    }
    for namespace in namespaces {
        statements.push(format!("import * as {} from {from};", namespace.local_name));
    }
    statements.join("\n")
}

fn import_specifier(binding: &ImportBinding) -> String {
    let imported = binding.imported_name.as_deref().unwrap_or(&binding.local_name);
    if imported == binding.local_name {
        binding.local_name.clone()
    } else {
        format!("{} as {}", property_key(imported), binding.local_name)
    }
}

/// Identifier names print bare, anything else as a string literal.
fn property_key(name: &str) -> String {
    if is_identifier(name) { name.to_string() } else { quote(name) }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '_' | '$'))
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'))
}

fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

// =============================================================================
// Tests
// =============================================================================
