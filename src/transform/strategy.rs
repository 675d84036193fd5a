//! Output strategy selection.
//!
//! The full decision lives in [`select`]; generators never re-derive it.

use std::fmt;

use serde::Serialize;

use super::plan::TransformPlan;

/// Closed set of output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Component with rebindable groups: rewrite group imports in place.
    ComponentPatchable,
    /// Component without rebindable groups: unchanged.
    ComponentStatic,
    /// Non-component with rebindable groups: forward `let`s plus dynamic loads.
    ModulePatchable,
    /// No groups, no exports, not an entry point: async IIFE around the body.
    ModuleStaticWrapped,
    /// Anything else: reconstructed in canonical order.
    ModuleFallback,
}

/// The inputs of strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleShape {
    pub is_component: bool,
    pub has_rebindable_groups: bool,
    pub has_exports: bool,
    pub is_entry_point: bool,
}

impl ModuleShape {
    pub fn of(plan: &TransformPlan) -> Self {
        Self {
            is_component: plan.flags.is_component_file,
            has_rebindable_groups: plan.has_rebindable_groups(),
            has_exports: plan.has_exports(),
            is_entry_point: plan.flags.is_entry_point_file,
        }
    }
}

/// Pick the output strategy for a module shape.
pub const fn select(shape: ModuleShape) -> Strategy {
    match (
        shape.is_component,
        shape.has_rebindable_groups,
        shape.has_exports,
        shape.is_entry_point,
    ) {
        (true, true, _, _) => Strategy::ComponentPatchable,
        (true, false, _, _) => Strategy::ComponentStatic,
        (false, true, _, _) => Strategy::ModulePatchable,
        (false, false, false, false) => Strategy::ModuleStaticWrapped,
        _ => Strategy::ModuleFallback,
    }
}

impl Strategy {
    pub fn for_plan(plan: &TransformPlan) -> Self {
        select(ModuleShape::of(plan))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComponentPatchable => "component-patchable",
            Self::ComponentStatic => "component-static",
            Self::ModulePatchable => "module-patchable",
            Self::ModuleStaticWrapped => "module-static-wrapped",
            Self::ModuleFallback => "module-fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
