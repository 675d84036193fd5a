//! The framework adapter seam.
//!
//! The live component tree belongs to the UI framework. The reconciler only
//! walks it through [`ComponentHost`] and touches it at two points: a
//! registry rebind and a forced re-render.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use thiserror::Error;

/// Structural role of a component, classified once by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WrapperKind {
    #[default]
    None,
    Transition,
    KeepAlive,
    Suspense,
}

impl WrapperKind {
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Transition => Some("Transition"),
            Self::KeepAlive => Some("KeepAlive"),
            Self::Suspense => Some("Suspense"),
        }
    }

    /// Wrappers that are refreshed by re-rendering them alone.
    pub const fn renders_only(self) -> bool {
        matches!(self, Self::Transition | Self::Suspense)
    }
}

/// What the adapter can tell about an instance's component type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub declared_name: Option<String>,
    pub alias: Option<String>,
    pub inferred_name: Option<String>,
    pub wrapper: WrapperKind,
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            declared_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn wrapper(kind: WrapperKind) -> Self {
        Self {
            wrapper: kind,
            ..Self::default()
        }
    }

    /// Declared name, then alias, then inferred name, then wrapper name.
    pub fn display_name(&self) -> &str {
        [&self.declared_name, &self.alias, &self.inferred_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
            .or(self.wrapper.name())
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("module load rejected for `{url}`: {reason}")]
    LoadRejected { url: String, reason: String },

    #[error("{0} entry point unavailable")]
    Unavailable(&'static str),

    #[error("render failed: {0}")]
    RenderFailed(String),

    #[error("registry rebind failed: {0}")]
    RebindFailed(String),
}

/// Introspection and mutation surface of the host UI framework.
pub trait ComponentHost: Send + Sync + 'static {
    /// Handle to a live component instance. Cloning must not extend the
    /// instance's lifetime beyond what the framework allows.
    type Instance: Clone + PartialEq + Send + Sync + fmt::Debug + 'static;
    /// Node of an instance's rendered-output graph.
    type Node;
    /// A loaded component definition (a module's default export).
    type Definition: Send + 'static;

    fn root_instance(&self) -> Option<Self::Instance>;

    /// Top-level nodes of the instance's current rendered output.
    fn rendered_nodes(&self, instance: &Self::Instance) -> Vec<Self::Node>;

    fn nested_instance(&self, node: &Self::Node) -> Option<Self::Instance>;

    /// Listed and dynamic children of a node without a nested instance.
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn describe(&self, instance: &Self::Instance) -> TypeDescriptor;

    /// Names in the instance's local component registry, `None` when it
    /// has no registry.
    fn registry_names(&self, instance: &Self::Instance) -> Option<Vec<String>>;

    /// Reassign a registry entry.
    fn rebind(
        &self,
        instance: &Self::Instance,
        name: &str,
        definition: Self::Definition,
    ) -> Result<(), HostError>;

    /// Public re-render entry point.
    fn force_update(
        &self,
        instance: &Self::Instance,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Internal update entry point, used when the public one is unavailable.
    fn internal_update(
        &self,
        instance: &Self::Instance,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Dynamically import `url` and return its default export.
    fn load_module(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Definition, HostError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_priority() {
        let full = TypeDescriptor {
            declared_name: Some("Declared".into()),
            alias: Some("Alias".into()),
            inferred_name: Some("Inferred".into()),
            wrapper: WrapperKind::None,
        };
        assert_eq!(full.display_name(), "Declared");

        let alias = TypeDescriptor {
            declared_name: None,
            ..full.clone()
        };
        assert_eq!(alias.display_name(), "Alias");

        let inferred = TypeDescriptor {
            alias: None,
            ..alias
        };
        assert_eq!(inferred.display_name(), "Inferred");

        assert_eq!(TypeDescriptor::wrapper(WrapperKind::KeepAlive).display_name(), "KeepAlive");
        assert_eq!(TypeDescriptor::default().display_name(), "Anonymous");
    }

    #[test]
    fn test_renders_only() {
        assert!(WrapperKind::Transition.renders_only());
        assert!(WrapperKind::Suspense.renders_only());
        assert!(!WrapperKind::KeepAlive.renders_only());
        assert!(!WrapperKind::None.renders_only());
    }
}
