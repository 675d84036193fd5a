//! Change notifications and reload events.

use serde::{Deserialize, Serialize};

/// Payload delivered by the file-watch transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub component: String,
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    pub extension: String,
    #[serde(rename = "type")]
    pub change_type: String,
    pub timestamp: u64,
}

impl ChangeNotification {
    /// Route by extension: component-kind files go to the tree reconciler,
    /// everything else takes the plain-module path.
    pub fn into_event(self, component_extensions: &[String]) -> ReloadEvent {
        let extension = self.extension.trim_start_matches('.');
        let kind = if component_extensions.iter().any(|e| e == extension) {
            ReloadKind::Component
        } else {
            ReloadKind::Plain
        };

        ReloadEvent {
            component_identifier: self.component,
            relative_path: self.relative_path,
            kind,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    Component,
    Plain,
}

/// One change, consumed exactly once by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub component_identifier: String,
    pub relative_path: String,
    pub kind: ReloadKind,
    pub timestamp: u64,
}

impl ReloadEvent {
    pub fn component(identifier: impl Into<String>, relative_path: impl Into<String>, timestamp: u64) -> Self {
        Self {
            component_identifier: identifier.into(),
            relative_path: relative_path.into(),
            kind: ReloadKind::Component,
            timestamp,
        }
    }

    pub fn plain(relative_path: impl Into<String>, timestamp: u64) -> Self {
        let relative_path = relative_path.into();
        Self {
            component_identifier: relative_path.clone(),
            relative_path,
            kind: ReloadKind::Plain,
            timestamp,
        }
    }
}
