//! Hot Reload Message Protocol
//!
//! JSON messages reported to the transport after each reload event.
//!
//! # Message Types
//!
//! - `reload`: the event could not be patched, perform a full page reload
//! - `patched`: the component was patched in place
//! - `error`: a module failed to transform (display overlay, no reload)

use serde::{Deserialize, Serialize};

use super::reconcile::ReloadOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// In-place patch applied
    Patched {
        /// Identifier of the changed component (or module path)
        component: String,
        /// Names of the parents that were re-rendered
        parents: Vec<String>,
    },

    /// Transformation error
    Error {
        /// Source file path
        path: String,
        /// Error message
        error: String,
    },
}

impl HotReloadMessage {
    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            path: path.into(),
            error: error.into(),
        }
    }

    pub fn from_outcome(outcome: &ReloadOutcome) -> Self {
        match outcome {
            ReloadOutcome::Escalate(reason) => Self::reload_with_reason(reason.to_string()),
            ReloadOutcome::Patched(report) => Self::Patched {
                component: report.component.clone(),
                parents: report
                    .parents
                    .iter()
                    .filter(|p| p.rendered)
                    .map(|p| p.name.clone())
                    .collect(),
            },
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::reconcile::{EscalateReason, ParentPatch, PatchReport};

    #[test]
    fn test_reload_serialization() {
        let json = HotReloadMessage::from_outcome(&ReloadOutcome::Escalate(EscalateReason::RootParent))
            .to_json();
        assert!(json.contains(r#""type":"reload""#));
        assert!(json.contains("root"));
    }

    #[test]
    fn test_patched_lists_rendered_parents_only() {
        let report = PatchReport {
            component: "Card".into(),
            parents: vec![
                ParentPatch {
                    name: "Page".into(),
                    rebound: true,
                    rendered: true,
                    propagated: 0,
                },
                ParentPatch {
                    name: "Stale".into(),
                    rebound: false,
                    rendered: false,
                    propagated: 0,
                },
            ],
        };
        let msg = HotReloadMessage::from_outcome(&ReloadOutcome::Patched(report));
        assert_eq!(
            msg,
            HotReloadMessage::Patched {
                component: "Card".into(),
                parents: vec!["Page".into()],
            }
        );
    }

    #[test]
    fn test_round_trip_error() {
        let msg = HotReloadMessage::error("src/a.js", "parse failed");
        assert_eq!(HotReloadMessage::from_json(&msg.to_json()), Some(msg));
        assert!(HotReloadMessage::from_json("not json").is_none());
    }
}
