//! Hot Reload
//!
//! Applies "this module changed" events to a live component tree owned by
//! the host UI framework.
//!
//! # Architecture
//!
//! ```text
//! ChangeNotification ─► HotReloader ─spawn─► Reconciler ─► ComponentHost
//!   (transport)          (dispatch)          (per event)     (adapter)
//! ```
//!
//! # Modules
//!
//! - `event` - Notification payload and routing
//! - `host` - Framework adapter trait and type descriptors
//! - `tree` - Component tree snapshots and parent lookup
//! - `reconcile` - Per-event patch/escalate state machine
//! - `dispatch` - One task per event, shared context
//! - `url` - Cache-busted URLs and placeholder substitution
//! - `message` - Outcome messages for the transport

pub mod dispatch;
pub mod event;
pub mod host;
pub mod message;
pub mod reconcile;
pub mod tree;
pub mod url;

#[cfg(test)]
mod tests;

pub use dispatch::HotReloader;
pub use event::{ChangeNotification, ReloadEvent, ReloadKind};
pub use host::{ComponentHost, HostError, TypeDescriptor, WrapperKind};
pub use message::HotReloadMessage;
pub use reconcile::{EscalateReason, PatchReport, Reconciler, ReloadContext, ReloadOutcome};
pub use tree::ComponentTreeNode;
