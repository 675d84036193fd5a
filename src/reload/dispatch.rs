//! Event dispatch.
//!
//! ```text
//! transport --[ChangeNotification]--> HotReloader --spawn--> Reconciler
//!                                                                 |
//!    transport <-----------[HotReloadMessage]---------------------+
//! ```
//!
//! Every event runs as its own task: no queue, no coalescing. The shared
//! context is only locked to copy the root out and to store the refreshed
//! snapshot back, never across an await.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::event::{ChangeNotification, ReloadEvent};
use super::host::ComponentHost;
use super::message::HotReloadMessage;
use super::reconcile::{ReloadContext, ReloadOutcome, Reconciler};
use super::tree::ComponentTreeNode;
use crate::debug;
use crate::logger::{status_error, status_success, status_warning};
use crate::transform::TransformResult;

pub struct HotReloader<H: ComponentHost> {
    host: Arc<H>,
    context: Arc<Mutex<ReloadContext<H::Instance>>>,
    component_extensions: Vec<String>,
    tx: mpsc::UnboundedSender<HotReloadMessage>,
}

impl<H: ComponentHost> HotReloader<H> {
    /// Create a reloader over `host`, mounted at `root`.
    ///
    /// Returns the receiving end of the outcome channel for the transport.
    pub fn new(
        host: Arc<H>,
        root: H::Instance,
        component_extensions: Vec<String>,
    ) -> (Self, mpsc::UnboundedReceiver<HotReloadMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reloader = Self {
            host,
            context: Arc::new(Mutex::new(ReloadContext::new(root))),
            component_extensions,
            tx,
        };
        (reloader, rx)
    }

    /// Route a notification and process it on its own task.
    pub fn notify(&self, notification: ChangeNotification) -> JoinHandle<ReloadOutcome> {
        self.dispatch(notification.into_event(&self.component_extensions))
    }

    pub fn dispatch(&self, event: ReloadEvent) -> JoinHandle<ReloadOutcome> {
        let host = Arc::clone(&self.host);
        let context = Arc::clone(&self.context);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let root = context.lock().root.clone();
            let mut ctx = ReloadContext::new(root);

            let outcome = Reconciler::new(&*host).reconcile(&mut ctx, &event).await;

            if let Some(snapshot) = ctx.snapshot {
                let mut shared = context.lock();
                shared.root = ctx.root;
                shared.snapshot = Some(snapshot);
            }

            report(&event, &outcome);
            if tx.send(HotReloadMessage::from_outcome(&outcome)).is_err() {
                debug!("reload"; "transport closed, dropping outcome for {}", event.relative_path);
            }
            outcome
        })
    }

    /// Forward a failed transform to the transport as an error overlay.
    ///
    /// Returns whether a message was sent. Successful results send nothing.
    pub fn report_transform(&self, path: &str, result: &TransformResult) -> bool {
        let Some(error) = result.error.as_deref() else {
            return false;
        };
        status_error(&format!("failed to transform {path}"), error);
        self.tx.send(HotReloadMessage::error(path, error)).is_ok()
    }

    /// The snapshot left by the most recent patched event.
    pub fn last_snapshot(&self) -> Option<ComponentTreeNode<H::Instance>> {
        self.context.lock().snapshot.clone()
    }
}

fn report(event: &ReloadEvent, outcome: &ReloadOutcome) {
    match outcome {
        ReloadOutcome::Escalate(reason) => {
            status_warning(&format!("{}: full reload ({})", event.relative_path, reason));
        }
        ReloadOutcome::Patched(report) if report.is_complete() => {
            status_success(&format!("patched {}", event.component_identifier));
        }
        ReloadOutcome::Patched(report) => {
            let stale: Vec<_> = report
                .parents
                .iter()
                .filter(|p| !p.rendered)
                .map(|p| p.name.as_str())
                .collect();
            status_error(
                &format!("partially patched {}", event.component_identifier),
                &format!("stale until next change: {}", stale.join(", ")),
            );
        }
    }
}
