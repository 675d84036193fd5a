//! Reconciliation of one reload event against the live component tree.
//!
//! ```text
//! snapshot ─► locate parents ─► escalate? ──yes──► Escalate(reason)
//!                                   │
//!                                   no
//!                                   ▼
//!                for each parent, in order (awaited one at a time):
//!                  Transition / Suspense ─► force render
//!                  otherwise ─► load ?t= ─► rebind if registered ─► force render
//!                                                                   │
//!                                     thin parent ─► force render its parents
//!                                   │
//!                                   ▼
//!                        refresh snapshot ─► Patched(report)
//! ```
//!
//! Plain modules sit outside the tree: they are re-imported with `?t=` and
//! always escalate.
//!
//! Failures are per parent: logged, recorded in the report, never retried.
//! A parent that renders the component from two places is patched once per
//! distinct instance; multiple distinct parents are each patched in order.

use std::fmt;

use super::event::{ReloadEvent, ReloadKind};
use super::host::{ComponentHost, HostError};
use super::tree::{ComponentTreeNode, ParentMatch, locate_instance_parents, locate_parents, snapshot};
use super::url::bust_url;
use crate::{debug, log};

// =============================================================================
// Context & Outcome
// =============================================================================

/// Per-event state: the root handle and the last snapshot taken from it.
#[derive(Debug, Clone)]
pub struct ReloadContext<I> {
    pub root: I,
    pub snapshot: Option<ComponentTreeNode<I>>,
}

impl<I> ReloadContext<I> {
    pub fn new(root: I) -> Self {
        Self { root, snapshot: None }
    }
}

/// Why an event could not be patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalateReason {
    /// The component is not rendered anywhere.
    NotFound,
    /// The component's only parent is the root instance.
    RootParent,
    /// A keep-alive wrapper guards the component.
    KeepAlive,
    /// A plain module changed. It has no patch target; the error is set
    /// when its re-import also failed.
    PlainModule(Option<String>),
}

impl fmt::Display for EscalateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("component not found in the rendered tree"),
            Self::RootParent => f.write_str("component is mounted directly under the root"),
            Self::KeepAlive => f.write_str("component is inside a keep-alive wrapper"),
            Self::PlainModule(None) => f.write_str("plain module has no patch target"),
            Self::PlainModule(Some(err)) => write!(f, "plain module reload failed: {err}"),
        }
    }
}

/// What happened to one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentPatch {
    pub name: String,
    /// The registry entry was reassigned.
    pub rebound: bool,
    /// The forced re-render succeeded.
    pub rendered: bool,
    /// Grandparents re-rendered through a thin parent.
    pub propagated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub component: String,
    pub parents: Vec<ParentPatch>,
}

impl PatchReport {
    /// Every parent was re-rendered.
    pub fn is_complete(&self) -> bool {
        self.parents.iter().all(|p| p.rendered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// No patch was applied; the caller should reload the page.
    Escalate(EscalateReason),
    Patched(PatchReport),
}

impl ReloadOutcome {
    pub fn is_escalation(&self) -> bool {
        matches!(self, Self::Escalate(_))
    }
}

// =============================================================================
// Reconciler
// =============================================================================

pub struct Reconciler<'h, H: ComponentHost> {
    host: &'h H,
}

impl<'h, H: ComponentHost> Reconciler<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Process one event to completion.
    pub async fn reconcile(
        &self,
        ctx: &mut ReloadContext<H::Instance>,
        event: &ReloadEvent,
    ) -> ReloadOutcome {
        let outcome = match event.kind {
            ReloadKind::Plain => self.reload_plain(event).await,
            ReloadKind::Component => self.reload_component(ctx, event).await,
        };

        if !outcome.is_escalation() {
            self.refresh(ctx);
        }
        outcome
    }

    async fn reload_component(
        &self,
        ctx: &ReloadContext<H::Instance>,
        event: &ReloadEvent,
    ) -> ReloadOutcome {
        let tree = snapshot(self.host, &ctx.root);
        let parents = locate_parents(&tree, &event.component_identifier);

        if let Some(reason) = escalation(&parents) {
            debug!("reload"; "{}: {}", event.component_identifier, reason);
            return ReloadOutcome::Escalate(reason);
        }

        let mut report = PatchReport {
            component: event.component_identifier.clone(),
            parents: Vec::with_capacity(parents.len()),
        };

        for parent in &parents {
            let patch = match self.patch_parent(&ctx.root, parent, event).await {
                Ok(patch) => patch,
                Err(err) => {
                    log!("reload"; "failed to patch {} in {}: {}", event.component_identifier, parent.name, err);
                    ParentPatch {
                        name: parent.name.clone(),
                        rebound: false,
                        rendered: false,
                        propagated: 0,
                    }
                }
            };
            report.parents.push(patch);
        }

        ReloadOutcome::Patched(report)
    }

    async fn patch_parent(
        &self,
        root: &H::Instance,
        parent: &ParentMatch<H::Instance>,
        event: &ReloadEvent,
    ) -> Result<ParentPatch, HostError> {
        let mut patch = ParentPatch {
            name: parent.name.clone(),
            rebound: false,
            rendered: false,
            propagated: 0,
        };

        if parent.wrapper.renders_only() {
            self.force_render(&parent.instance).await?;
            patch.rendered = true;
            return Ok(patch);
        }

        let url = bust_url(&event.relative_path, event.timestamp);
        let definition = self.host.load_module(&url).await?;

        let registry = self.host.registry_names(&parent.instance);
        let registered = registry
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == &event.component_identifier));
        if registered {
            self.host
                .rebind(&parent.instance, &event.component_identifier, definition)?;
            patch.rebound = true;
        }

        self.force_render(&parent.instance).await?;
        patch.rendered = true;

        if registry.is_none_or(|names| names.is_empty()) {
            patch.propagated = self.propagate(root, &parent.instance).await;
        }
        Ok(patch)
    }

    /// Re-render the parents of a thin parent so the change becomes visible
    /// through a layer that registers no components itself.
    async fn propagate(&self, root: &H::Instance, thin: &H::Instance) -> usize {
        let tree = snapshot(self.host, root);
        let mut rendered = 0;

        for grandparent in locate_instance_parents(&tree, thin) {
            match self.force_render(&grandparent.instance).await {
                Ok(()) => rendered += 1,
                Err(err) => {
                    log!("reload"; "failed to refresh {}: {}", grandparent.name, err);
                }
            }
        }
        rendered
    }

    /// Public re-render first, internal update when it is unavailable.
    async fn force_render(&self, instance: &H::Instance) -> Result<(), HostError> {
        match self.host.force_update(instance).await {
            Err(HostError::Unavailable(_)) => self.host.internal_update(instance).await,
            other => other,
        }
    }

    /// Plain modules have no patch target: re-import, then always escalate.
    async fn reload_plain(&self, event: &ReloadEvent) -> ReloadOutcome {
        let url = bust_url(&event.relative_path, event.timestamp);
        let error = match self.host.load_module(&url).await {
            Ok(_) => None,
            Err(err) => {
                log!("reload"; "failed to re-import {}: {}", url, err);
                Some(err.to_string())
            }
        };
        ReloadOutcome::Escalate(EscalateReason::PlainModule(error))
    }

    fn refresh(&self, ctx: &mut ReloadContext<H::Instance>) {
        if let Some(root) = self.host.root_instance() {
            ctx.root = root;
        }
        let tree = snapshot(self.host, &ctx.root);
        debug!("reload"; "snapshot refreshed: {} components", tree.count());
        ctx.snapshot = Some(tree);
    }
}

/// The structural cases that cannot be patched in place.
fn escalation<I>(parents: &[ParentMatch<I>]) -> Option<EscalateReason> {
    match parents {
        [] => Some(EscalateReason::NotFound),
        [only] if only.is_root => Some(EscalateReason::RootParent),
        _ if parents.iter().any(|p| p.keep_alive_guarded) => Some(EscalateReason::KeepAlive),
        _ => None,
    }
}
