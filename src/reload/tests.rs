//! Reconciler scenarios over an in-memory component tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::event::ReloadEvent;
use super::host::{ComponentHost, HostError, TypeDescriptor, WrapperKind};
use super::reconcile::{EscalateReason, ReloadContext, ReloadOutcome, Reconciler};
use super::tree::{MAX_DEPTH, snapshot};
use super::{ChangeNotification, HotReloadMessage, HotReloader};
use crate::transform::TransformResult;

// =============================================================================
// Fake Host
// =============================================================================

struct InstanceData {
    descriptor: TypeDescriptor,
    children: Mutex<Vec<FakeNode>>,
    registry: Mutex<Option<FxHashMap<String, String>>>,
    public_render: bool,
    renders: AtomicUsize,
    internal_renders: AtomicUsize,
}

#[derive(Clone)]
struct Instance(Arc<InstanceData>);

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.0.descriptor.display_name())
    }
}

impl Instance {
    fn new(descriptor: TypeDescriptor, children: Vec<FakeNode>) -> Self {
        Self(Arc::new(InstanceData {
            descriptor,
            children: Mutex::new(children),
            registry: Mutex::new(None),
            public_render: true,
            renders: AtomicUsize::new(0),
            internal_renders: AtomicUsize::new(0),
        }))
    }

    fn named(name: &str, children: Vec<FakeNode>) -> Self {
        Self::new(TypeDescriptor::named(name), children)
    }

    fn wrapper(kind: WrapperKind, children: Vec<FakeNode>) -> Self {
        Self::new(TypeDescriptor::wrapper(kind), children)
    }

    fn with_registry(self, entries: &[(&str, &str)]) -> Self {
        *self.0.registry.lock() = Some(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    fn without_public_render(self) -> Self {
        let data = Arc::try_unwrap(self.0).ok().unwrap();
        Self(Arc::new(InstanceData {
            public_render: false,
            ..data
        }))
    }

    fn node(&self) -> FakeNode {
        FakeNode::Component(self.clone())
    }

    fn renders(&self) -> usize {
        self.0.renders.load(Ordering::SeqCst)
    }

    fn registry_entry(&self, name: &str) -> Option<String> {
        self.0.registry.lock().as_ref()?.get(name).cloned()
    }
}

#[derive(Clone)]
enum FakeNode {
    Component(Instance),
    Element(Vec<FakeNode>),
}

struct FakeHost {
    root: Instance,
    loads: Mutex<Vec<String>>,
    reject_loads: bool,
}

impl FakeHost {
    fn new(root: Instance) -> Self {
        Self {
            root,
            loads: Mutex::new(Vec::new()),
            reject_loads: false,
        }
    }

    fn rejecting(root: Instance) -> Self {
        Self {
            reject_loads: true,
            ..Self::new(root)
        }
    }

    fn loads(&self) -> Vec<String> {
        self.loads.lock().clone()
    }
}

impl ComponentHost for FakeHost {
    type Instance = Instance;
    type Node = FakeNode;
    type Definition = String;

    fn root_instance(&self) -> Option<Instance> {
        Some(self.root.clone())
    }

    fn rendered_nodes(&self, instance: &Instance) -> Vec<FakeNode> {
        instance.0.children.lock().clone()
    }

    fn nested_instance(&self, node: &FakeNode) -> Option<Instance> {
        match node {
            FakeNode::Component(instance) => Some(instance.clone()),
            FakeNode::Element(_) => None,
        }
    }

    fn child_nodes(&self, node: &FakeNode) -> Vec<FakeNode> {
        match node {
            FakeNode::Component(_) => Vec::new(),
            FakeNode::Element(children) => children.clone(),
        }
    }

    fn describe(&self, instance: &Instance) -> TypeDescriptor {
        instance.0.descriptor.clone()
    }

    fn registry_names(&self, instance: &Instance) -> Option<Vec<String>> {
        let registry = instance.0.registry.lock();
        registry.as_ref().map(|r| r.keys().cloned().collect())
    }

    fn rebind(&self, instance: &Instance, name: &str, definition: String) -> Result<(), HostError> {
        let mut registry = instance.0.registry.lock();
        let entries = registry
            .as_mut()
            .ok_or_else(|| HostError::RebindFailed("no registry".into()))?;
        entries.insert(name.to_string(), definition);
        Ok(())
    }

    async fn force_update(&self, instance: &Instance) -> Result<(), HostError> {
        if !instance.0.public_render {
            return Err(HostError::Unavailable("$forceUpdate"));
        }
        instance.0.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn internal_update(&self, instance: &Instance) -> Result<(), HostError> {
        instance.0.internal_renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_module(&self, url: &str) -> Result<String, HostError> {
        self.loads.lock().push(url.to_string());
        if self.reject_loads {
            return Err(HostError::LoadRejected {
                url: url.to_string(),
                reason: "network error".into(),
            });
        }
        Ok(url.to_string())
    }
}

async fn run(host: &FakeHost, event: ReloadEvent) -> (ReloadOutcome, ReloadContext<Instance>) {
    let mut ctx = ReloadContext::new(host.root.clone());
    let outcome = Reconciler::new(host).reconcile(&mut ctx, &event).await;
    (outcome, ctx)
}

fn card_event() -> ReloadEvent {
    ReloadEvent::component("Card", "/src/Card.vue", 100)
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_card_in_page_is_rebound_and_rendered_once() {
    let card = Instance::named("Card", vec![]);
    let page = Instance::named("Page", vec![FakeNode::Element(vec![card.node()])])
        .with_registry(&[("Card", "OldDef")]);
    let app = Instance::named("App", vec![page.node()]);
    let host = FakeHost::new(app.clone());

    let (outcome, ctx) = run(&host, card_event()).await;

    let ReloadOutcome::Patched(report) = outcome else {
        panic!("expected a patch, got {outcome:?}");
    };
    assert!(report.is_complete());
    assert!(report.parents[0].rebound);
    assert_eq!(page.registry_entry("Card").as_deref(), Some("/src/Card.vue?t=100"));
    assert_eq!(page.renders(), 1);
    assert_eq!(app.renders(), 0);
    assert_eq!(host.loads(), ["/src/Card.vue?t=100"]);

    // snapshot refreshed after the pass
    assert_eq!(ctx.snapshot.map(|s| s.count()), Some(3));
}

#[tokio::test]
async fn test_root_parent_escalates_without_rendering() {
    let card = Instance::named("Card", vec![]);
    let app = Instance::named("App", vec![card.node()]).with_registry(&[("Card", "OldDef")]);
    let host = FakeHost::new(app.clone());

    let (outcome, ctx) = run(&host, card_event()).await;

    assert_eq!(outcome, ReloadOutcome::Escalate(EscalateReason::RootParent));
    assert_eq!(app.renders(), 0);
    assert_eq!(card.renders(), 0);
    assert!(host.loads().is_empty());
    assert!(ctx.snapshot.is_none());
}

#[tokio::test]
async fn test_keep_alive_guard_wins_over_other_parents() {
    let guarded = Instance::named("Card", vec![]);
    let free = Instance::named("Card", vec![]);
    let page = Instance::named("Page", vec![guarded.node()]).with_registry(&[("Card", "Old")]);
    let keep_alive = Instance::wrapper(WrapperKind::KeepAlive, vec![page.node()]);
    let side = Instance::named("Side", vec![free.node()]).with_registry(&[("Card", "Old")]);
    let app = Instance::named("App", vec![keep_alive.node(), side.node()]);
    let host = FakeHost::new(app);

    let (outcome, _) = run(&host, card_event()).await;

    assert_eq!(outcome, ReloadOutcome::Escalate(EscalateReason::KeepAlive));
    assert_eq!(page.renders(), 0);
    assert_eq!(side.renders(), 0);
    assert_eq!(side.registry_entry("Card").as_deref(), Some("Old"));
}

#[tokio::test]
async fn test_unknown_component_escalates() {
    let host = FakeHost::new(Instance::named("App", vec![]));
    let (outcome, _) = run(&host, card_event()).await;
    assert_eq!(outcome, ReloadOutcome::Escalate(EscalateReason::NotFound));
}

#[tokio::test]
async fn test_transition_parent_is_only_rerendered() {
    let card = Instance::named("Card", vec![]);
    let transition = Instance::wrapper(WrapperKind::Transition, vec![card.node()]);
    let page = Instance::named("Page", vec![transition.node()]);
    let host = FakeHost::new(Instance::named("App", vec![page.node()]));

    let (outcome, _) = run(&host, card_event()).await;

    assert!(!outcome.is_escalation());
    assert_eq!(transition.renders(), 1);
    assert_eq!(page.renders(), 0);
    assert!(host.loads().is_empty());
}

#[tokio::test]
async fn test_thin_parent_propagates_one_level() {
    let card = Instance::named("Card", vec![]);
    let wrapper = Instance::named("Wrapper", vec![card.node()]);
    let layout = Instance::named("Layout", vec![wrapper.node()]).with_registry(&[("Wrapper", "W")]);
    let app = Instance::named("App", vec![layout.node()]);
    let host = FakeHost::new(app.clone());

    let (outcome, _) = run(&host, card_event()).await;

    let ReloadOutcome::Patched(report) = outcome else {
        panic!("expected a patch");
    };
    assert!(!report.parents[0].rebound);
    assert_eq!(report.parents[0].propagated, 1);
    assert_eq!(wrapper.renders(), 1);
    assert_eq!(layout.renders(), 1);
    assert_eq!(app.renders(), 0);
}

#[tokio::test]
async fn test_internal_update_fallback() {
    let card = Instance::named("Card", vec![]);
    let page = Instance::named("Page", vec![card.node()])
        .without_public_render()
        .with_registry(&[("Card", "Old")]);
    let host = FakeHost::new(Instance::named("App", vec![page.node()]));

    let (outcome, _) = run(&host, card_event()).await;

    assert!(!outcome.is_escalation());
    assert_eq!(page.renders(), 0);
    assert_eq!(page.0.internal_renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_load_failure_is_contained_per_parent() {
    let card = Instance::named("Card", vec![]);
    let page = Instance::named("Page", vec![card.node()]).with_registry(&[("Card", "Old")]);
    let host = FakeHost::rejecting(Instance::named("App", vec![page.node()]));

    let (outcome, ctx) = run(&host, card_event()).await;

    let ReloadOutcome::Patched(report) = outcome else {
        panic!("load failures must not escalate");
    };
    assert!(!report.is_complete());
    assert_eq!(page.renders(), 0);
    assert_eq!(page.registry_entry("Card").as_deref(), Some("Old"));
    assert!(ctx.snapshot.is_some());
}

#[tokio::test]
async fn test_plain_module_reimports_then_escalates() {
    let host = FakeHost::new(Instance::named("App", vec![]));
    let (outcome, ctx) = run(&host, ReloadEvent::plain("/src/utils.js", 7)).await;

    assert_eq!(outcome, ReloadOutcome::Escalate(EscalateReason::PlainModule(None)));
    assert_eq!(host.loads(), ["/src/utils.js?t=7"]);
    assert!(ctx.snapshot.is_none());

    let message = HotReloadMessage::from_outcome(&outcome);
    assert!(matches!(message, HotReloadMessage::Reload { .. }));
}

#[tokio::test]
async fn test_plain_module_failure_escalates() {
    let host = FakeHost::rejecting(Instance::named("App", vec![]));
    let (outcome, _) = run(&host, ReloadEvent::plain("/src/utils.js", 7)).await;
    assert!(matches!(outcome, ReloadOutcome::Escalate(EscalateReason::PlainModule(Some(_)))));
}

#[test]
fn test_snapshot_names_and_depth_guard() {
    let anonymous = Instance::new(
        TypeDescriptor {
            inferred_name: Some("setup".into()),
            ..TypeDescriptor::default()
        },
        vec![],
    );
    let looping = Instance::named("Loop", vec![]);
    looping.0.children.lock().push(looping.node());
    let app = Instance::named("App", vec![anonymous.node(), looping.node()]);
    let host = FakeHost::new(app.clone());

    let tree = snapshot(&host, &app);
    assert_eq!(tree.children[0].name, "setup");
    assert!(tree.count() <= MAX_DEPTH + 2);

    // break the cycle so the Arcs can be freed
    looping.0.children.lock().clear();
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_dispatch_reports_outcomes() {
    let card = Instance::named("Card", vec![]);
    let page = Instance::named("Page", vec![card.node()]).with_registry(&[("Card", "Old")]);
    let host = Arc::new(FakeHost::new(Instance::named("App", vec![page.node()])));
    let root = host.root.clone();

    let (reloader, mut rx) = HotReloader::new(Arc::clone(&host), root, vec!["vue".into()]);

    let notification = ChangeNotification {
        component: "Card".into(),
        relative_path: "/src/Card.vue".into(),
        extension: ".vue".into(),
        change_type: "change".into(),
        timestamp: 5,
    };
    let outcome = reloader.notify(notification).await.unwrap();
    assert!(!outcome.is_escalation());
    assert_eq!(
        rx.recv().await,
        Some(HotReloadMessage::Patched {
            component: "Card".into(),
            parents: vec!["Page".into()],
        })
    );
    assert!(reloader.last_snapshot().is_some());
}

#[tokio::test]
async fn test_dispatch_runs_events_independently() {
    let card = Instance::named("Card", vec![]);
    let page = Instance::named("Page", vec![card.node()]).with_registry(&[("Card", "Old")]);
    let host = Arc::new(FakeHost::new(Instance::named("App", vec![page.node()])));
    let root = host.root.clone();
    let (reloader, _rx) = HotReloader::new(Arc::clone(&host), root, vec!["vue".into()]);

    let first = reloader.dispatch(ReloadEvent::component("Card", "/src/Card.vue", 1));
    let second = reloader.dispatch(ReloadEvent::component("Card", "/src/Card.vue", 2));
    let missing = reloader.dispatch(ReloadEvent::component("Nope", "/src/Nope.vue", 3));

    assert!(!first.await.unwrap().is_escalation());
    assert!(!second.await.unwrap().is_escalation());
    assert!(missing.await.unwrap().is_escalation());

    // each event loaded its own cache-busted URL
    let mut loads = host.loads();
    loads.sort();
    assert_eq!(loads, ["/src/Card.vue?t=1", "/src/Card.vue?t=2"]);
    assert_eq!(page.renders(), 2);
}

#[tokio::test]
async fn test_transform_failure_is_sent_as_error() {
    let host = Arc::new(FakeHost::new(Instance::named("App", vec![])));
    let root = host.root.clone();
    let (reloader, mut rx) = HotReloader::new(host, root, vec!["vue".into()]);

    assert!(!reloader.report_transform("src/a.js", &TransformResult::ok("export {};")));
    assert!(reloader.report_transform("src/a.js", &TransformResult::err("failed to parse `src/a.js`")));

    assert_eq!(
        rx.recv().await,
        Some(HotReloadMessage::Error {
            path: "src/a.js".into(),
            error: "failed to parse `src/a.js`".into(),
        })
    );
    assert!(rx.try_recv().is_err());
}
