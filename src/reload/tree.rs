//! Component tree snapshots.
//!
//! A snapshot is rebuilt from the live root for every event. Nodes keep
//! instance handles only as back-references for the two mutation points.

use super::host::{ComponentHost, WrapperKind};
use crate::debug;

/// Walks deeper than this are cut off (cyclic or malformed graphs).
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTreeNode<I> {
    pub name: String,
    pub instance: I,
    pub wrapper: WrapperKind,
    pub children: Vec<ComponentTreeNode<I>>,
}

impl<I> ComponentTreeNode<I> {
    /// Number of component nodes, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Build a snapshot rooted at `root`.
pub fn snapshot<H: ComponentHost>(host: &H, root: &H::Instance) -> ComponentTreeNode<H::Instance> {
    component_node(host, root.clone(), 0)
}

fn component_node<H: ComponentHost>(
    host: &H,
    instance: H::Instance,
    depth: usize,
) -> ComponentTreeNode<H::Instance> {
    let descriptor = host.describe(&instance);
    let mut children = Vec::new();

    if depth < MAX_DEPTH {
        for node in host.rendered_nodes(&instance) {
            collect_components(host, &node, depth + 1, &mut children);
        }
    } else {
        debug!("reload"; "snapshot depth limit reached at {}", descriptor.display_name());
    }

    ComponentTreeNode {
        name: descriptor.display_name().to_string(),
        instance,
        wrapper: descriptor.wrapper,
        children,
    }
}

/// Descend through plain nodes until component instances are found.
fn collect_components<H: ComponentHost>(
    host: &H,
    node: &H::Node,
    depth: usize,
    out: &mut Vec<ComponentTreeNode<H::Instance>>,
) {
    if let Some(instance) = host.nested_instance(node) {
        out.push(component_node(host, instance, depth));
        return;
    }
    if depth >= MAX_DEPTH {
        debug!("reload"; "snapshot depth limit reached in rendered output");
        return;
    }
    for child in host.child_nodes(node) {
        collect_components(host, &child, depth + 1, out);
    }
}

// =============================================================================
// Locate
// =============================================================================

/// The direct parent of a matched node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentMatch<I> {
    pub name: String,
    pub instance: I,
    pub wrapper: WrapperKind,
    /// The parent is the snapshot root.
    pub is_root: bool,
    /// A keep-alive wrapper sits somewhere above the matched node.
    pub keep_alive_guarded: bool,
}

/// Collect the direct parent of every node named `name`.
///
/// Parents are deduplicated by instance, in pre-order of first discovery.
pub fn locate_parents<I: Clone + PartialEq>(
    tree: &ComponentTreeNode<I>,
    name: &str,
) -> Vec<ParentMatch<I>> {
    let mut parents = Vec::new();
    let mut ancestors = Vec::new();
    walk(tree, &mut ancestors, &mut |node: &ComponentTreeNode<I>, ancestors: &[&ComponentTreeNode<I>]| {
        if node.name == name {
            push_parent(&mut parents, ancestors);
        }
    });
    parents
}

/// Collect the direct parents of every node holding `instance`.
pub fn locate_instance_parents<I: Clone + PartialEq>(
    tree: &ComponentTreeNode<I>,
    instance: &I,
) -> Vec<ParentMatch<I>> {
    let mut parents = Vec::new();
    let mut ancestors = Vec::new();
    walk(tree, &mut ancestors, &mut |node: &ComponentTreeNode<I>, ancestors: &[&ComponentTreeNode<I>]| {
        if &node.instance == instance {
            push_parent(&mut parents, ancestors);
        }
    });
    parents
}

fn walk<'t, I, F>(
    node: &'t ComponentTreeNode<I>,
    ancestors: &mut Vec<&'t ComponentTreeNode<I>>,
    visit: &mut F,
) where
    F: FnMut(&ComponentTreeNode<I>, &[&ComponentTreeNode<I>]),
{
    visit(node, ancestors.as_slice());
    ancestors.push(node);
    for child in &node.children {
        walk(child, ancestors, visit);
    }
    ancestors.pop();
}

fn push_parent<I: Clone + PartialEq>(
    parents: &mut Vec<ParentMatch<I>>,
    ancestors: &[&ComponentTreeNode<I>],
) {
    let Some(parent) = ancestors.last() else {
        return;
    };
    let keep_alive_guarded = ancestors.iter().any(|a| a.wrapper == WrapperKind::KeepAlive);

    if let Some(existing) = parents.iter_mut().find(|p| p.instance == parent.instance) {
        existing.keep_alive_guarded |= keep_alive_guarded;
        return;
    }

    parents.push(ParentMatch {
        name: parent.name.clone(),
        instance: parent.instance.clone(),
        wrapper: parent.wrapper,
        is_root: ancestors.len() == 1,
        keep_alive_guarded,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, id: u32, children: Vec<ComponentTreeNode<u32>>) -> ComponentTreeNode<u32> {
        ComponentTreeNode {
            name: name.into(),
            instance: id,
            wrapper: WrapperKind::None,
            children,
        }
    }

    fn keep_alive(id: u32, children: Vec<ComponentTreeNode<u32>>) -> ComponentTreeNode<u32> {
        ComponentTreeNode {
            wrapper: WrapperKind::KeepAlive,
            ..node("KeepAlive", id, children)
        }
    }

    #[test]
    fn test_locate_direct_parent() {
        let tree = node("App", 0, vec![node("Page", 1, vec![node("Card", 2, vec![])])]);
        let parents = locate_parents(&tree, "Card");

        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].name, "Page");
        assert_eq!(parents[0].instance, 1);
        assert!(!parents[0].is_root);
        assert!(!parents[0].keep_alive_guarded);
    }

    #[test]
    fn test_root_parent_flagged() {
        let tree = node("App", 0, vec![node("Card", 1, vec![])]);
        let parents = locate_parents(&tree, "Card");
        assert!(parents[0].is_root);
    }

    #[test]
    fn test_keep_alive_anywhere_above() {
        let tree = node(
            "App",
            0,
            vec![keep_alive(1, vec![node("Page", 2, vec![node("Card", 3, vec![])])])],
        );
        let parents = locate_parents(&tree, "Card");
        assert_eq!(parents[0].name, "Page");
        assert!(parents[0].keep_alive_guarded);
    }

    #[test]
    fn test_multiple_matches_dedup_parent() {
        let tree = node(
            "App",
            0,
            vec![
                node("Page", 1, vec![node("Card", 2, vec![]), node("Card", 3, vec![])]),
                node("Side", 4, vec![node("Card", 5, vec![])]),
            ],
        );
        let names: Vec<_> = locate_parents(&tree, "Card")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Page", "Side"]);
    }

    #[test]
    fn test_root_match_has_no_parent() {
        let tree = node("App", 0, vec![]);
        assert!(locate_parents(&tree, "App").is_empty());
        assert!(locate_parents(&tree, "Missing").is_empty());
    }

    #[test]
    fn test_locate_instance_parents() {
        let tree = node("App", 0, vec![node("Layout", 1, vec![node("Page", 2, vec![])])]);
        let parents = locate_instance_parents(&tree, &2);
        assert_eq!(parents[0].name, "Layout");
    }

    #[test]
    fn test_count_includes_every_component() {
        let tree = node("App", 0, vec![node("Page", 1, vec![node("Card", 2, vec![])])]);
        assert_eq!(tree.count(), 3);
        assert_eq!(tree.children[0].children[0].name, "Card");
        assert_eq!(tree.children[0].children[0].instance, 2);
    }
}
