//! Integration tests for model tree change notification.

use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::{ModelEvent, ModelEventKind, ModelTree, NodeId, TreeError};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn recorder(tree: &ModelTree) -> Arc<Mutex<Vec<ModelEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    tree.events().connect(move |event| sink.lock().push(event.clone()));
    events
}

fn identity_targets(events: &[ModelEvent]) -> Vec<NodeId> {
    events
        .iter()
        .filter(|e| matches!(e.kind, ModelEventKind::IdentitiesChanged { .. }))
        .map(|e| e.target)
        .collect()
}

/// root -> a -> b -> c
fn chain() -> (ModelTree, [NodeId; 4]) {
    let mut tree = ModelTree::new();
    let root = tree.create_node("root");
    let a = tree.create_node("a");
    let b = tree.create_node("b");
    let c = tree.create_node("c");
    tree.add_children(root, [a]).unwrap();
    tree.add_children(a, [b]).unwrap();
    tree.add_children(b, [c]).unwrap();
    (tree, [root, a, b, c])
}

#[test]
fn identity_change_reaches_every_strict_ancestor_once() {
    setup();
    let (mut tree, [root, a, b, c]) = chain();
    let events = recorder(&tree);

    assert!(tree.set_logical_ids(c, ["leaf"]).unwrap());

    let events = events.lock();
    assert_eq!(identity_targets(&events), vec![c, b, a, root]);
    assert!(events
        .iter()
        .all(|e| e.kind == ModelEventKind::IdentitiesChanged { source: c }));
}

#[test]
fn unchanged_identity_is_silent() {
    setup();
    let (mut tree, [_, _, b, _]) = chain();
    tree.set_styling_ids(b, ["x", "y"]).unwrap();
    let events = recorder(&tree);

    assert!(!tree.set_name(b, "b").unwrap());
    assert!(!tree.set_styling_ids(b, ["y", "x"]).unwrap());
    assert!(!tree.add_styling_id(b, "x").unwrap());
    assert!(!tree.remove_logical_id(b, "absent").unwrap());

    assert!(events.lock().is_empty());
}

#[test]
fn child_add_is_batched_per_ancestor() {
    setup();
    let (mut tree, [root, a, b, _]) = chain();
    let x = tree.create_node("x");
    let y = tree.create_node("y");
    let events = recorder(&tree);

    tree.add_children(b, [x, y]).unwrap();

    let events = events.lock();
    let adds: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.kind {
            ModelEventKind::ChildAdd { children } => Some((e.target, children.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        adds,
        vec![(b, vec![x, y]), (a, vec![x, y]), (root, vec![x, y])]
    );
}

#[test]
fn moving_a_subtree_notifies_old_and_new_paths() {
    setup();
    let (mut tree, [root, a, b, c]) = chain();
    let events = recorder(&tree);

    tree.set_parent(b, Some(root)).unwrap();

    let events = events.lock();
    let removes: Vec<NodeId> = events
        .iter()
        .filter(|e| matches!(e.kind, ModelEventKind::ChildRemove { .. }))
        .map(|e| e.target)
        .collect();
    assert_eq!(removes, vec![a, root]);

    let parent_changes: Vec<NodeId> = events
        .iter()
        .filter_map(|e| match e.kind {
            ModelEventKind::ParentChange {
                moved,
                old_parent,
                new_parent,
            } => {
                assert_eq!((moved, old_parent, new_parent), (b, Some(a), Some(root)));
                Some(e.target)
            }
            _ => None,
        })
        .collect();
    assert_eq!(parent_changes, vec![b, c]);
    assert_eq!(tree.path(c).unwrap(), "root/b/c");
}

#[test]
fn updated_targets_only_the_node() {
    setup();
    let (tree, [_, _, b, _]) = chain();
    let events = recorder(&tree);

    tree.notify_updated(b).unwrap();

    assert_eq!(
        *events.lock(),
        vec![ModelEvent {
            target: b,
            kind: ModelEventKind::Updated,
        }]
    );
}

#[test]
fn stale_handles_are_ignored_or_rejected() {
    setup();
    let (mut tree, [root, a, _, _]) = chain();
    let ghost = tree.create_node("ghost");
    tree.destroy(ghost).unwrap();

    tree.add_children(root, [Some(ghost), None]).unwrap();
    assert_eq!(tree.children(root).unwrap(), &[a]);

    assert_eq!(tree.sibling_index(ghost), Err(TreeError::InvalidNode));
    assert_eq!(tree.notify_updated(ghost), Err(TreeError::InvalidNode));
    assert!(tree.get(ghost).is_none());
}
