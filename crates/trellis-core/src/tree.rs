//! Model tree for Trellis.
//!
//! The tree stores every model node in an arena and hands out stable
//! [`NodeId`] handles. A node carries:
//!
//! - a free-form `name`,
//! - a set of *logical ids* (`#tag` in queries) naming its logical roles,
//! - a set of *styling ids* (`.tag` in queries) naming its presentation roles,
//! - an optional parent and an ordered list of children,
//! - capability tags and dynamic properties for domain payload.
//!
//! The parent link is a plain handle into the arena, never a second owner.
//! Detaching a node leaves it in the arena as a new root; [`ModelTree::destroy`]
//! removes a whole subtree.
//!
//! # Change notification
//!
//! Every mutation that changes the tree announces itself on
//! [`ModelTree::events`] as one or more [`ModelEvent`]s:
//!
//! - attaching children emits one batched [`ModelEventKind::ChildAdd`] at the
//!   new parent and at each of its ancestors, then
//!   [`ModelEventKind::ParentChange`] at every attached node and all of its
//!   descendants;
//! - detaching emits [`ModelEventKind::ChildRemove`] and `ParentChange` the
//!   same way, with `new_parent` set to `None`;
//! - an identity change (name, logical ids, styling ids) emits
//!   [`ModelEventKind::IdentitiesChanged`] at the node and at every strict
//!   ancestor, and only when the value actually differs;
//! - [`ModelTree::notify_updated`] emits [`ModelEventKind::Updated`] at the
//!   node alone.
//!
//! # Example
//!
//! ```
//! use trellis_core::ModelTree;
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let apple = tree.create_node("apple");
//! tree.add_children(root, [apple]).unwrap();
//!
//! assert_eq!(tree.path(apple).unwrap(), "root/apple");
//! assert_eq!(tree.sibling_index(apple).unwrap(), Some(0));
//! ```

use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::capability::Capability;
use crate::error::{TreeError, TreeResult};
use crate::signal::Signal;

new_key_type! {
    /// A stable handle to a node in a [`ModelTree`].
    ///
    /// Handles stay valid while the node is re-parented and become stale when
    /// the node is destroyed. A stale handle plays the role of a null node:
    /// most accessors report it as [`TreeError::InvalidNode`].
    pub struct NodeId;
}

/// A change notification emitted by a [`ModelTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEvent {
    /// The node receiving the notification.
    pub target: NodeId,
    /// What happened.
    pub kind: ModelEventKind,
}

/// The kind of a [`ModelEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEventKind {
    /// Children were attached somewhere in the target's subtree.
    ///
    /// `children` lists every node attached directly to the same parent by
    /// one operation.
    ChildAdd {
        /// The directly attached nodes.
        children: Vec<NodeId>,
    },
    /// Children were detached somewhere in the target's subtree.
    ChildRemove {
        /// The directly detached nodes.
        children: Vec<NodeId>,
    },
    /// The parent of `moved` changed; sent to `moved` and its descendants.
    ParentChange {
        /// The root of the subtree that moved.
        moved: NodeId,
        /// Parent before the move.
        old_parent: Option<NodeId>,
        /// Parent after the move.
        new_parent: Option<NodeId>,
    },
    /// The name, logical ids or styling ids of `source` changed.
    ///
    /// Sent to `source` and to each of its strict ancestors.
    IdentitiesChanged {
        /// The node whose identity changed.
        source: NodeId,
    },
    /// The node announced that it finished being updated.
    Updated,
}

/// Internal data stored in the arena for each node.
struct NodeData {
    name: String,
    logical_ids: BTreeSet<String>,
    styling_ids: BTreeSet<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    capabilities: HashSet<Capability>,
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl NodeData {
    fn new(name: String) -> Self {
        Self {
            name,
            logical_ids: BTreeSet::new(),
            styling_ids: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
            capabilities: HashSet::new(),
            properties: HashMap::new(),
        }
    }
}

/// Which identity tag set an operation targets.
#[derive(Clone, Copy)]
enum TagSet {
    Logical,
    Styling,
}

/// The arena owning every model node and the change signal.
pub struct ModelTree {
    nodes: SlotMap<NodeId, NodeData>,
    events: Arc<Signal<ModelEvent>>,
}

impl fmt::Debug for ModelTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTree")
            .field("node_count", &self.nodes.len())
            .field("events", &self.events)
            .finish()
    }
}

impl Default for ModelTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            events: Arc::new(Signal::new()),
        }
    }

    /// The signal carrying every change notification of this tree.
    pub fn events(&self) -> &Signal<ModelEvent> {
        &self.events
    }

    /// A weak handle to [`events`](Self::events) for subscribers that may
    /// outlive their borrow of the tree and need to disconnect later.
    pub fn events_handle(&self) -> Weak<Signal<ModelEvent>> {
        Arc::downgrade(&self.events)
    }

    // =========================================================================
    // Creation / Destruction
    // =========================================================================

    /// Create a standalone root node.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = self.nodes.insert(NodeData::new(name));
        tracing::trace!(target: "trellis_core::tree", ?id, "created node");
        id
    }

    /// Detach a node and remove it and all of its descendants from the arena.
    #[tracing::instrument(skip(self), target = "trellis_core::tree", level = "trace")]
    pub fn destroy(&mut self, id: NodeId) -> TreeResult<()> {
        self.set_parent(id, None)?;
        let doomed = self.depth_first_preorder(id)?;
        tracing::trace!(target: "trellis_core::tree", ?id, subtree_size = doomed.len(), "destroying subtree");
        for node in doomed {
            self.nodes.remove(node);
        }
        Ok(())
    }

    /// Check if a handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node, or `None` for a stale handle.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id).map(|data| NodeRef {
            tree: self,
            id,
            data,
        })
    }

    /// Borrow a node, failing on a stale handle.
    pub fn node(&self, id: NodeId) -> TreeResult<NodeRef<'_>> {
        self.get(id).ok_or(TreeError::InvalidNode)
    }

    /// Iterate over all root nodes.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, data)| data.parent.is_none())
            .map(|(id, _)| id)
    }

    fn data(&self, id: NodeId) -> TreeResult<&NodeData> {
        self.nodes.get(id).ok_or(TreeError::InvalidNode)
    }

    fn data_mut(&mut self, id: NodeId) -> TreeResult<&mut NodeData> {
        self.nodes.get_mut(id).ok_or(TreeError::InvalidNode)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Get the node's name.
    pub fn name(&self, id: NodeId) -> TreeResult<&str> {
        self.data(id).map(|d| d.name.as_str())
    }

    /// Set the node's name.
    ///
    /// Returns `Ok(true)` if the name changed (and notifications were sent).
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> TreeResult<bool> {
        let name = name.into();
        let data = self.data_mut(id)?;
        if data.name == name {
            return Ok(false);
        }
        data.name = name;
        self.emit_identities_changed(id);
        Ok(true)
    }

    /// Get the node's logical ids.
    pub fn logical_ids(&self, id: NodeId) -> TreeResult<&BTreeSet<String>> {
        self.data(id).map(|d| &d.logical_ids)
    }

    /// Replace the node's logical ids.
    ///
    /// Returns `Ok(true)` if the resulting set differs from the previous one.
    pub fn set_logical_ids<I, S>(&mut self, id: NodeId, ids: I) -> TreeResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace_tags(id, TagSet::Logical, ids.into_iter().map(Into::into).collect())
    }

    /// Add one logical id.
    pub fn add_logical_id(&mut self, id: NodeId, tag: impl Into<String>) -> TreeResult<bool> {
        self.edit_tag(id, TagSet::Logical, tag.into(), true)
    }

    /// Remove one logical id.
    pub fn remove_logical_id(&mut self, id: NodeId, tag: &str) -> TreeResult<bool> {
        self.edit_tag(id, TagSet::Logical, tag.to_string(), false)
    }

    /// Get the node's styling ids.
    pub fn styling_ids(&self, id: NodeId) -> TreeResult<&BTreeSet<String>> {
        self.data(id).map(|d| &d.styling_ids)
    }

    /// Replace the node's styling ids.
    ///
    /// Returns `Ok(true)` if the resulting set differs from the previous one.
    pub fn set_styling_ids<I, S>(&mut self, id: NodeId, ids: I) -> TreeResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace_tags(id, TagSet::Styling, ids.into_iter().map(Into::into).collect())
    }

    /// Add one styling id.
    pub fn add_styling_id(&mut self, id: NodeId, tag: impl Into<String>) -> TreeResult<bool> {
        self.edit_tag(id, TagSet::Styling, tag.into(), true)
    }

    /// Remove one styling id.
    pub fn remove_styling_id(&mut self, id: NodeId, tag: &str) -> TreeResult<bool> {
        self.edit_tag(id, TagSet::Styling, tag.to_string(), false)
    }

    fn tags_mut(&mut self, id: NodeId, set: TagSet) -> TreeResult<&mut BTreeSet<String>> {
        let data = self.data_mut(id)?;
        Ok(match set {
            TagSet::Logical => &mut data.logical_ids,
            TagSet::Styling => &mut data.styling_ids,
        })
    }

    fn replace_tags(&mut self, id: NodeId, set: TagSet, tags: BTreeSet<String>) -> TreeResult<bool> {
        let current = self.tags_mut(id, set)?;
        if *current == tags {
            return Ok(false);
        }
        *current = tags;
        self.emit_identities_changed(id);
        Ok(true)
    }

    fn edit_tag(&mut self, id: NodeId, set: TagSet, tag: String, insert: bool) -> TreeResult<bool> {
        let current = self.tags_mut(id, set)?;
        let changed = if insert {
            current.insert(tag)
        } else {
            current.remove(&tag)
        };
        if changed {
            self.emit_identities_changed(id);
        }
        Ok(changed)
    }

    fn emit_identities_changed(&self, source: NodeId) {
        tracing::trace!(target: "trellis_core::tree", ?source, "identities changed");
        let mut current = Some(source);
        while let Some(target) = current {
            self.events.emit(ModelEvent {
                target,
                kind: ModelEventKind::IdentitiesChanged { source },
            });
            current = self.nodes.get(target).and_then(|d| d.parent);
        }
    }

    // =========================================================================
    // Capabilities / Dynamic Properties
    // =========================================================================

    /// Declare that a node supports a capability.
    pub fn add_capability(&mut self, id: NodeId, capability: Capability) -> TreeResult<bool> {
        Ok(self.data_mut(id)?.capabilities.insert(capability))
    }

    /// Withdraw a capability from a node.
    pub fn remove_capability(&mut self, id: NodeId, capability: Capability) -> TreeResult<bool> {
        Ok(self.data_mut(id)?.capabilities.remove(&capability))
    }

    /// Check if a node declares a capability.
    pub fn has_capability(&self, id: NodeId, capability: Capability) -> TreeResult<bool> {
        Ok(self.data(id)?.capabilities.contains(&capability))
    }

    /// Attach a dynamic property to a node.
    pub fn set_property<T: Any + Send + Sync>(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: T,
    ) -> TreeResult<()> {
        self.data_mut(id)?.properties.insert(name.into(), Box::new(value));
        Ok(())
    }

    /// Read a dynamic property, or `None` if absent or of another type.
    pub fn property<T: Any>(&self, id: NodeId, name: &str) -> TreeResult<Option<&T>> {
        Ok(self
            .data(id)?
            .properties
            .get(name)
            .and_then(|v| v.downcast_ref::<T>()))
    }

    /// Mutably access a dynamic property.
    pub fn property_mut<T: Any>(&mut self, id: NodeId, name: &str) -> TreeResult<Option<&mut T>> {
        Ok(self
            .data_mut(id)?
            .properties
            .get_mut(name)
            .and_then(|v| v.downcast_mut::<T>()))
    }

    /// Remove a dynamic property.
    pub fn remove_property(
        &mut self,
        id: NodeId,
        name: &str,
    ) -> TreeResult<Option<Box<dyn Any + Send + Sync>>> {
        Ok(self.data_mut(id)?.properties.remove(name))
    }

    /// Announce that the node has finished being updated.
    pub fn notify_updated(&self, id: NodeId) -> TreeResult<()> {
        self.data(id)?;
        self.events.emit(ModelEvent {
            target: id,
            kind: ModelEventKind::Updated,
        });
        Ok(())
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.data(id).map(|d| d.parent)
    }

    /// Get the children of a node.
    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        self.data(id).map(|d| d.children.as_slice())
    }

    /// Set the parent of a node.
    ///
    /// `Some(parent)` appends the node to the parent's children (detaching it
    /// from its previous parent first); `None` makes it a root.
    pub fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> TreeResult<()> {
        match new_parent {
            Some(parent) => {
                self.data(id)?;
                self.add_children(parent, [id])
            }
            None => match self.data(id)?.parent {
                Some(old_parent) => self.remove_children(old_parent, [id]),
                None => Ok(()),
            },
        }
    }

    /// Append several children to `parent` in one batch.
    ///
    /// Items may be plain handles or `Option<NodeId>`; `None`, stale handles,
    /// duplicates and nodes already parented here are ignored. A circular
    /// attachment fails before anything is mutated.
    #[tracing::instrument(skip(self, children), target = "trellis_core::tree", level = "trace")]
    pub fn add_children<I>(&mut self, parent: NodeId, children: I) -> TreeResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<NodeId>>,
    {
        self.data(parent)?;

        let mut batch: Vec<NodeId> = Vec::new();
        for child in children.into_iter().filter_map(Into::into) {
            let Some(data) = self.nodes.get(child) else {
                continue;
            };
            if data.parent == Some(parent) || batch.contains(&child) {
                continue;
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(TreeError::CircularParentage);
            }
            batch.push(child);
        }
        if batch.is_empty() {
            return Ok(());
        }

        // Detach from previous parents, grouped per parent.
        let mut moves: Vec<(NodeId, Option<NodeId>)> = Vec::with_capacity(batch.len());
        let mut removals: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
        for &child in &batch {
            let old_parent = self.unlink(child);
            moves.push((child, old_parent));
            if let Some(old) = old_parent {
                match removals.iter_mut().find(|(p, _)| *p == old) {
                    Some((_, group)) => group.push(child),
                    None => removals.push((old, vec![child])),
                }
            }
        }

        for &child in &batch {
            self.nodes[child].parent = Some(parent);
        }
        self.nodes[parent].children.extend_from_slice(&batch);
        tracing::trace!(target: "trellis_core::tree", ?parent, count = batch.len(), "attached children");

        for (old, group) in removals {
            self.emit_up(old, ModelEventKind::ChildRemove { children: group });
        }
        self.emit_up(parent, ModelEventKind::ChildAdd {
            children: batch,
        });
        for (moved, old_parent) in moves {
            self.emit_parent_change(moved, old_parent, Some(parent));
        }
        Ok(())
    }

    /// Detach several children of `parent` in one batch.
    ///
    /// Items that are `None`, stale, or not children of `parent` are ignored.
    #[tracing::instrument(skip(self, children), target = "trellis_core::tree", level = "trace")]
    pub fn remove_children<I>(&mut self, parent: NodeId, children: I) -> TreeResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<NodeId>>,
    {
        self.data(parent)?;

        let mut batch: Vec<NodeId> = Vec::new();
        for child in children.into_iter().filter_map(Into::into) {
            let is_child = self
                .nodes
                .get(child)
                .is_some_and(|d| d.parent == Some(parent));
            if is_child && !batch.contains(&child) {
                batch.push(child);
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        for &child in &batch {
            self.unlink(child);
        }
        tracing::trace!(target: "trellis_core::tree", ?parent, count = batch.len(), "detached children");

        self.emit_up(parent, ModelEventKind::ChildRemove {
            children: batch.clone(),
        });
        for child in batch {
            self.emit_parent_change(child, Some(parent), None);
        }
        Ok(())
    }

    /// Remove a node from its parent's children without notifying.
    fn unlink(&mut self, child: NodeId) -> Option<NodeId> {
        let old_parent = self.nodes.get_mut(child).and_then(|d| d.parent.take());
        if let Some(old) = old_parent {
            if let Some(parent_data) = self.nodes.get_mut(old) {
                parent_data.children.retain(|&c| c != child);
            }
        }
        old_parent
    }

    /// Emit `kind` at `from` and every ancestor of it.
    fn emit_up(&self, from: NodeId, kind: ModelEventKind) {
        let mut current = Some(from);
        while let Some(target) = current {
            self.events.emit(ModelEvent {
                target,
                kind: kind.clone(),
            });
            current = self.nodes.get(target).and_then(|d| d.parent);
        }
    }

    fn emit_parent_change(&self, moved: NodeId, old_parent: Option<NodeId>, new_parent: Option<NodeId>) {
        let subtree = self.depth_first_preorder(moved).unwrap_or_default();
        for target in subtree {
            self.events.emit(ModelEvent {
                target,
                kind: ModelEventKind::ParentChange {
                    moved,
                    old_parent,
                    new_parent,
                },
            });
        }
    }

    fn is_ancestor_or_self(&self, potential_ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    /// Check if `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor_or_self(ancestor, id)
    }

    /// Get the index of a node among its siblings.
    ///
    /// Returns `None` for a root node.
    pub fn sibling_index(&self, id: NodeId) -> TreeResult<Option<usize>> {
        let data = self.data(id)?;
        match data.parent {
            Some(parent_id) => {
                let parent_data = self.data(parent_id)?;
                Ok(parent_data.children.iter().position(|&child| child == id))
            }
            None => Ok(None),
        }
    }

    /// The slash-joined names from the root down to this node.
    pub fn path(&self, id: NodeId) -> TreeResult<String> {
        let data = self.data(id)?;
        match data.parent {
            Some(parent) => Ok(format!("{}/{}", self.path(parent)?, data.name)),
            None => Ok(data.name.clone()),
        }
    }

    /// The root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> TreeResult<NodeId> {
        let mut current = id;
        while let Some(parent) = self.data(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    // =========================================================================
    // Tree Traversal
    // =========================================================================

    /// Get all ancestors of a node from immediate parent to root.
    pub fn ancestors(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.data(id)?.parent;
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        Ok(result)
    }

    /// All descendants of a node, parent before children (the node excluded).
    pub fn descendants(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut result = self.depth_first_preorder(id)?;
        result.remove(0);
        Ok(result)
    }

    /// Depth-first pre-order traversal starting from (and including) a node.
    pub fn depth_first_preorder(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        self.depth_first_preorder_recursive(id, &mut result)?;
        Ok(result)
    }

    fn depth_first_preorder_recursive(&self, id: NodeId, result: &mut Vec<NodeId>) -> TreeResult<()> {
        let data = self.data(id)?;
        result.push(id);
        for &child_id in &data.children {
            self.depth_first_preorder_recursive(child_id, result)?;
        }
        Ok(())
    }
}

/// A borrowed view of one node, carrying the tree for navigation.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ModelTree,
    id: NodeId,
    data: &'a NodeData,
}

impl<'a> NodeRef<'a> {
    /// The node's handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree the node lives in.
    pub fn tree(&self) -> &'a ModelTree {
        self.tree
    }

    /// The node's name.
    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    /// The node's logical ids.
    pub fn logical_ids(&self) -> &'a BTreeSet<String> {
        &self.data.logical_ids
    }

    /// The node's styling ids.
    pub fn styling_ids(&self) -> &'a BTreeSet<String> {
        &self.data.styling_ids
    }

    /// Check logical id membership.
    pub fn has_logical_id(&self, tag: &str) -> bool {
        self.data.logical_ids.contains(tag)
    }

    /// Check styling id membership.
    pub fn has_styling_id(&self, tag: &str) -> bool {
        self.data.styling_ids.contains(tag)
    }

    /// Check capability support.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.data.capabilities.contains(&capability)
    }

    /// The parent node, if any.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data.parent.and_then(|p| self.tree.get(p))
    }

    /// The children, in sibling order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.data.children.iter().filter_map(move |&c| tree.get(c))
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.data.children.len()
    }

    /// Read a dynamic property.
    pub fn property<T: Any>(&self, name: &str) -> Option<&'a T> {
        self.data.properties.get(name).and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.data.name)
            .field("logical_ids", &self.data.logical_ids)
            .field("styling_ids", &self.data.styling_ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn record(tree: &ModelTree) -> Arc<Mutex<Vec<ModelEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        tree.events().connect(move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn test_parent_child() {
        let mut tree = ModelTree::new();
        let parent = tree.create_node("parent");
        let child = tree.create_node("child");

        tree.set_parent(child, Some(parent)).unwrap();

        assert_eq!(tree.parent(child).unwrap(), Some(parent));
        assert_eq!(tree.children(parent).unwrap(), &[child]);
    }

    #[test]
    fn test_path_composition() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        tree.add_children(root, [a]).unwrap();
        tree.add_children(a, [b]).unwrap();

        assert_eq!(tree.path(root).unwrap(), "root");
        assert_eq!(tree.path(b).unwrap(), "root/a/b");
    }

    #[test]
    fn test_sibling_index() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let c1 = tree.create_node("c1");
        let c2 = tree.create_node("c2");
        tree.add_children(root, [c1, c2]).unwrap();

        assert_eq!(tree.sibling_index(root).unwrap(), None);
        assert_eq!(tree.sibling_index(c1).unwrap(), Some(0));
        assert_eq!(tree.sibling_index(c2).unwrap(), Some(1));
    }

    #[test]
    fn test_circular_parentage_rejected() {
        let mut tree = ModelTree::new();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        tree.set_parent(b, Some(a)).unwrap();

        assert_eq!(tree.set_parent(a, Some(b)), Err(TreeError::CircularParentage));
        assert_eq!(tree.set_parent(a, Some(a)), Err(TreeError::CircularParentage));
        assert_eq!(tree.parent(a).unwrap(), None);
    }

    #[test]
    fn test_reparenting() {
        let mut tree = ModelTree::new();
        let p1 = tree.create_node("p1");
        let p2 = tree.create_node("p2");
        let child = tree.create_node("mobile");

        tree.set_parent(child, Some(p1)).unwrap();
        let events = record(&tree);
        tree.set_parent(child, Some(p2)).unwrap();

        assert!(tree.children(p1).unwrap().is_empty());
        assert_eq!(tree.children(p2).unwrap(), &[child]);

        let events = events.lock();
        assert!(events.contains(&ModelEvent {
            target: p1,
            kind: ModelEventKind::ChildRemove { children: vec![child] },
        }));
        assert!(events.contains(&ModelEvent {
            target: child,
            kind: ModelEventKind::ParentChange {
                moved: child,
                old_parent: Some(p1),
                new_parent: Some(p2),
            },
        }));
    }

    #[test]
    fn test_batched_child_add() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let mid = tree.create_node("mid");
        tree.add_children(root, [mid]).unwrap();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        let grandchild = tree.create_node("g");
        tree.add_children(a, [grandchild]).unwrap();

        let events = record(&tree);
        tree.add_children(mid, [Some(a), None, Some(b)]).unwrap();

        let events = events.lock();
        let child_adds: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.kind, ModelEventKind::ChildAdd { .. }))
            .collect();
        assert_eq!(child_adds.len(), 2);
        assert_eq!(child_adds[0].target, mid);
        assert_eq!(child_adds[1].target, root);
        assert_eq!(
            child_adds[0].kind,
            ModelEventKind::ChildAdd { children: vec![a, b] }
        );

        let parent_changes: Vec<NodeId> = events
            .iter()
            .filter(|e| matches!(e.kind, ModelEventKind::ParentChange { .. }))
            .map(|e| e.target)
            .collect();
        assert_eq!(parent_changes, vec![a, grandchild, b]);
    }

    #[test]
    fn test_remove_children_ignores_none_and_strangers() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let a = tree.create_node("a");
        let stranger = tree.create_node("stranger");
        tree.add_children(root, [a]).unwrap();

        let events = record(&tree);
        tree.remove_children(root, [None, Some(stranger), Some(a)]).unwrap();

        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.parent(a).unwrap(), None);
        assert!(events.lock().contains(&ModelEvent {
            target: a,
            kind: ModelEventKind::ParentChange {
                moved: a,
                old_parent: Some(root),
                new_parent: None,
            },
        }));
    }

    #[test]
    fn test_identity_notifications() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let child = tree.create_node("child");
        tree.add_children(root, [child]).unwrap();

        let events = record(&tree);

        assert!(!tree.set_name(child, "child").unwrap());
        assert!(!tree.set_logical_ids(child, Vec::<String>::new()).unwrap());
        assert!(events.lock().is_empty());

        assert!(tree.set_name(child, "renamed").unwrap());
        assert_eq!(
            events.lock().iter().map(|e| e.target).collect::<Vec<_>>(),
            vec![child, root]
        );

        events.lock().clear();
        assert!(tree.set_styling_ids(child, ["a", "b"]).unwrap());
        assert!(!tree.set_styling_ids(child, ["b", "a"]).unwrap());
        assert!(!tree.add_styling_id(child, "a").unwrap());
        assert!(tree.remove_styling_id(child, "a").unwrap());
        assert_eq!(events.lock().len(), 4);
    }

    #[test]
    fn test_destroy_subtree() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        tree.add_children(root, [a]).unwrap();
        tree.add_children(a, [b]).unwrap();

        tree.destroy(a).unwrap();

        assert!(tree.contains(root));
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.name(a), Err(TreeError::InvalidNode));
    }

    #[test]
    fn test_dynamic_properties_and_capabilities() {
        const CLICK: Capability = Capability::new("click");

        let mut tree = ModelTree::new();
        let node = tree.create_node("node");
        tree.set_property(node, "counter", 100i32).unwrap();
        tree.add_capability(node, CLICK).unwrap();

        assert_eq!(tree.property::<i32>(node, "counter").unwrap(), Some(&100));
        assert_eq!(tree.property::<String>(node, "counter").unwrap(), None);
        assert!(tree.node(node).unwrap().has_capability(CLICK));
    }

    #[test]
    fn test_traversal_order() {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let c1 = tree.create_node("c1");
        let c2 = tree.create_node("c2");
        let g1 = tree.create_node("g1");
        tree.add_children(root, [c1, c2]).unwrap();
        tree.add_children(c1, [g1]).unwrap();

        assert_eq!(tree.depth_first_preorder(root).unwrap(), vec![root, c1, g1, c2]);
        assert_eq!(tree.descendants(root).unwrap(), vec![c1, g1, c2]);
        assert_eq!(tree.ancestors(g1).unwrap(), vec![c1, root]);
        assert_eq!(tree.root_of(g1).unwrap(), root);
    }
}
