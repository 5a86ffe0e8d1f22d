//! Binder instances and their lifecycle container.
//!
//! A [`BinderInstance`] owns the views created for one model node. A
//! [`BinderInstanceMap`] tracks at most one instance per node and creates,
//! refreshes and disposes them through its [`ViewBackend`].
//!
//! # Delayed operations
//!
//! With delayed operations enabled, [`BinderInstanceMap::add`] and
//! [`BinderInstanceMap::remove`] only queue their intent. The queue is applied
//! by [`BinderInstanceMap::do_delay_operations`] (or step by step through
//! [`BinderInstanceMap::delay_operations`]). An `Add` and a `Remove` queued
//! for the same node cancel each other out.
//!
//! # Tree observation
//!
//! [`BinderInstanceMap::observe`] forwards the tree's [`ModelEvent`]s into the
//! map over a channel. Nothing happens until the owner calls
//! [`BinderInstanceMap::process_model_events`], which adds new subtrees under
//! the root model, prunes detached ones, rebinds nodes whose best binding
//! changed, and refreshes nodes that opted into update notifications.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use crossbeam_channel::{unbounded, Receiver};
use indexmap::IndexMap;
use trellis_core::{ConnectionId, ModelEvent, ModelEventKind, ModelTree, NodeId, Signal};

use crate::config::InstanceMapConfig;
use crate::error::Result;
use crate::registry::{Binder, BinderRegistry, ViewSpec};
use crate::view::{ViewBackend, ViewObject};

/// The views created for one node from its resolved binding.
#[derive(Debug)]
pub struct BinderInstance {
    node: NodeId,
    binder: Arc<Binder>,
    binding_index: usize,
    views: Vec<Box<dyn ViewObject>>,
    refresh_on_update: bool,
}

impl BinderInstance {
    pub(crate) fn new(
        node: NodeId,
        binder: Arc<Binder>,
        binding_index: usize,
        views: Vec<Box<dyn ViewObject>>,
    ) -> Self {
        Self {
            node,
            binder,
            binding_index,
            views,
            refresh_on_update: false,
        }
    }

    /// The bound node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The binder the views were created from.
    pub fn binder(&self) -> &Arc<Binder> {
        &self.binder
    }

    /// Registration index of the binding that produced this instance.
    pub fn binding_index(&self) -> usize {
        self.binding_index
    }

    /// Check if the instance refreshes when its node announces an update.
    pub fn refresh_on_update(&self) -> bool {
        self.refresh_on_update
    }

    /// Number of views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Iterate over the views with their declarations.
    pub fn views(&self) -> impl Iterator<Item = BoundView<'_>> {
        let node = self.node;
        self.binder
            .views()
            .iter()
            .zip(&self.views)
            .enumerate()
            .map(move |(index, (spec, view))| BoundView {
                node,
                index,
                spec,
                view: view.as_ref(),
            })
    }

    /// Get a view by position.
    pub fn view(&self, index: usize) -> Option<BoundView<'_>> {
        self.views().nth(index)
    }

    /// Mutably access a view and its declaration by position.
    pub fn view_mut(&mut self, index: usize) -> Option<(&ViewSpec, &mut dyn ViewObject)> {
        let spec = self.binder.views().get(index)?;
        let view = self.views.get_mut(index)?;
        Some((spec, view.as_mut()))
    }

    /// Views whose identity equals `identity`.
    pub fn views_with_identity<'a>(&'a self, identity: &'a str) -> impl Iterator<Item = BoundView<'a>> {
        self.views().filter(move |v| v.identity() == identity)
    }

    /// Push the node's current state into every view.
    pub fn push_state(&mut self, tree: &ModelTree, backend: &mut dyn ViewBackend) -> Result<()> {
        let node = tree.node(self.node)?;
        for (spec, view) in self.binder.views().iter().zip(self.views.iter_mut()) {
            backend.push_state(spec, node, view.as_mut());
        }
        Ok(())
    }

    /// Dispose every view through the backend.
    pub fn dispose(self, backend: &mut dyn ViewBackend) {
        for (spec, view) in self.binder.views().iter().zip(self.views) {
            backend.dispose_view(spec, view);
        }
    }
}

/// A view of a bound node, with its declaration.
#[derive(Debug, Clone, Copy)]
pub struct BoundView<'a> {
    /// The bound node.
    pub node: NodeId,
    /// Position among the instance's views.
    pub index: usize,
    /// The declaration the view was created from.
    pub spec: &'a ViewSpec,
    /// The view.
    pub view: &'a dyn ViewObject,
}

impl<'a> BoundView<'a> {
    /// The declared view identity.
    pub fn identity(&self) -> &'a str {
        &self.spec.view_identity
    }
}

/// A queued `add` or `remove` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayedOperation {
    /// Bind the node.
    Add(NodeId),
    /// Unbind the node.
    Remove(NodeId),
}

impl DelayedOperation {
    /// The node the operation targets.
    pub fn node(&self) -> NodeId {
        match *self {
            DelayedOperation::Add(node) | DelayedOperation::Remove(node) => node,
        }
    }
}

/// A tree connection forwarding model events into the map.
///
/// Disconnects from the tree's signal when dropped, if the tree is still alive.
struct TreeObserver {
    signal: Weak<Signal<ModelEvent>>,
    connection: ConnectionId,
    events: Receiver<ModelEvent>,
}

impl Drop for TreeObserver {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.connection);
        }
    }
}

/// Tracks one [`BinderInstance`] per bound node.
pub struct BinderInstanceMap {
    registry: BinderRegistry,
    backend: Box<dyn ViewBackend>,
    config: InstanceMapConfig,
    tracked: HashMap<NodeId, BinderInstance>,
    order: Vec<NodeId>,
    pending: IndexMap<NodeId, DelayedOperation>,
    root_model: Option<NodeId>,
    observer: Option<TreeObserver>,
}

impl std::fmt::Debug for BinderInstanceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderInstanceMap")
            .field("config", &self.config)
            .field("bindings", &self.registry.len())
            .field("tracked", &self.order)
            .field("pending", &self.pending.values().collect::<Vec<_>>())
            .field("root_model", &self.root_model)
            .field("observing", &self.observer.is_some())
            .finish()
    }
}

impl BinderInstanceMap {
    /// Create a map with the default configuration.
    pub fn new(registry: BinderRegistry, backend: impl ViewBackend + 'static) -> Self {
        Self::with_config(registry, backend, InstanceMapConfig::default())
    }

    /// Create a map with a custom configuration.
    pub fn with_config(
        registry: BinderRegistry,
        backend: impl ViewBackend + 'static,
        config: InstanceMapConfig,
    ) -> Self {
        Self {
            registry,
            backend: Box::new(backend),
            config,
            tracked: HashMap::new(),
            order: Vec::new(),
            pending: IndexMap::new(),
            root_model: None,
            observer: None,
        }
    }

    /// The bindings this map resolves against.
    pub fn registry(&self) -> &BinderRegistry {
        &self.registry
    }

    /// The current configuration.
    pub fn config(&self) -> &InstanceMapConfig {
        &self.config
    }

    /// The view backend.
    pub fn backend_mut(&mut self) -> &mut dyn ViewBackend {
        self.backend.as_mut()
    }

    /// Check if delayed operations are enabled.
    pub fn is_delay_enabled(&self) -> bool {
        self.config.delay_operations
    }

    /// Enable or disable delayed operations.
    ///
    /// Already queued operations stay queued.
    pub fn set_delay_operations(&mut self, enabled: bool) {
        self.config.delay_operations = enabled;
    }

    // =========================================================================
    // Tracking
    // =========================================================================

    /// Bind nodes, or queue the request when delayed operations are enabled.
    ///
    /// Already tracked nodes are skipped. Stops at the first failure; nodes
    /// bound before it stay bound.
    pub fn add<I>(&mut self, tree: &ModelTree, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = NodeId>,
    {
        for node in nodes {
            if self.config.delay_operations {
                self.queue(DelayedOperation::Add(node));
            } else {
                self.bind(tree, node)?;
            }
        }
        Ok(())
    }

    /// Unbind nodes, or queue the request when delayed operations are enabled.
    ///
    /// Returns how many instances were disposed right away.
    pub fn remove<I>(&mut self, nodes: I) -> usize
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut removed = 0;
        for node in nodes {
            if self.config.delay_operations {
                self.queue(DelayedOperation::Remove(node));
            } else if self.unbind(node) {
                removed += 1;
            }
        }
        removed
    }

    fn queue(&mut self, operation: DelayedOperation) {
        let node = operation.node();
        match self.pending.get(&node) {
            Some(&queued) if queued == operation => {}
            Some(_) => {
                tracing::trace!(target: "trellis::instance", ?node, "queued operations cancel out");
                self.pending.shift_remove(&node);
            }
            None => {
                tracing::trace!(target: "trellis::instance", ?operation, "queued operation");
                self.pending.insert(node, operation);
            }
        }
    }

    fn bind(&mut self, tree: &ModelTree, node: NodeId) -> Result<bool> {
        if self.tracked.contains_key(&node) {
            return Ok(false);
        }
        let mut instance = self.registry.instantiate(tree, node, self.backend.as_mut())?;
        instance.refresh_on_update = self.config.refresh_on_update;
        instance.push_state(tree, self.backend.as_mut())?;

        tracing::debug!(target: "trellis::instance", ?node, binding = instance.binding_index, views = instance.view_count(), "bound node");
        self.tracked.insert(node, instance);
        self.order.push(node);
        Ok(true)
    }

    fn unbind(&mut self, node: NodeId) -> bool {
        let Some(instance) = self.tracked.remove(&node) else {
            return false;
        };
        self.order.retain(|&n| n != node);
        instance.dispose(self.backend.as_mut());
        tracing::debug!(target: "trellis::instance", ?node, "unbound node");
        true
    }

    /// Push model state into every tracked instance.
    ///
    /// Always immediate, regardless of delayed operations. Nodes destroyed
    /// since binding are skipped.
    pub fn update_view_objects(&mut self, tree: &ModelTree) {
        for node in &self.order {
            if let Some(instance) = self.tracked.get_mut(node) {
                if instance.push_state(tree, self.backend.as_mut()).is_err() {
                    tracing::trace!(target: "trellis::instance", ?node, "skipping refresh of destroyed node");
                }
            }
        }
    }

    /// The queued operations, in order.
    pub fn pending_operations(&self) -> Vec<DelayedOperation> {
        self.pending.values().copied().collect()
    }

    /// Apply every queued operation once and clear the queue.
    ///
    /// Every operation is attempted; the first failure is returned after the
    /// queue has been drained. Returns how many operations succeeded.
    pub fn do_delay_operations(&mut self, tree: &ModelTree) -> Result<usize> {
        let mut applied = 0;
        let mut first_error = None;
        for result in self.delay_operations(tree) {
            match result {
                Ok(_) => applied += 1,
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        tracing::debug!(target: "trellis::instance", applied, "applied delayed operations");
        match first_error {
            Some(error) => Err(error),
            None => Ok(applied),
        }
    }

    /// Apply queued operations one per iteration step.
    ///
    /// The queue is taken when this is called; operations queued while
    /// iterating are left for the next call.
    pub fn delay_operations<'m, 't>(&'m mut self, tree: &'t ModelTree) -> DelayOperations<'m, 't> {
        let queue = std::mem::take(&mut self.pending).into_values().collect();
        DelayOperations {
            map: self,
            tree,
            queue,
        }
    }

    fn apply(&mut self, tree: &ModelTree, operation: DelayedOperation) -> Result<()> {
        match operation {
            DelayedOperation::Add(node) => self.bind(tree, node).map(|_| ()),
            DelayedOperation::Remove(node) => {
                self.unbind(node);
                Ok(())
            }
        }
    }

    /// Refresh a tracked node whenever it announces an update.
    ///
    /// Returns `false` if the node is not tracked.
    pub fn attach_model_on_updated(&mut self, node: NodeId) -> bool {
        self.set_refresh_on_update(node, true)
    }

    /// Stop refreshing a tracked node on update announcements.
    pub fn detach_model_on_updated(&mut self, node: NodeId) -> bool {
        self.set_refresh_on_update(node, false)
    }

    fn set_refresh_on_update(&mut self, node: NodeId, enabled: bool) -> bool {
        match self.tracked.get_mut(&node) {
            Some(instance) => {
                instance.refresh_on_update = enabled;
                true
            }
            None => false,
        }
    }

    /// Dispose every instance and drop queued operations.
    pub fn clear(&mut self) {
        self.pending.clear();
        for node in std::mem::take(&mut self.order) {
            if let Some(instance) = self.tracked.remove(&node) {
                instance.dispose(self.backend.as_mut());
            }
        }
        tracing::debug!(target: "trellis::instance", "cleared instance map");
    }

    /// Get the instance bound to a node.
    pub fn get(&self, node: NodeId) -> Option<&BinderInstance> {
        self.tracked.get(&node)
    }

    /// Mutably get the instance bound to a node.
    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut BinderInstance> {
        self.tracked.get_mut(&node)
    }

    /// Check if a node is tracked.
    pub fn contains(&self, node: NodeId) -> bool {
        self.tracked.contains_key(&node)
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    /// Check if no node is tracked.
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Tracked nodes, in binding order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// The views bound to a node (none if untracked).
    pub fn views_of(&self, node: NodeId) -> impl Iterator<Item = BoundView<'_>> {
        self.tracked.get(&node).into_iter().flat_map(BinderInstance::views)
    }

    // =========================================================================
    // Tree Observation
    // =========================================================================

    /// The root of the subtree this map mirrors, if any.
    pub fn root_model(&self) -> Option<NodeId> {
        self.root_model
    }

    /// Replace the mirrored subtree.
    ///
    /// Clears the map, then adds the root and all of its descendants
    /// (queued when delayed operations are enabled). Starts observing the
    /// tree when configured to.
    ///
    /// Every node is attempted and the first failure is returned afterwards.
    /// The root model stays set either way; nodes that could not be bound
    /// are retried when their identities change.
    pub fn set_root_model(&mut self, tree: &ModelTree, root: Option<NodeId>) -> Result<()> {
        self.clear();
        self.root_model = root;
        if self.config.observe_tree && self.observer.is_none() {
            self.observe(tree);
        }
        match root {
            Some(root) => {
                let nodes = tree.depth_first_preorder(root)?;
                self.add_each(tree, nodes)
            }
            None => Ok(()),
        }
    }

    /// Add nodes one by one, logging and skipping failures.
    fn add_each(&mut self, tree: &ModelTree, nodes: Vec<NodeId>) -> Result<()> {
        let mut first_error = None;
        for node in nodes {
            if let Err(error) = self.add(tree, [node]) {
                tracing::warn!(target: "trellis::instance", ?node, %error, "failed to bind node");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Forward the tree's model events into this map.
    ///
    /// Replaces any previous observation. The connection ends when the map
    /// is dropped or [`unobserve`](Self::unobserve) is called.
    pub fn observe(&mut self, tree: &ModelTree) {
        self.unobserve();
        let (sender, events) = unbounded();
        let connection = tree.events().connect(move |event| {
            if sender.send(event.clone()).is_err() {
                tracing::trace!(target: "trellis::instance", "observer receiver gone");
            }
        });
        tracing::debug!(target: "trellis::instance", "observing model tree");
        self.observer = Some(TreeObserver {
            signal: tree.events_handle(),
            connection,
            events,
        });
    }

    /// Stop forwarding model events. Events already forwarded are dropped.
    pub fn unobserve(&mut self) {
        if self.observer.take().is_some() {
            tracing::debug!(target: "trellis::instance", "stopped observing model tree");
        }
    }

    /// Check if the map is observing a tree.
    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Handle every forwarded model event. Returns how many were handled.
    ///
    /// Failures while binding are logged and skipped so one bad node does not
    /// stall the rest.
    pub fn process_model_events(&mut self, tree: &ModelTree) -> usize {
        let events: Vec<ModelEvent> = match &self.observer {
            Some(observer) => observer.events.try_iter().collect(),
            None => return 0,
        };
        for event in &events {
            self.handle_event(tree, event);
        }
        events.len()
    }

    fn handle_event(&mut self, tree: &ModelTree, event: &ModelEvent) {
        let at_root = self.root_model == Some(event.target);
        match &event.kind {
            ModelEventKind::ChildAdd { children } if at_root => {
                for &child in children {
                    if !self.under_root(tree, child) {
                        continue;
                    }
                    let subtree = tree.depth_first_preorder(child).unwrap_or_default();
                    if self.add_each(tree, subtree).is_err() {
                        tracing::debug!(target: "trellis::instance", ?child, "added subtree partially bound");
                    }
                }
            }
            ModelEventKind::ChildRemove { .. } if at_root => {
                let detached: Vec<NodeId> = self
                    .order
                    .iter()
                    .copied()
                    .filter(|&node| !self.under_root(tree, node))
                    .collect();
                self.remove(detached);
            }
            ModelEventKind::IdentitiesChanged { source } if *source == event.target => {
                let subtree = tree.depth_first_preorder(*source).unwrap_or_default();
                for node in subtree {
                    self.rebind_if_changed(tree, node);
                }
            }
            ModelEventKind::ParentChange { .. } => {
                self.rebind_if_changed(tree, event.target);
            }
            ModelEventKind::Updated => {
                let backend = self.backend.as_mut();
                if let Some(instance) = self.tracked.get_mut(&event.target) {
                    if instance.refresh_on_update && instance.push_state(tree, backend).is_err() {
                        tracing::trace!(target: "trellis::instance", node = ?event.target, "skipping refresh of destroyed node");
                    }
                }
            }
            _ => {}
        }
    }

    fn under_root(&self, tree: &ModelTree, node: NodeId) -> bool {
        self.root_model
            .is_some_and(|root| tree.is_ancestor_of(root, node))
    }

    /// Re-resolve a tracked node and swap its views if another binding wins.
    ///
    /// Untracked nodes under the root model get another bind attempt.
    fn rebind_if_changed(&mut self, tree: &ModelTree, node: NodeId) {
        let Some(current) = self.tracked.get(&node).map(BinderInstance::binding_index) else {
            if self.under_root(tree, node) {
                if let Err(error) = self.add(tree, [node]) {
                    tracing::trace!(target: "trellis::instance", ?node, %error, "node still unbindable");
                }
            }
            return;
        };
        match self.registry.resolve_index(tree, node) {
            Ok(index) if index == current => {}
            Ok(index) => {
                tracing::debug!(target: "trellis::instance", ?node, from = current, to = index, "rebinding node");
                let refresh = self.tracked.get(&node).is_some_and(|i| i.refresh_on_update);
                self.unbind(node);
                match self.bind(tree, node) {
                    Ok(_) => {
                        self.set_refresh_on_update(node, refresh);
                    }
                    Err(error) => {
                        tracing::warn!(target: "trellis::instance", ?node, %error, "rebinding failed, node untracked");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(target: "trellis::instance", ?node, %error, "node no longer bindable, untracking");
                self.unbind(node);
            }
        }
    }
}

impl Drop for BinderInstanceMap {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Iterator applying queued operations, created by
/// [`BinderInstanceMap::delay_operations`].
pub struct DelayOperations<'m, 't> {
    map: &'m mut BinderInstanceMap,
    tree: &'t ModelTree,
    queue: VecDeque<DelayedOperation>,
}

impl Iterator for DelayOperations<'_, '_> {
    type Item = Result<DelayedOperation>;

    fn next(&mut self) -> Option<Self::Item> {
        let operation = self.queue.pop_front()?;
        Some(self.map.apply(self.tree, operation).map(|()| operation))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

impl ExactSizeIterator for DelayOperations<'_, '_> {}

impl Drop for DelayOperations<'_, '_> {
    fn drop(&mut self) {
        // Unvisited operations go back to the front of the queue.
        if !self.queue.is_empty() {
            let newer = std::mem::take(&mut self.map.pending);
            self.map.pending = self.queue.drain(..).map(|op| (op.node(), op)).collect();
            for operation in newer.into_values() {
                self.map.queue(operation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use trellis_core::NodeRef;

    struct Text(String);
    impl ViewObject for Text {}

    struct TextBackend;

    impl ViewBackend for TextBackend {
        fn create_view(&mut self, _: &ViewSpec) -> std::result::Result<Box<dyn ViewObject>, ViewError> {
            Ok(Box::new(Text(String::new())))
        }

        fn push_state(&mut self, _: &ViewSpec, node: NodeRef<'_>, view: &mut dyn ViewObject) {
            if let Some(text) = view.downcast_mut::<Text>() {
                text.0 = node.name().to_string();
            }
        }
    }

    fn map(config: InstanceMapConfig) -> BinderInstanceMap {
        let mut registry = BinderRegistry::new();
        registry.add("*", Binder::new().view("label", "text", "name")).unwrap();
        BinderInstanceMap::with_config(registry, TextBackend, config)
    }

    fn label(map: &BinderInstanceMap, node: NodeId) -> Option<String> {
        map.views_of(node)
            .next()
            .and_then(|v| v.view.downcast_ref::<Text>())
            .map(|t| t.0.clone())
    }

    #[test]
    fn add_pushes_state_once() {
        let mut tree = ModelTree::new();
        let node = tree.create_node("hello");
        let mut map = map(InstanceMapConfig::default());

        map.add(&tree, [node, node]).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(label(&map, node).as_deref(), Some("hello"));
    }

    #[test]
    fn update_view_objects_ignores_delay_mode() {
        let mut tree = ModelTree::new();
        let node = tree.create_node("before");
        let mut map = map(InstanceMapConfig::default());
        map.add(&tree, [node]).unwrap();
        map.set_delay_operations(true);

        tree.set_name(node, "after").unwrap();
        map.update_view_objects(&tree);

        assert_eq!(label(&map, node).as_deref(), Some("after"));
    }

    #[test]
    fn queue_coalesces() {
        let mut tree = ModelTree::new();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        let mut map = map(InstanceMapConfig::delayed());

        map.add(&tree, [a, b, a]).unwrap();
        map.remove([a]);

        assert_eq!(map.pending_operations(), &[DelayedOperation::Add(b)]);
    }

    #[test]
    fn cancellation_keeps_queue_order() {
        let mut tree = ModelTree::new();
        let [a, b, c] = ["a", "b", "c"].map(|name| tree.create_node(name));
        let mut map = map(InstanceMapConfig::delayed());

        map.add(&tree, [a, b, c]).unwrap();
        map.remove([b]);
        assert_eq!(
            map.pending_operations(),
            vec![DelayedOperation::Add(a), DelayedOperation::Add(c)]
        );

        map.remove([a]);
        map.add(&tree, [b]).unwrap();
        assert_eq!(
            map.pending_operations(),
            vec![DelayedOperation::Add(c), DelayedOperation::Add(b)]
        );
    }

    #[test]
    fn partial_iteration_keeps_the_rest_queued() {
        let mut tree = ModelTree::new();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        let mut map = map(InstanceMapConfig::delayed());
        map.add(&tree, [a, b]).unwrap();

        let first = map.delay_operations(&tree).next().unwrap().unwrap();

        assert_eq!(first, DelayedOperation::Add(a));
        assert!(map.contains(a));
        assert_eq!(map.pending_operations(), &[DelayedOperation::Add(b)]);
    }

    #[test]
    fn refresh_on_update_toggle() {
        let mut tree = ModelTree::new();
        let node = tree.create_node("n");
        let mut map = map(InstanceMapConfig::default());
        map.add(&tree, [node]).unwrap();

        assert!(map.attach_model_on_updated(node));
        assert!(map.get(node).unwrap().refresh_on_update());
        assert!(map.detach_model_on_updated(node));
        assert!(!map.get(node).unwrap().refresh_on_update());

        let stranger = tree.create_node("stranger");
        assert!(!map.attach_model_on_updated(stranger));
    }
}
