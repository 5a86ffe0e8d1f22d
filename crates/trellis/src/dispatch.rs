//! Capability dispatch executors.
//!
//! A [`DispatchRegistry`] maps each [`Capability`] to the function that
//! delivers a payload to a receiver supporting it. The
//! [`RelationalSelector`](crate::RelationalSelector) finds the receivers;
//! the registry performs the call.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use trellis_core::{Capability, NodeId, NodeRef};

use crate::registry::ViewSpec;
use crate::view::ViewObject;

/// A type-erased dispatch payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a [`Payload`].
pub fn payload<T: Any + Send + Sync>(value: T) -> Payload {
    Arc::new(value)
}

/// The receiver of one dispatch.
pub enum Receiver<'a> {
    /// A model node.
    Node(NodeRef<'a>),
    /// A view bound to a model node.
    View {
        /// The node the view is bound to.
        node: NodeRef<'a>,
        /// The declaration the view was created from.
        spec: &'a ViewSpec,
        /// The view itself.
        view: &'a mut dyn ViewObject,
    },
}

impl<'a> Receiver<'a> {
    /// The model node behind the receiver.
    pub fn node(&self) -> NodeRef<'a> {
        match self {
            Receiver::Node(node) | Receiver::View { node, .. } => *node,
        }
    }
}

type Executor = Box<dyn Fn(Receiver<'_>, NodeId, Option<&Payload>) + Send + Sync>;

/// Capability-specific dispatch functions.
#[derive(Default)]
pub struct DispatchRegistry {
    executors: HashMap<Capability, Executor>,
}

impl std::fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut capabilities: Vec<_> = self.executors.keys().collect();
        capabilities.sort();
        f.debug_struct("DispatchRegistry")
            .field("capabilities", &capabilities)
            .finish()
    }
}

impl DispatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the executor for a capability, replacing any previous one.
    ///
    /// The executor receives `(receiver, sender, payload)`.
    pub fn register<F>(&mut self, capability: Capability, executor: F) -> bool
    where
        F: Fn(Receiver<'_>, NodeId, Option<&Payload>) + Send + Sync + 'static,
    {
        tracing::debug!(target: "trellis::dispatch", %capability, "registered executor");
        self.executors.insert(capability, Box::new(executor)).is_some()
    }

    /// Remove the executor for a capability.
    pub fn unregister(&mut self, capability: Capability) -> bool {
        self.executors.remove(&capability).is_some()
    }

    /// Check if a capability has an executor.
    pub fn contains(&self, capability: Capability) -> bool {
        self.executors.contains_key(&capability)
    }

    /// Number of registered executors.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Check if no executor is registered.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Run the executor for `capability`.
    ///
    /// Returns `false` if none is registered.
    pub fn execute(
        &self,
        capability: Capability,
        receiver: Receiver<'_>,
        sender: NodeId,
        payload: Option<&Payload>,
    ) -> bool {
        match self.executors.get(&capability) {
            Some(executor) => {
                tracing::trace!(target: "trellis::dispatch", %capability, receiver = ?receiver.node().id(), ?sender, "dispatching");
                executor(receiver, sender, payload);
                true
            }
            None => {
                tracing::debug!(target: "trellis::dispatch", %capability, "no executor registered");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trellis_core::ModelTree;

    const CLICK: Capability = Capability::new("click");

    #[test]
    fn execute_registered() {
        let mut tree = ModelTree::new();
        let sender = tree.create_node("sender");
        let target = tree.create_node("target");

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let mut registry = DispatchRegistry::new();
        registry.register(CLICK, move |receiver, from, payload| {
            assert_eq!(receiver.node().name(), "target");
            assert_eq!(from, sender);
            let amount = payload.and_then(|p| p.downcast_ref::<usize>()).copied().unwrap_or(1);
            hits_clone.fetch_add(amount, Ordering::SeqCst);
        });

        let receiver = Receiver::Node(tree.node(target).unwrap());
        assert!(registry.execute(CLICK, receiver, sender, Some(&payload(5usize))));
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn execute_unregistered() {
        let mut tree = ModelTree::new();
        let node = tree.create_node("node");
        let mut registry = DispatchRegistry::new();
        registry.register(CLICK, |_, _, _| {});
        assert!(registry.unregister(CLICK));

        let receiver = Receiver::Node(tree.node(node).unwrap());
        assert!(!registry.execute(CLICK, receiver, node, None));
        assert!(registry.is_empty());
    }
}
