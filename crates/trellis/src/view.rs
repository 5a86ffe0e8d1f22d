//! Contracts between the binding engine and concrete views.
//!
//! The engine never knows what a view is. It asks a [`ViewBackend`] to create
//! one per [`ViewSpec`], to push model state into it, and to dispose of it.
//! Capability checks go through a [`CapabilityProbe`].

use std::any::Any;

use trellis_core::{Capability, NodeRef};

use crate::error::ViewError;
use crate::registry::ViewSpec;

/// Type-erased access to a concrete view, implemented for every `'static`
/// type.
pub trait AsAny {
    /// Borrow as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A view object created by a [`ViewBackend`].
///
/// Downcast to the concrete type with `downcast_ref` / `downcast_mut` on
/// `dyn ViewObject`.
pub trait ViewObject: AsAny {
    /// Check if the view can receive dispatches of a capability.
    fn supports(&self, capability: Capability) -> bool {
        let _ = capability;
        false
    }
}

impl<'a> dyn ViewObject + 'a {
    /// Downcast to a concrete view type.
    pub fn downcast_ref<T: ViewObject + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete view type.
    pub fn downcast_mut<T: ViewObject + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl<'a> std::fmt::Debug for dyn ViewObject + 'a {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ViewObject")
    }
}

/// Creates, feeds and disposes views.
pub trait ViewBackend {
    /// Create the view described by `spec`.
    fn create_view(&mut self, spec: &ViewSpec) -> Result<Box<dyn ViewObject>, ViewError>;

    /// Copy the node's current state into the view.
    fn push_state(&mut self, spec: &ViewSpec, node: NodeRef<'_>, view: &mut dyn ViewObject);

    /// Release a view. The default just drops it.
    fn dispose_view(&mut self, spec: &ViewSpec, view: Box<dyn ViewObject>) {
        let _ = spec;
        drop(view);
    }
}

impl<B: ViewBackend + ?Sized> ViewBackend for Box<B> {
    fn create_view(&mut self, spec: &ViewSpec) -> Result<Box<dyn ViewObject>, ViewError> {
        (**self).create_view(spec)
    }

    fn push_state(&mut self, spec: &ViewSpec, node: NodeRef<'_>, view: &mut dyn ViewObject) {
        (**self).push_state(spec, node, view)
    }

    fn dispose_view(&mut self, spec: &ViewSpec, view: Box<dyn ViewObject>) {
        (**self).dispose_view(spec, view)
    }
}

/// A receiver candidate handed to a [`CapabilityProbe`].
#[derive(Clone, Copy)]
pub enum CandidateRef<'a> {
    /// A model node.
    Node(NodeRef<'a>),
    /// A view bound to a model node.
    View {
        /// The node the view is bound to.
        node: NodeRef<'a>,
        /// The declaration the view was created from.
        spec: &'a ViewSpec,
        /// The view itself.
        view: &'a dyn ViewObject,
    },
}

impl<'a> CandidateRef<'a> {
    /// The model node behind the candidate.
    pub fn node(&self) -> NodeRef<'a> {
        match *self {
            CandidateRef::Node(node) | CandidateRef::View { node, .. } => node,
        }
    }
}

/// Decides whether a candidate supports a capability.
pub trait CapabilityProbe {
    /// Check the candidate.
    fn supports(&self, candidate: CandidateRef<'_>, capability: Capability) -> bool;
}

impl<F> CapabilityProbe for F
where
    F: Fn(CandidateRef<'_>, Capability) -> bool,
{
    fn supports(&self, candidate: CandidateRef<'_>, capability: Capability) -> bool {
        self(candidate, capability)
    }
}

/// The default probe: nodes answer from their capability tags, views from
/// [`ViewObject::supports`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredCapabilities;

impl CapabilityProbe for DeclaredCapabilities {
    fn supports(&self, candidate: CandidateRef<'_>, capability: Capability) -> bool {
        match candidate {
            CandidateRef::Node(node) => node.has_capability(capability),
            CandidateRef::View { view, .. } => view.supports(capability),
        }
    }
}
