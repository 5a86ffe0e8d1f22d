//! Trellis: declarative model-to-view binding.
//!
//! Trellis keeps a set of views in step with a [`ModelTree`]:
//!
//! - **Bindings**: a [`BinderRegistry`] maps query paths to [`Binder`]s; the
//!   most specific matching path decides which views a node gets
//! - **Instances**: a [`BinderInstanceMap`] creates, refreshes and disposes
//!   the views of every tracked node through a [`ViewBackend`], optionally
//!   deferring changes and following tree events
//! - **Selectors**: a [`RelationalSelector`] finds receivers around a node
//!   and a [`DispatchRegistry`] delivers payloads to them
//! - **States**: an [`EventStateMap`] names the conditions a node or view is in
//! - **Sheets**: all of the above can be declared in a TOML [`BindingSheet`]
//!
//! # Example
//!
//! ```
//! use trellis::prelude::*;
//!
//! struct Label(String);
//! impl ViewObject for Label {}
//!
//! struct Labels;
//! impl ViewBackend for Labels {
//!     fn create_view(&mut self, _: &ViewSpec) -> Result<Box<dyn ViewObject>, ViewError> {
//!         Ok(Box::new(Label(String::new())))
//!     }
//!
//!     fn push_state(&mut self, _: &ViewSpec, node: NodeRef<'_>, view: &mut dyn ViewObject) {
//!         if let Some(label) = view.downcast_mut::<Label>() {
//!             label.0 = node.name().to_string();
//!         }
//!     }
//! }
//!
//! let registry = BinderRegistry::from_toml(r#"
//!     [[binding]]
//!     query = "*"
//!     views = [{ identity = "label", factory = "text" }]
//! "#).unwrap();
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let mut map = BinderInstanceMap::new(registry, Labels);
//! map.set_root_model(&tree, Some(root)).unwrap();
//!
//! let child = tree.create_node("child");
//! tree.add_children(root, [child]).unwrap();
//! map.process_model_events(&tree);
//!
//! let label = map.views_of(child).next().unwrap();
//! assert_eq!(label.view.downcast_ref::<Label>().unwrap().0, "child");
//! ```

mod config;
mod dispatch;
mod error;
mod instance;
mod registry;
mod selector;
mod sheet;
mod state_map;
mod view;

pub use config::{InstanceMapBuilder, InstanceMapConfig};
pub use dispatch::{payload, DispatchRegistry, Payload, Receiver};
pub use error::{BindError, Result, SheetError, ViewError};
pub use instance::{
    BinderInstance, BinderInstanceMap, BoundView, DelayOperations, DelayedOperation,
};
pub use registry::{Binder, BinderRegistry, Binding, ViewSpec};
pub use selector::{Candidate, Redirect, Relation, RelationalSelector, SelectorHit};
pub use sheet::{BindingEntry, BindingSheet, StateEntry};
pub use state_map::{EventStateMap, StateFilter};
pub use view::{AsAny, CandidateRef, CapabilityProbe, DeclaredCapabilities, ViewBackend, ViewObject};

pub use trellis_core::{Capability, ModelEvent, ModelEventKind, ModelTree, NodeId, NodeRef};
pub use trellis_query::{QueryPath, QueryPriority, TreeQueryExt};

/// Common imports for binding code.
pub mod prelude {
    pub use crate::{
        Binder, BinderInstanceMap, BinderRegistry, BindingSheet, Capability, DeclaredCapabilities,
        DispatchRegistry, EventStateMap, InstanceMapConfig, ModelTree, NodeId, NodeRef, QueryPath,
        RelationalSelector, StateFilter, TreeQueryExt, ViewBackend, ViewError, ViewObject, ViewSpec,
    };
}

static_assertions::assert_impl_all!(InstanceMapConfig: Send, Sync, Copy);
static_assertions::assert_impl_all!(BinderRegistry: Send, Sync);
static_assertions::assert_impl_all!(EventStateMap: Send, Sync);
static_assertions::assert_impl_all!(DispatchRegistry: Send, Sync);
