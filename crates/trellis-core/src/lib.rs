//! Core systems for Trellis.
//!
//! This crate provides the model side of the Trellis binding engine:
//!
//! - **Model Tree**: Arena-allocated nodes with names, logical ids, styling ids,
//!   capabilities and dynamic properties
//! - **Change Notification**: Every structural or identity change is announced
//!   as a [`ModelEvent`] on the tree's [`Signal`]
//! - **Logging**: `tracing` targets and a tree debug formatter
//!
//! # Example
//!
//! ```
//! use trellis_core::{ModelEventKind, ModelTree};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let child = tree.create_node("child");
//!
//! let added = Arc::new(Mutex::new(Vec::new()));
//! let sink = added.clone();
//! tree.events().connect(move |event| {
//!     if let ModelEventKind::ChildAdd { children } = &event.kind {
//!         sink.lock().extend(children.iter().copied());
//!     }
//! });
//!
//! tree.add_children(root, [child]).unwrap();
//! assert_eq!(*added.lock(), vec![child]);
//! ```

mod capability;
mod error;
pub mod logging;
pub mod signal;
pub mod tree;

pub use capability::Capability;
pub use error::{TreeError, TreeResult};
pub use logging::{TreeDebug, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use tree::{ModelEvent, ModelEventKind, ModelTree, NodeId, NodeRef};

static_assertions::assert_impl_all!(ModelTree: Send, Sync);
static_assertions::assert_impl_all!(Signal<ModelEvent>: Send, Sync);
