//! Query paths for Trellis model trees.
//!
//! This crate provides the selector language used to bind model nodes to
//! views and to find event receivers:
//!
//! - **Parsing**: [`QueryPath`] turns `"~/root/#main .dark/button"` style
//!   strings into segments of name, logical id, styling id and wildcard terms
//! - **Matching**: [`QueryMatcher`] checks a path against a node and its
//!   ancestor chain
//! - **Priority**: [`QueryPriority`] orders the paths matching one node by
//!   specificity
//! - **Traversal**: [`TreeQueryExt`] adds lazy depth-first queries to
//!   [`ModelTree`](trellis_core::ModelTree)
//!
//! # Example
//!
//! ```
//! use trellis_core::ModelTree;
//! use trellis_query::{QueryPath, TreeQueryExt};
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let apple = tree.create_node("apple");
//! tree.add_children(root, [apple]).unwrap();
//! tree.set_logical_ids(apple, ["fruit"]).unwrap();
//!
//! let specific = QueryPath::parse("apple #fruit").unwrap();
//! let generic = QueryPath::parse("apple").unwrap();
//! assert!(tree.priority(apple, &specific) > tree.priority(apple, &generic));
//! ```

mod error;
mod matcher;
mod path;
pub mod priority;
mod traverse;

pub use error::{QueryError, Result};
pub use matcher::{NodeIdentity, QueryMatcher};
pub use path::{QueryPath, Segment, Term};
pub use priority::{QueryPriority, SegmentPriority};
pub use traverse::{Query, TreeQueryExt};
