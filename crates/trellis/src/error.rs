//! Error types for the binding engine.

use std::path::PathBuf;

use trellis_core::{NodeId, TreeError};
use trellis_query::QueryError;

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors reported by a [`ViewBackend`](crate::ViewBackend).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The backend has no factory under this key.
    #[error("Unknown view factory '{0}'")]
    UnknownFactory(String),

    /// Any other backend failure.
    #[error("View backend error: {0}")]
    Backend(String),
}

/// Errors loading or saving a binding sheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// The TOML text could not be parsed into a sheet.
    #[error("Binding sheet parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The sheet could not be written as TOML.
    #[error("Binding sheet serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// File I/O error.
    #[error("Failed to read binding sheet '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SheetError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while binding nodes to views.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// No registered binding matches the node.
    #[error("No binder matches node '{path}'")]
    NoMatchingBinder { node: NodeId, path: String },

    /// The backend failed to create one of the binder's views.
    #[error("Failed to create view from factory '{factory_key}': {source}")]
    ViewCreation {
        factory_key: String,
        #[source]
        source: ViewError,
    },

    /// The node handle is stale.
    #[error("Invalid or destroyed node handle")]
    InvalidNode,

    /// A query path failed to parse.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A binding sheet failed to load.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}
