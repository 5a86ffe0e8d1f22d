//! Error types for the model tree.

/// Errors that can occur during model tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node handle is stale or was never part of this tree.
    #[error("Invalid or destroyed node handle")]
    InvalidNode,
    /// Attempted to make a node its own parent or ancestor.
    #[error("Cannot attach a node under itself or one of its descendants")]
    CircularParentage,
}

/// Result type for model tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;
