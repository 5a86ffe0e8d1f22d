//! Error types for query path parsing.

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while parsing a query path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The path has no segments at all.
    #[error("Empty query path")]
    Empty,

    /// Two separators with nothing between them, or a trailing separator.
    #[error("Empty segment in query path '{path}'")]
    EmptySegment { path: String },

    /// A `#` or `.` prefix without a tag.
    #[error("Empty identity term in query path '{path}'")]
    EmptyTerm { path: String },

    /// A `..` segment after a regular segment, or inside a rooted path.
    #[error("'..' may only lead a relative query path: '{path}'")]
    MisplacedParent { path: String },
}

impl QueryError {
    /// The offending path text, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::EmptySegment { path } | Self::EmptyTerm { path } | Self::MisplacedParent { path } => {
                Some(path)
            }
        }
    }
}
