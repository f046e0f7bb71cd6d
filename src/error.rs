//! Error types for the B+ tree.

use thiserror::Error;

/// Result type alias for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors that can occur when using the tree
///
/// Lookups and deletions of absent keys are not errors; they report `None`
/// or `false`. The only failure a well-behaved caller can observe is
/// dereferencing a cursor that has already run off its range.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A cursor in the terminal state was dereferenced
    #[error("Cursor out of range")]
    CursorOutOfRange,

    /// A structural invariant does not hold
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// A configuration value was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be parsed
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }
}
