//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while interpreting wire payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The response did not contain the expected top-level key.
    #[error("response is missing the `{0}` envelope")]
    MissingEnvelope(&'static str),

    /// A payload had the wrong shape.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    /// A sync item carried a `type` outside the known set.
    #[error("unknown sync item type: {0}")]
    UnknownItemType(String),

    /// A sync request combined parameters the server rejects.
    #[error("invalid sync request: {0}")]
    InvalidSyncRequest(String),

    /// A record handed to the merge was unusable.
    #[error("merge input error: {0}")]
    MergeInput(String),
}

impl ProtocolError {
    /// Creates an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }
}
