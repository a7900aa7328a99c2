//! Error types for the delivery client.

use contentstack_protocol::{ProtocolError, SyncItem};
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the delivery API.
#[derive(Error, Debug)]
pub enum Error {
    /// The stack configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network failure, timeout, or a non-2xx reply without an API error body.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
    },

    /// The API rejected the request with an error document.
    #[error("api error {status}: {error_message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Contentstack error code.
        error_code: Option<i64>,
        /// Contentstack error message.
        error_message: String,
    },

    /// The response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// A sync call failed part way through the sequence.
    #[error(
        "sync interrupted by transport failure after {} items: {}",
        .partial_items.len(),
        .source
    )]
    SyncTransport {
        /// The underlying failure.
        source: Box<Error>,
        /// Items received before the failure.
        partial_items: Vec<SyncItem>,
        /// Last token handed to the server, if any.
        last_cursor: Option<String>,
    },

    /// A sync page was malformed or the server misbehaved.
    #[error("sync protocol error: {message}")]
    SyncProtocol {
        /// What went wrong.
        message: String,
        /// Items received before the bad page.
        partial_items: Vec<SyncItem>,
    },

    /// The sync walker hit its page bound.
    #[error("sync did not finish within {pages} pages")]
    SyncPageLimitExceeded {
        /// Pages fetched.
        pages: usize,
        /// Items received so far.
        partial_items: Vec<SyncItem>,
    },

    /// A live preview draft could not be merged.
    #[error("merge input error: {0}")]
    MergeInput(String),

    /// A single-record query matched nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MergeInput(message) => Error::MergeInput(message),
            other => Error::Protocol(other),
        }
    }
}

impl Error {
    /// Creates a transport error without a status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Returns true if a caller could reasonably try again.
    ///
    /// The client itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Error::SyncTransport { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Items received before a sync failed, if this is a sync error.
    pub fn partial_items(&self) -> Option<&[SyncItem]> {
        match self {
            Error::SyncTransport { partial_items, .. }
            | Error::SyncProtocol { partial_items, .. }
            | Error::SyncPageLimitExceeded { partial_items, .. } => Some(partial_items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(Error::transport("connection reset").is_transient());
        assert!(Error::Api {
            status: 429,
            error_code: None,
            error_message: "Too many requests".into(),
        }
        .is_transient());
        assert!(!Error::Api {
            status: 422,
            error_code: Some(141),
            error_message: "The requested object doesn't exist.".into(),
        }
        .is_transient());
        assert!(!Error::Config("api_key is empty".into()).is_transient());

        let wrapped = Error::SyncTransport {
            source: Box::new(Error::transport("timed out")),
            partial_items: Vec::new(),
            last_cursor: None,
        };
        assert!(wrapped.is_transient());
    }

    #[test]
    fn merge_errors_keep_their_kind() {
        let err: Error = ProtocolError::MergeInput("source record 0 has no string uid".into()).into();
        assert!(matches!(err, Error::MergeInput(_)));

        let err: Error = ProtocolError::MissingEnvelope("entry").into();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn error_display() {
        let err = Error::Api {
            status: 401,
            error_code: Some(109),
            error_message: "API key is invalid.".into(),
        };
        assert_eq!(err.to_string(), "api error 401: API key is invalid.");

        let err = Error::SyncTransport {
            source: Box::new(Error::transport("boom")),
            partial_items: Vec::new(),
            last_cursor: Some("T1".into()),
        };
        assert!(err.to_string().contains("after 0 items"));
        assert_eq!(err.partial_items().map(<[_]>::len), Some(0));
    }
}
