//! Error types for store operations.

use couchconf_protocol::ProtocolError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// A path or payload could not be interpreted.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The endpoint configuration is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The server closed the change feed.
    #[error("change feed closed by server")]
    FeedClosed,
}

impl StoreError {
    /// Creates a server error.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Returns true if the error happened before the store could answer.
    pub fn is_transport(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Returns the HTTP status the store answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Server { status, .. } => Some(*status),
            StoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Protocol(ProtocolError::Json(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(StoreError::Unavailable("connection refused".into()).is_transport());
        assert!(!StoreError::server(500, "boom").is_transport());
        assert!(!StoreError::FeedClosed.is_transport());
    }

    #[test]
    fn status_of_server_error() {
        assert_eq!(StoreError::server(404, "missing").status(), Some(404));
        assert_eq!(StoreError::FeedClosed.status(), None);
    }

    #[test]
    fn json_errors_become_protocol_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Protocol(ProtocolError::Json(_))));
    }

    #[test]
    fn error_display() {
        let err = StoreError::server(409, "conflict");
        assert_eq!(err.to_string(), "server error 409: conflict");
    }
}
