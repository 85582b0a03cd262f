//! Error types for protocol parsing.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while interpreting store paths and payloads.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A design-document path did not have the expected number of segments.
    #[error("invalid design path {path:?}: expected {expected} segments")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Number of `/`-separated segments required.
        expected: usize,
    },

    /// A payload was not valid JSON or did not have the expected shape.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}
