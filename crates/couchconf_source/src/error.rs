//! Error types for the configuration source.

use couchconf_store::StoreError;
use thiserror::Error;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised while building a [`SyncConfig`](crate::SyncConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required option is missing or empty.
    #[error("configuration error: missing option {0}")]
    MissingOption(&'static str),

    /// An option is present but unusable.
    #[error("configuration error: invalid option {option}: {reason}")]
    InvalidOption {
        /// Option name.
        option: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The configuration file is not valid JSON of the expected shape.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("configuration io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors delivered by a [`ConfigSource`](crate::ConfigSource).
#[derive(Error, Debug)]
pub enum SourceError {
    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(#[source] StoreError),

    /// The store answered but the database does not exist.
    #[error("database {database} does not exist")]
    CollectionNotFound {
        /// Name of the missing database.
        database: String,
    },

    /// An operation needed a connection but `init` has not succeeded.
    #[error("configuration source not initialized")]
    NotInitialized,

    /// `init` was called on a source that is already initialized.
    #[error("configuration source already initialized")]
    AlreadyInitialized,

    /// A list or view query failed.
    #[error("query failed: {0}")]
    Query(#[source] StoreError),

    /// The change feed failed.
    #[error("change feed failed: {0}")]
    Feed(#[source] StoreError),

    /// No source is attached under the namespace.
    #[error("no configuration source attached as {0:?}")]
    NotAttached(String),
}

impl SourceError {
    /// Returns the underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            SourceError::Connection(e) | SourceError::Query(e) | SourceError::Feed(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if the operation was rejected before touching the store.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SourceError::NotInitialized
                | SourceError::AlreadyInitialized
                | SourceError::NotAttached(_)
        )
    }
}
