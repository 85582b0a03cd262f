//! Store traits.

use crate::endpoint::Endpoint;
use crate::error::StoreResult;
use crate::feed::ChangeStream;
use async_trait::async_trait;
use couchconf_protocol::{ConfigDocument, FeedOptions, QueryParams, ViewRow};

/// A handle to one database in a document store.
///
/// This trait abstracts the client library, allowing for different
/// implementations (HTTP, in-memory for testing, etc.). Handles are
/// read-only: nothing here mutates the store or the handle.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the selected database.
    fn database(&self) -> &str;

    /// Checks whether the selected database exists.
    ///
    /// `Ok(false)` means the store answered and the database is absent;
    /// transport failures are errors.
    async fn exists(&self) -> StoreResult<bool>;

    /// Runs a list transform at `path` (`ddoc/list/view`).
    ///
    /// The transform's output rows are returned as-is. The body must be a
    /// JSON array of objects; any other shape is a
    /// [`StoreError::Protocol`](crate::StoreError::Protocol) error.
    async fn list(&self, path: &str, params: &QueryParams) -> StoreResult<Vec<ConfigDocument>>;

    /// Runs a view query at `path` (`ddoc/view`).
    async fn view(&self, path: &str, params: &QueryParams) -> StoreResult<Vec<ViewRow>>;

    /// Opens a change feed.
    async fn changes(&self, options: &FeedOptions) -> StoreResult<ChangeStream>;
}

/// Opens store handles.
pub trait Connector: Send + Sync {
    /// The store handle type produced by this connector.
    type Store: DocumentStore + 'static;

    /// Opens a handle to `endpoint.database`.
    ///
    /// Connecting does not check that the database exists.
    fn connect(&self, endpoint: &Endpoint) -> StoreResult<Self::Store>;
}
