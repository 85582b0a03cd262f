//! In-memory document store for testing.

use crate::endpoint::Endpoint;
use crate::error::{StoreError, StoreResult};
use crate::feed::{ChangeStream, FeedRecord, FeedSender};
use crate::store::{Connector, DocumentStore};
use async_trait::async_trait;
use couchconf_protocol::{ChangeRecord, ConfigDocument, FeedOptions, QueryParams, ViewRow};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A call recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `exists()`.
    Exists,
    /// `list(path, params)`.
    List {
        /// Requested path.
        path: String,
        /// Requested parameters.
        params: QueryParams,
    },
    /// `view(path, params)`.
    View {
        /// Requested path.
        path: String,
        /// Requested parameters.
        params: QueryParams,
    },
    /// `changes(options)`.
    Changes(FeedOptions),
}

/// A scripted failure, replayed as a fresh error on every call.
#[derive(Debug, Clone)]
enum Failure {
    Unavailable(String),
    Server(u16, String),
}

impl Failure {
    fn to_error(&self) -> StoreError {
        match self {
            Failure::Unavailable(message) => StoreError::Unavailable(message.clone()),
            Failure::Server(status, message) => StoreError::server(*status, message.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    exists: Option<Failure>,
    list: Option<Failure>,
    view: Option<Failure>,
    changes: Option<Failure>,
}

#[derive(Debug)]
struct MemoryInner {
    database: String,
    present: Mutex<bool>,
    list_rows: Mutex<Vec<ConfigDocument>>,
    view_rows: Mutex<Vec<ViewRow>>,
    script: Mutex<Script>,
    query_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<StoreCall>>,
    feeds: Mutex<Vec<FeedSender>>,
}

/// A scriptable in-memory store.
///
/// Clones share state, so a test can keep one handle to script responses and
/// inspect recorded calls while the code under test holds another.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    /// Creates an existing, empty database.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                database: database.into(),
                present: Mutex::new(true),
                list_rows: Mutex::new(Vec::new()),
                view_rows: Mutex::new(Vec::new()),
                script: Mutex::new(Script::default()),
                query_delay: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
                feeds: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Sets whether the database exists.
    pub fn set_present(&self, present: bool) {
        *self.inner.present.lock() = present;
    }

    /// Sets the rows returned by view queries.
    pub fn set_view_rows(&self, rows: Vec<ViewRow>) {
        *self.inner.view_rows.lock() = rows;
    }

    /// Sets view rows embedding each of `docs`, in order.
    pub fn set_view_documents(&self, docs: Vec<ConfigDocument>) {
        self.set_view_rows(docs.into_iter().map(ViewRow::with_doc).collect());
    }

    /// Sets the rows returned by list queries.
    pub fn set_list_rows(&self, rows: Vec<ConfigDocument>) {
        *self.inner.list_rows.lock() = rows;
    }

    /// Delays every list and view query.
    pub fn set_query_delay(&self, delay: Duration) {
        *self.inner.query_delay.lock() = Some(delay);
    }

    /// Makes `exists()` fail as if the store were unreachable.
    pub fn fail_exists(&self, message: impl Into<String>) {
        self.inner.script.lock().exists = Some(Failure::Unavailable(message.into()));
    }

    /// Makes `exists()` fail as if the store answered with `status`.
    pub fn reject_exists(&self, status: u16, message: impl Into<String>) {
        self.inner.script.lock().exists = Some(Failure::Server(status, message.into()));
    }

    /// Makes list queries fail with a server error.
    pub fn fail_list(&self, status: u16, message: impl Into<String>) {
        self.inner.script.lock().list = Some(Failure::Server(status, message.into()));
    }

    /// Makes view queries fail with a server error.
    pub fn fail_view(&self, status: u16, message: impl Into<String>) {
        self.inner.script.lock().view = Some(Failure::Server(status, message.into()));
    }

    /// Makes opening a change feed fail with a server error.
    pub fn fail_changes(&self, status: u16, message: impl Into<String>) {
        self.inner.script.lock().changes = Some(Failure::Server(status, message.into()));
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.calls.lock().clone()
    }

    /// Number of `list` calls.
    pub fn list_calls(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::List { .. }))
    }

    /// Number of `view` calls.
    pub fn view_calls(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::View { .. }))
    }

    /// Number of `changes` calls.
    pub fn changes_calls(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Changes(_)))
    }

    /// Number of feeds whose consumer is still listening.
    pub fn open_feeds(&self) -> usize {
        self.inner
            .feeds
            .lock()
            .iter()
            .filter(|f| !f.is_closed())
            .count()
    }

    /// Pushes a change into every open feed, returning how many accepted it.
    pub fn inject_change(&self, record: ChangeRecord) -> usize {
        self.inject(|| FeedRecord::Change(record.clone()))
    }

    /// Pushes a feed error into every open feed, returning how many accepted it.
    pub fn inject_error(&self, message: impl Into<String>) -> usize {
        let message = message.into();
        self.inject(|| FeedRecord::Error(StoreError::Unavailable(message.clone())))
    }

    fn inject(&self, make: impl Fn() -> FeedRecord) -> usize {
        self.inner
            .feeds
            .lock()
            .iter()
            .filter(|feed| feed.try_send(make()).is_ok())
            .count()
    }

    fn count(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.inner.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: StoreCall) {
        self.inner.calls.lock().push(call);
    }

    async fn delay(&self) {
        let delay = *self.inner.query_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn database(&self) -> &str {
        &self.inner.database
    }

    async fn exists(&self) -> StoreResult<bool> {
        self.record(StoreCall::Exists);
        if let Some(failure) = &self.inner.script.lock().exists {
            return Err(failure.to_error());
        }
        Ok(*self.inner.present.lock())
    }

    async fn list(&self, path: &str, params: &QueryParams) -> StoreResult<Vec<ConfigDocument>> {
        self.record(StoreCall::List {
            path: path.to_string(),
            params: params.clone(),
        });
        self.delay().await;
        if let Some(failure) = &self.inner.script.lock().list {
            return Err(failure.to_error());
        }
        Ok(self.inner.list_rows.lock().clone())
    }

    async fn view(&self, path: &str, params: &QueryParams) -> StoreResult<Vec<ViewRow>> {
        self.record(StoreCall::View {
            path: path.to_string(),
            params: params.clone(),
        });
        self.delay().await;
        if let Some(failure) = &self.inner.script.lock().view {
            return Err(failure.to_error());
        }
        Ok(self.inner.view_rows.lock().clone())
    }

    async fn changes(&self, options: &FeedOptions) -> StoreResult<ChangeStream> {
        self.record(StoreCall::Changes(options.clone()));
        if let Some(failure) = &self.inner.script.lock().changes {
            return Err(failure.to_error());
        }
        let (sender, stream) = ChangeStream::channel();
        self.inner.feeds.lock().push(sender);
        Ok(stream)
    }
}

/// Connector handing out clones of one [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
    refuse: Option<String>,
    endpoints: Arc<Mutex<Vec<Endpoint>>>,
}

impl MemoryConnector {
    /// Creates a connector for `store`.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            refuse: None,
            endpoints: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a connector whose `connect` always fails.
    pub fn refusing(store: MemoryStore, message: impl Into<String>) -> Self {
        Self {
            refuse: Some(message.into()),
            ..Self::new(store)
        }
    }

    /// Endpoints passed to `connect`, in order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.lock().clone()
    }
}

impl Connector for MemoryConnector {
    type Store = MemoryStore;

    fn connect(&self, endpoint: &Endpoint) -> StoreResult<MemoryStore> {
        self.endpoints.lock().push(endpoint.clone());
        match &self.refuse {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(self.store.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str) -> ConfigDocument {
        ConfigDocument::from_value(json!({"_id": id})).unwrap()
    }

    #[tokio::test]
    async fn records_calls_in_order() {
        let store = MemoryStore::new("sites");
        store.exists().await.unwrap();
        store
            .view("app/all", &QueryParams::with_docs(None))
            .await
            .unwrap();
        store.changes(&FeedOptions::new()).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], StoreCall::Exists);
        assert!(matches!(&calls[1], StoreCall::View { path, .. } if path == "app/all"));
        assert_eq!(store.changes_calls(), 1);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let store = MemoryStore::new("sites");
        store.fail_exists("connection refused");
        store.fail_view(500, "view crashed");

        assert!(store.exists().await.unwrap_err().is_transport());
        let err = store
            .view("app/all", &QueryParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn absent_database() {
        let store = MemoryStore::new("sites");
        store.set_present(false);
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn injects_into_open_feeds() {
        let store = MemoryStore::new("sites");
        let mut stream = store.changes(&FeedOptions::new()).await.unwrap();

        assert_eq!(store.inject_change(ChangeRecord::with_doc(doc("a"))), 1);
        assert!(matches!(stream.next().await, Some(FeedRecord::Change(r)) if r.id == "a"));

        drop(stream);
        assert_eq!(store.open_feeds(), 0);
        assert_eq!(store.inject_change(ChangeRecord::with_doc(doc("b"))), 0);
    }

    #[tokio::test]
    async fn view_documents_helper() {
        let store = MemoryStore::new("sites");
        store.set_view_documents(vec![doc("a"), doc("b")]);
        let rows = store.view("app/all", &QueryParams::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id.as_deref(), Some("b"));
    }

    #[test]
    fn refusing_connector() {
        let connector = MemoryConnector::refusing(MemoryStore::new("sites"), "down");
        let result = connector.connect(&Endpoint::new("h", 1, "sites"));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(connector.endpoints().len(), 1);
    }
}
