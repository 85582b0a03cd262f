//! The configuration source.

use crate::config::SyncConfig;
use crate::error::{SourceError, SourceResult};
use crate::events::{EventBus, EventKind, SourceEvent, SubscriptionId};
use crate::watcher::{FeedState, FeedWatcher};
use couchconf_protocol::ConfigDocument;
use couchconf_store::{Connector, DocumentStore};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// A CouchDB-backed configuration source.
///
/// Lifecycle: create with [`ConfigSource::new`], register listeners, call
/// [`init`](Self::init) once, then call [`get_services`](Self::get_services)
/// as often as needed. After a successful `init` the change feed forwards
/// every changed document as an `Update` event until it fails; a failure is
/// reported once as an `Error` event and the feed is not reopened.
pub struct ConfigSource<C: Connector> {
    config: SyncConfig,
    connector: C,
    store: OnceLock<Arc<C::Store>>,
    events: Arc<EventBus>,
    feed_state: Arc<RwLock<FeedState>>,
    init_lock: tokio::sync::Mutex<()>,
}

impl<C: Connector> ConfigSource<C> {
    /// Creates an uninitialized source. Nothing is contacted yet.
    pub fn new(config: SyncConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            store: OnceLock::new(),
            events: Arc::new(EventBus::new()),
            feed_state: Arc::new(RwLock::new(FeedState::Idle)),
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Connects, verifies the database and subscribes to the change feed.
    ///
    /// Fails with [`SourceError::Connection`] if the store cannot be reached
    /// or answers the existence check with a failure status (such as 401 or
    /// 500), and with [`SourceError::CollectionNotFound`] if the database is
    /// missing. The source stays uninitialized in these cases and no feed is
    /// opened. If the feed cannot be opened the source is still initialized:
    /// the failure is emitted as an `Error` event and the feed is marked
    /// abandoned.
    pub async fn init(&self) -> SourceResult<()> {
        let _guard = self.init_lock.lock().await;
        if self.store.get().is_some() {
            return Err(SourceError::AlreadyInitialized);
        }

        let database = self.config.database_name();
        info!(
            host = self.config.host(),
            port = self.config.port(),
            database,
            "connecting configuration source"
        );

        let store = self
            .connector
            .connect(&self.config.endpoint())
            .map_err(SourceError::Connection)?;

        match store.exists().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(SourceError::CollectionNotFound {
                    database: database.to_string(),
                })
            }
            Err(e) => return Err(SourceError::Connection(e)),
        }

        let store = Arc::new(store);
        let _ = self.store.set(Arc::clone(&store));
        info!(database, strategy = self.config.strategy().name(), "configuration source initialized");

        let watcher = FeedWatcher::new(Arc::clone(&self.events), Arc::clone(&self.feed_state));
        match store.changes(&self.config.feed_options()).await {
            Ok(stream) => {
                debug!(database, "subscribed to change feed");
                watcher.spawn(stream);
            }
            Err(e) => watcher.abandon(e),
        }

        Ok(())
    }

    /// Fetches the full set of configuration documents.
    ///
    /// Uses the list strategy when a list name is configured and the view
    /// strategy otherwise. Fails with [`SourceError::NotInitialized`] before
    /// any I/O if `init` has not succeeded.
    ///
    /// Being an `async fn`, nothing runs until the returned future is first
    /// polled: the initialization check happens then, not at the call site.
    /// It is still the first thing checked, so an uninitialized source fails
    /// on that first poll without touching the store.
    pub async fn get_services(&self) -> SourceResult<Vec<ConfigDocument>> {
        let store = self.store.get().ok_or(SourceError::NotInitialized)?;
        let strategy = self.config.strategy();
        let documents = strategy.fetch(store.as_ref(), &self.config).await?;
        debug!(
            strategy = strategy.name(),
            count = documents.len(),
            "fetched services"
        );
        Ok(documents)
    }

    /// Registers a raw event listener.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SourceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Registers a listener for changed documents.
    pub fn on_update<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&[ConfigDocument]) + Send + Sync + 'static,
    {
        self.events.subscribe(EventKind::Update, move |event| {
            if let SourceEvent::Update(documents) = event {
                handler(documents);
            }
        })
    }

    /// Registers a listener for feed failures.
    pub fn on_error<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SourceError) + Send + Sync + 'static,
    {
        self.events.subscribe(EventKind::Error, move |event| {
            if let SourceEvent::Error(error) = event {
                handler(error);
            }
        })
    }

    /// The event bus listeners are registered on.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Current state of the change feed.
    pub fn feed_state(&self) -> FeedState {
        *self.feed_state.read()
    }

    /// Returns true once `init` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.store.get().is_some()
    }

    /// The configuration this source was built with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl<C: Connector> std::fmt::Debug for ConfigSource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSource")
            .field("database", &self.config.database_name())
            .field("initialized", &self.is_initialized())
            .field("feed_state", &self.feed_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couchconf_store::{MemoryConnector, MemoryStore, StoreCall};

    fn source(store: &MemoryStore) -> ConfigSource<MemoryConnector> {
        let config = SyncConfig::builder("localhost", 5984, "sites", "app/all")
            .build()
            .unwrap();
        ConfigSource::new(config, MemoryConnector::new(store.clone()))
    }

    #[tokio::test]
    async fn new_source_is_idle() {
        let store = MemoryStore::new("sites");
        let source = source(&store);
        assert!(!source.is_initialized());
        assert_eq!(source.feed_state(), FeedState::Idle);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn init_checks_existence_before_opening_feed() {
        let store = MemoryStore::new("sites");
        let source = source(&store);
        source.init().await.unwrap();

        let calls = store.calls();
        assert_eq!(calls[0], StoreCall::Exists);
        assert!(matches!(calls[1], StoreCall::Changes(_)));
        assert!(source.is_initialized());
        assert_eq!(source.feed_state(), FeedState::Subscribed);
    }

    #[tokio::test]
    async fn second_init_is_rejected() {
        let store = MemoryStore::new("sites");
        let source = source(&store);
        source.init().await.unwrap();
        assert!(matches!(
            source.init().await,
            Err(SourceError::AlreadyInitialized)
        ));
        assert_eq!(store.changes_calls(), 1);
    }

    #[test]
    fn debug_output() {
        let store = MemoryStore::new("sites");
        let text = format!("{:?}", source(&store));
        assert!(text.contains("sites"));
        assert!(text.contains("Idle"));
    }
}
