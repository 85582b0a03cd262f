//! Change-feed watcher.

use crate::error::SourceError;
use crate::events::{EventBus, SourceEvent};
use couchconf_protocol::{ChangeEvent, ChangeRecord};
use couchconf_store::{ChangeStream, FeedRecord, StoreError};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// State of a source's change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No feed has been opened yet.
    Idle,
    /// Changes are being forwarded.
    Subscribed,
    /// The feed failed and nothing more will be forwarded. Terminal.
    Abandoned,
}

impl FeedState {
    /// Returns true if changes are being forwarded.
    pub fn is_subscribed(&self) -> bool {
        matches!(self, FeedState::Subscribed)
    }
}

/// Forwards a change feed to an [`EventBus`].
///
/// Each change becomes one `Update` event carrying a single document. The
/// first feed error becomes one `Error` event, after which the watcher
/// stops reading: there is no retry and no reconnect.
pub struct FeedWatcher {
    events: Arc<EventBus>,
    state: Arc<RwLock<FeedState>>,
}

impl FeedWatcher {
    /// Creates a watcher publishing to `events` and tracking `state`.
    pub fn new(events: Arc<EventBus>, state: Arc<RwLock<FeedState>>) -> Self {
        Self { events, state }
    }

    /// Marks the feed subscribed and starts forwarding on a new task.
    pub fn spawn(self, stream: ChangeStream) -> JoinHandle<()> {
        *self.state.write() = FeedState::Subscribed;
        tokio::spawn(self.run(stream))
    }

    /// Forwards changes until the feed fails.
    pub async fn run(self, mut stream: ChangeStream) {
        *self.state.write() = FeedState::Subscribed;

        while let Some(record) = stream.next().await {
            match record {
                FeedRecord::Change(change) => self.forward(change),
                FeedRecord::Error(e) => {
                    self.abandon(e);
                    return;
                }
            }
        }

        // Every sender went away without reporting an error.
        self.abandon(StoreError::FeedClosed);
    }

    /// Reports `error` and marks the feed abandoned.
    pub fn abandon(&self, error: StoreError) {
        warn!(error = %error, "change feed failed, no longer forwarding changes");
        *self.state.write() = FeedState::Abandoned;
        self.events
            .emit(&SourceEvent::Error(SourceError::Feed(error)));
    }

    fn forward(&self, change: ChangeRecord) {
        let id = change.id.clone();
        match ChangeEvent::from_record(change) {
            Some(event) => {
                debug!(%id, "forwarding change");
                self.events
                    .emit(&SourceEvent::Update(vec![event.into_document()]));
            }
            None => warn!(%id, "change without document, skipping"),
        }
    }
}
