//! Event channel between a source and its host.

use crate::error::SourceError;
use couchconf_protocol::ConfigDocument;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kinds of events a source emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Documents changed.
    Update,
    /// The change feed failed.
    Error,
}

/// An event delivered to listeners.
#[derive(Debug)]
pub enum SourceEvent {
    /// Changed documents. Feed updates always carry exactly one.
    Update(Vec<ConfigDocument>),
    /// A feed failure.
    Error(SourceError),
}

impl SourceEvent {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            SourceEvent::Update(_) => EventKind::Update,
            SourceEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Identifies a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener callback.
pub type Handler = Arc<dyn Fn(&SourceEvent) + Send + Sync>;

/// Publish/subscribe channel for source events.
///
/// Listeners run synchronously on the emitting task, in registration order.
/// The listener table is not locked while handlers run, so a handler may
/// subscribe or unsubscribe.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, EventKind, Handler)>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SourceEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, kind, Arc::new(handler)));
        id
    }

    /// Removes a registration. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener, _, _)| *listener != id);
        listeners.len() != before
    }

    /// Delivers `event` to every listener of its kind.
    ///
    /// Returns the number of listeners reached; zero is not an error.
    pub fn emit(&self, event: &SourceEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
