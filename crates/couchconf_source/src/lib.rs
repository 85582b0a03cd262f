//! # couchconf source
//!
//! CouchDB-backed configuration source for long-running services.
//!
//! This crate provides:
//! - Validated connection and query configuration
//! - Initial load through a stored list transform or a plain view
//! - Live change feed forwarded as update events
//! - Event bus for update and error listeners
//! - Plugin binding into a host under a namespace
//!
//! ## Architecture
//!
//! A [`ConfigSource`] owns a [`SyncConfig`] and a store
//! [`Connector`](couchconf_store::Connector). `init` connects, checks that the
//! database exists and opens the change feed; a [`FeedWatcher`] task then
//! turns each change into an `Update` event carrying one document.
//! `get_services` fetches the full document set with the [`QueryStrategy`]
//! the configuration selects.
//!
//! ## Key Invariants
//!
//! - No query runs before `init` has succeeded
//! - The change feed starts at "now"; earlier changes are never replayed
//! - Every view document and every change document carries `id` equal to `_id`
//! - List output is passed through untouched
//! - A feed failure is reported once and the feed is not reopened

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod events;
mod plugin;
mod source;
mod strategy;
mod watcher;

pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::{ConfigError, SourceError, SourceResult};
pub use events::{EventBus, EventKind, Handler, SourceEvent, SubscriptionId};
pub use plugin::{ConfigPlugin, PluginHost, DEFAULT_NAMESPACE};
pub use source::ConfigSource;
pub use strategy::QueryStrategy;
pub use watcher::{FeedState, FeedWatcher};
