//! # couchconf store
//!
//! The document-store boundary used by the configuration source.
//!
//! This crate provides:
//! - `DocumentStore`: existence check, list and view queries, change feed
//! - `Connector`: opens a store handle for an `Endpoint`
//! - `ChangeStream`: the receiving end of a change feed
//! - `HttpConnector` / `HttpStore`: CouchDB REST implementation over `reqwest`
//! - `MemoryConnector` / `MemoryStore`: scriptable in-memory store for tests
//!
//! ## Architecture
//!
//! Stores are opened once and then only read from, so every method takes
//! `&self` and handles can be shared behind an `Arc` between the initial
//! load and the feed watcher. A change feed is a bounded channel: the store
//! pushes `FeedRecord`s from its own task and the consumer drains them.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod endpoint;
mod error;
mod feed;
mod http;
mod memory;
mod store;

pub use endpoint::{Credentials, Endpoint};
pub use error::{StoreError, StoreResult};
pub use feed::{ChangeStream, FeedRecord, FeedSender, FEED_BUFFER};
pub use http::{HttpConnector, HttpStore, HEARTBEAT_MS};
pub use memory::{MemoryConnector, MemoryStore, StoreCall};
pub use store::{Connector, DocumentStore};
