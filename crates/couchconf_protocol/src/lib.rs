//! # couchconf protocol
//!
//! Data types shared between the document-store client and the
//! configuration source.
//!
//! This crate provides:
//! - `ConfigDocument` with identifier injection from the native `_id`
//! - `ViewRow` and `ChangeRecord` as returned by the store
//! - `QueryParams` and `FeedOptions` for list/view queries and the change feed
//! - Design-document path helpers
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod document;
mod error;
mod params;
mod path;
mod rows;

pub use change::{parse_feed_line, ChangeEvent, ChangeRecord, FeedLine};
pub use document::{ConfigDocument, ID_FIELD, NATIVE_ID_FIELD};
pub use error::{ProtocolError, ProtocolResult};
pub use params::{FeedOptions, QueryParams, SINCE_NOW};
pub use path::{list_path, DesignPath};
pub use rows::{ViewResponse, ViewRow};
