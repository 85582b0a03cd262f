//! Change-feed records.

use crate::document::ConfigDocument;
use crate::error::ProtocolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw change notification as delivered by the store's change feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Opaque update sequence of the change.
    #[serde(default)]
    pub seq: Value,
    /// Identifier of the changed document.
    #[serde(default)]
    pub id: String,
    /// Whether the change is a deletion.
    #[serde(default)]
    pub deleted: bool,
    /// Snapshot of the document after the change (with `include_docs`).
    #[serde(default)]
    pub doc: Option<ConfigDocument>,
}

impl ChangeRecord {
    /// Creates a change record carrying a document snapshot.
    pub fn with_doc(doc: ConfigDocument) -> Self {
        Self {
            seq: Value::Null,
            id: doc.native_id().unwrap_or_default().to_string(),
            deleted: false,
            doc: Some(doc),
        }
    }
}

/// A change normalized for consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The changed document, with `id` injected.
    pub document: ConfigDocument,
}

impl ChangeEvent {
    /// Builds an event from a raw change record.
    ///
    /// Returns `None` when the record carries no document snapshot.
    pub fn from_record(record: ChangeRecord) -> Option<Self> {
        record.doc.map(|doc| Self {
            document: doc.with_injected_id(),
        })
    }

    /// Consumes the event, returning the document.
    pub fn into_document(self) -> ConfigDocument {
        self.document
    }
}

/// One line of a continuous change feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedLine {
    /// A change notification.
    Change(ChangeRecord),
    /// The server closed the feed, reporting its last sequence.
    End {
        /// Last sequence sent before closing.
        last_seq: Value,
    },
}

/// Parses one line of a continuous change feed.
///
/// Blank lines are heartbeats and yield `Ok(None)`.
pub fn parse_feed_line(line: &[u8]) -> ProtocolResult<Option<FeedLine>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(line)?;
    if let Some(last_seq) = value.get("last_seq") {
        return Ok(Some(FeedLine::End {
            last_seq: last_seq.clone(),
        }));
    }

    let record: ChangeRecord = serde_json::from_value(value)?;
    Ok(Some(FeedLine::Change(record)))
}
