//! View query rows.

use crate::document::ConfigDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a view query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Identifier of the document that emitted the row.
    #[serde(default)]
    pub id: Option<String>,
    /// Emitted key.
    #[serde(default)]
    pub key: Value,
    /// Emitted value.
    #[serde(default)]
    pub value: Value,
    /// Embedded document (present when queried with `include_docs`).
    #[serde(default)]
    pub doc: Option<ConfigDocument>,
}

impl ViewRow {
    /// Creates a row carrying an embedded document, keyed by its native id.
    pub fn with_doc(doc: ConfigDocument) -> Self {
        let id = doc.native_id().map(str::to_string);
        Self {
            key: id.clone().map(Value::String).unwrap_or(Value::Null),
            id,
            value: Value::Null,
            doc: Some(doc),
        }
    }

    /// Takes the embedded document with `id` injected from the native identifier.
    ///
    /// Returns `None` for rows without an embedded document.
    pub fn into_document(self) -> Option<ConfigDocument> {
        self.doc.map(ConfigDocument::with_injected_id)
    }
}

/// Full body of a view query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    /// Number of rows in the whole index.
    #[serde(default)]
    pub total_rows: Option<u64>,
    /// Offset of the first returned row.
    #[serde(default)]
    pub offset: Option<u64>,
    /// Returned rows, in index order.
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_view_response() {
        let body = json!({
            "total_rows": 2,
            "offset": 0,
            "rows": [
                {"id": "a", "key": "a", "value": null, "doc": {"_id": "a", "_rev": "1-x", "port": 80}},
                {"id": "b", "key": "b", "value": {"rev": "1-y"}, "doc": null}
            ]
        });
        let response: ViewResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.total_rows, Some(2));
        assert_eq!(response.rows.len(), 2);
        assert!(response.rows[0].doc.is_some());
        assert!(response.rows[1].doc.is_none());
    }

    #[test]
    fn into_document_injects_id() {
        let row: ViewRow = serde_json::from_value(json!({
            "id": "a",
            "key": "a",
            "doc": {"_id": "a", "id": "other"}
        }))
        .unwrap();
        let doc = row.into_document().unwrap();
        assert_eq!(doc.id(), Some("a"));
    }

    #[test]
    fn into_document_without_doc() {
        let row = ViewRow {
            id: Some("gone".into()),
            ..Default::default()
        };
        assert!(row.into_document().is_none());
    }
}
