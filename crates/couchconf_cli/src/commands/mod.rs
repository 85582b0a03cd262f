//! CLI command implementations.

pub mod fetch;
pub mod watch;

use couchconf_protocol::ConfigDocument;

/// Formats one document as `<id>\t<json>`, using `-` when it has no id.
pub fn document_line(doc: &ConfigDocument) -> String {
    let id = doc.id().or(doc.native_id()).unwrap_or("-");
    let body = serde_json::to_string(doc).unwrap_or_else(|_| "{}".to_string());
    format!("{id}\t{body}")
}
