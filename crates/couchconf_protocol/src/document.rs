//! Configuration documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the store's native document identifier.
pub const NATIVE_ID_FIELD: &str = "_id";

/// Field the identifier is copied into for consumers.
pub const ID_FIELD: &str = "id";

/// A single configuration document.
///
/// Documents are arbitrary JSON objects. The only field with meaning to this
/// crate is the native identifier (`_id`), which consumers receive a copy of
/// under `id` once [`inject_id`](Self::inject_id) has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Returns the native identifier, if it is present and a string.
    pub fn native_id(&self) -> Option<&str> {
        self.0.get(NATIVE_ID_FIELD).and_then(Value::as_str)
    }

    /// Returns the consumer-facing identifier, if it is present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Returns a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the document, returning its fields.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consumes the document, returning it as a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Copies the native identifier into `id`.
    ///
    /// Any existing `id` is overwritten. When the native identifier is
    /// missing, `id` is removed rather than left holding a stale value.
    pub fn inject_id(&mut self) {
        match self.0.get(NATIVE_ID_FIELD).cloned() {
            Some(native) => {
                self.0.insert(ID_FIELD.to_string(), native);
            }
            None => {
                self.0.remove(ID_FIELD);
            }
        }
    }

    /// Builder form of [`inject_id`](Self::inject_id).
    pub fn with_injected_id(mut self) -> Self {
        self.inject_id();
        self
    }
}

impl From<Map<String, Value>> for ConfigDocument {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<ConfigDocument> for Value {
    fn from(doc: ConfigDocument) -> Self {
        doc.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(value: Value) -> ConfigDocument {
        ConfigDocument::from_value(value).unwrap()
    }

    #[test]
    fn inject_sets_id_from_native() {
        let mut d = doc(json!({"_id": "site-a", "host": "a.example.com"}));
        d.inject_id();
        assert_eq!(d.id(), Some("site-a"));
        assert_eq!(d.native_id(), Some("site-a"));
        assert_eq!(d.get("host"), Some(&json!("a.example.com")));
    }

    #[test]
    fn inject_overwrites_existing_id() {
        let d = doc(json!({"_id": "real", "id": "stale"})).with_injected_id();
        assert_eq!(d.id(), Some("real"));
    }

    #[test]
    fn inject_without_native_removes_id() {
        let d = doc(json!({"id": "stale", "x": 1})).with_injected_id();
        assert!(d.get(ID_FIELD).is_none());
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(ConfigDocument::from_value(json!([1, 2])).is_none());
        assert!(ConfigDocument::from_value(json!("x")).is_none());
        assert!(ConfigDocument::from_value(Value::Null).is_none());
    }

    #[test]
    fn serializes_as_plain_object() {
        let d = doc(json!({"_id": "a", "n": 2}));
        let text = serde_json::to_string(&d).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json!({"_id": "a", "n": 2}));
    }

    proptest! {
        #[test]
        fn injected_id_always_matches_native(
            native in "[a-z0-9:_-]{1,24}",
            existing in proptest::option::of("[a-z]{0,8}"),
        ) {
            let mut d = ConfigDocument::new();
            d.insert(NATIVE_ID_FIELD, native.clone());
            if let Some(existing) = existing {
                d.insert(ID_FIELD, existing);
            }
            d.inject_id();
            prop_assert_eq!(d.id(), Some(native.as_str()));
        }
    }
}
