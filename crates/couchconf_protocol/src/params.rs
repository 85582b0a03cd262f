//! Query and change-feed parameters.

use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Sequence marker that starts a feed at the current head of the database.
pub const SINCE_NOW: &str = "now";

/// Parameters for list and view queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Embed full documents in the result rows.
    pub include_docs: bool,
    /// Restrict the query to these keys, in this order.
    pub keys: Option<Vec<Value>>,
}

impl QueryParams {
    /// Creates parameters that embed documents, optionally restricted to `keys`.
    pub fn with_docs(keys: Option<&[Value]>) -> Self {
        Self {
            include_docs: true,
            keys: keys.map(<[Value]>::to_vec),
        }
    }

    /// Query-string pairs for the request URL.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.include_docs {
            pairs.push(("include_docs", "true".to_string()));
        }
        pairs
    }

    /// Request body carrying the key set, if keys are configured.
    pub fn keys_body(&self) -> Option<Value> {
        self.keys.as_ref().map(|keys| json!({ "keys": keys }))
    }
}

/// Options for opening a change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOptions {
    /// Sequence to start from.
    pub since: String,
    /// Embed full documents in each change.
    pub include_docs: bool,
    /// Server-side filter function (`ddoc/filter`).
    pub filter: Option<String>,
    /// Extra query parameters passed through to the filter.
    pub query_params: BTreeMap<String, String>,
}

impl FeedOptions {
    /// Creates the baseline options: start now, embed documents.
    pub fn new() -> Self {
        Self {
            since: SINCE_NOW.to_string(),
            include_docs: true,
            filter: None,
            query_params: BTreeMap::new(),
        }
    }

    /// Sets the server-side filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Attaches a key set as a JSON-serialized `keys` query parameter.
    pub fn with_keys(mut self, keys: &[Value]) -> Self {
        self.query_params
            .insert("keys".to_string(), Value::Array(keys.to_vec()).to_string());
        self
    }

    /// Query-string pairs for the feed request, excluding transport-level
    /// parameters such as the feed mode.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("since".to_string(), self.since.clone()),
            ("include_docs".to_string(), self.include_docs.to_string()),
        ];
        if let Some(filter) = &self.filter {
            pairs.push(("filter".to_string(), filter.clone()));
        }
        pairs.extend(
            self.query_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_with_docs() {
        let params = QueryParams::with_docs(None);
        assert!(params.include_docs);
        assert!(params.keys.is_none());
        assert_eq!(params.query_pairs(), vec![("include_docs", "true".to_string())]);
        assert!(params.keys_body().is_none());
    }

    #[test]
    fn query_params_keys_body() {
        let keys = vec![json!("a"), json!("b")];
        let params = QueryParams::with_docs(Some(&keys));
        assert_eq!(params.keys_body(), Some(json!({"keys": ["a", "b"]})));
    }

    #[test]
    fn feed_options_baseline() {
        let options = FeedOptions::new();
        assert_eq!(options.since, SINCE_NOW);
        assert!(options.include_docs);
        assert_eq!(
            options.query_pairs(),
            vec![
                ("since".to_string(), "now".to_string()),
                ("include_docs".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn feed_options_filter_and_keys() {
        let options = FeedOptions::new()
            .with_filter("app/sites")
            .with_keys(&[json!("a"), json!("b")]);

        assert_eq!(options.filter.as_deref(), Some("app/sites"));
        assert_eq!(
            options.query_params.get("keys").map(String::as_str),
            Some(r#"["a","b"]"#)
        );

        let pairs = options.query_pairs();
        assert!(pairs.contains(&("filter".to_string(), "app/sites".to_string())));
        assert!(pairs.contains(&("keys".to_string(), r#"["a","b"]"#.to_string())));
    }
}
