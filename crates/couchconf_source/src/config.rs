//! Configuration for a configuration source.

use crate::error::ConfigError;
use crate::strategy::QueryStrategy;
use couchconf_protocol::{FeedOptions, QueryParams};
use couchconf_store::Endpoint;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Validated connection and query configuration.
///
/// Built once through [`SyncConfig::builder`] or loaded from JSON, and never
/// mutated afterwards. Every accessor hands out borrowed or derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    host: String,
    port: u16,
    database_name: String,
    query_path: String,
    list_name: Option<String>,
    keys: Option<Vec<Value>>,
    filter: Option<String>,
    extra: Map<String, Value>,
}

impl SyncConfig {
    /// Starts a configuration with the required options.
    pub fn builder(
        host: impl Into<String>,
        port: u16,
        database_name: impl Into<String>,
        query_path: impl Into<String>,
    ) -> SyncConfigBuilder {
        SyncConfigBuilder {
            host: host.into(),
            port,
            database_name: database_name.into(),
            query_path: query_path.into(),
            list_name: None,
            keys: None,
            filter: None,
            extra: Map::new(),
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// Accepts snake_case keys as well as `databaseName`, `view`, `list` and
    /// `extraConf`. `list`, `keys` and `filter` may also sit inside
    /// `extraConf`; a top-level value wins, and the nested one is removed
    /// from the connection options either way.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        raw.into_builder()?.build()
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Store host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Store port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Database holding the configuration documents.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// View path (`ddoc/view`).
    pub fn query_path(&self) -> &str {
        &self.query_path
    }

    /// List transform name; selects the list strategy when set.
    pub fn list_name(&self) -> Option<&str> {
        self.list_name.as_deref()
    }

    /// Keys restricting queries and the change feed.
    pub fn keys(&self) -> Option<&[Value]> {
        self.keys.as_deref()
    }

    /// Server-side change-feed filter.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Connection-level options passed to the connector.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// The query strategy this configuration selects.
    pub fn strategy(&self) -> QueryStrategy {
        QueryStrategy::for_config(self)
    }

    /// Endpoint for the connector.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.host, self.port, &self.database_name).with_options(self.extra.clone())
    }

    /// Parameters for the initial list or view query.
    pub fn query_params(&self) -> QueryParams {
        QueryParams::with_docs(self.keys())
    }

    /// Options for the change feed.
    pub fn feed_options(&self) -> FeedOptions {
        let mut options = FeedOptions::new();
        if let Some(filter) = &self.filter {
            options = options.with_filter(filter);
        }
        if let Some(keys) = &self.keys {
            options = options.with_keys(keys);
        }
        options
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug, Clone)]
pub struct SyncConfigBuilder {
    host: String,
    port: u16,
    database_name: String,
    query_path: String,
    list_name: Option<String>,
    keys: Option<Vec<Value>>,
    filter: Option<String>,
    extra: Map<String, Value>,
}

impl SyncConfigBuilder {
    /// Sets the list transform name.
    pub fn with_list_name(mut self, list_name: impl Into<String>) -> Self {
        self.list_name = Some(list_name.into());
        self
    }

    /// Sets the keys restricting queries and the change feed.
    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the change-feed filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Replaces the connection-level options.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Sets one connection-level option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingOption("host"));
        }
        if self.port == 0 {
            return Err(ConfigError::MissingOption("port"));
        }
        if self.database_name.is_empty() {
            return Err(ConfigError::MissingOption("database_name"));
        }
        if self.query_path.is_empty() {
            return Err(ConfigError::MissingOption("query_path"));
        }
        if self.list_name.as_deref() == Some("") {
            return Err(ConfigError::InvalidOption {
                option: "list_name",
                reason: "must not be empty".into(),
            });
        }
        if self.filter.as_deref() == Some("") {
            return Err(ConfigError::InvalidOption {
                option: "filter",
                reason: "must not be empty".into(),
            });
        }

        Ok(SyncConfig {
            host: self.host,
            port: self.port,
            database_name: self.database_name,
            query_path: self.query_path,
            list_name: self.list_name,
            keys: self.keys,
            filter: self.filter,
            extra: self.extra,
        })
    }
}

/// On-disk shape; missing required fields default to empty so validation
/// reports them by name.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    host: String,
    #[serde(default)]
    port: u16,
    #[serde(default, alias = "databaseName")]
    database_name: String,
    #[serde(default, alias = "view")]
    query_path: String,
    #[serde(default, alias = "list")]
    list_name: Option<String>,
    #[serde(default)]
    keys: Option<Vec<Value>>,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default, alias = "extraConf")]
    extra: Map<String, Value>,
}

impl RawConfig {
    fn into_builder(mut self) -> Result<SyncConfigBuilder, ConfigError> {
        let nested_list = take_nested(&mut self.extra, "list", "list_name")?;
        let nested_keys = take_nested(&mut self.extra, "keys", "keys")?;
        let nested_filter = take_nested(&mut self.extra, "filter", "filter")?;

        Ok(SyncConfigBuilder {
            host: self.host,
            port: self.port,
            database_name: self.database_name,
            query_path: self.query_path,
            list_name: self.list_name.or(nested_list),
            keys: self.keys.or(nested_keys),
            filter: self.filter.or(nested_filter),
            extra: self.extra,
        })
    }
}

/// Removes `key` from the connection options and decodes it.
fn take_nested<T: DeserializeOwned>(
    extra: &mut Map<String, Value>,
    key: &str,
    option: &'static str,
) -> Result<Option<T>, ConfigError> {
    match extra.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ConfigError::InvalidOption {
                option,
                reason: e.to_string(),
            }),
    }
}
