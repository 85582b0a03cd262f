//! Connection endpoint.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Username/password pair for basic authentication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Where and how to connect to a database.
///
/// `options` is an opaque, connector-specific mapping. The HTTP connector
/// reads `secure`, `auth` and `timeout_secs` from it and ignores the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Database to select.
    pub database: String,
    /// Connection-level options.
    pub options: Map<String, Value>,
}

impl Endpoint {
    /// Creates an endpoint with no extra options.
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            options: Map::new(),
        }
    }

    /// Sets the connection-level options.
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Whether to connect over TLS (`secure: true`).
    pub fn secure(&self) -> bool {
        self.options
            .get("secure")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Basic-auth credentials from `auth: {username, password}`.
    pub fn credentials(&self) -> Option<Credentials> {
        self.options
            .get("auth")
            .and_then(|auth| serde_json::from_value(auth.clone()).ok())
    }

    /// Per-request timeout from `timeout_secs`.
    pub fn timeout(&self) -> Option<Duration> {
        self.options
            .get("timeout_secs")
            .and_then(Value::as_u64)
            .map(Duration::from_secs)
    }

    /// Base URL of the server, without the database.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure() { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}
