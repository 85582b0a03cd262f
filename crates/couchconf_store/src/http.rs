//! HTTP implementation against the CouchDB REST API.

use crate::endpoint::{Credentials, Endpoint};
use crate::error::{StoreError, StoreResult};
use crate::feed::{ChangeStream, FeedRecord, FeedSender};
use crate::store::{Connector, DocumentStore};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use couchconf_protocol::{
    parse_feed_line, ConfigDocument, DesignPath, FeedLine, FeedOptions, QueryParams, ViewResponse,
    ViewRow,
};
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Heartbeat interval requested for continuous feeds, in milliseconds.
pub const HEARTBEAT_MS: u64 = 30_000;

/// Connector producing [`HttpStore`] handles.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector;

impl HttpConnector {
    /// Creates a new HTTP connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for HttpConnector {
    type Store = HttpStore;

    fn connect(&self, endpoint: &Endpoint) -> StoreResult<HttpStore> {
        if endpoint.host.is_empty() {
            return Err(StoreError::InvalidEndpoint("empty host".into()));
        }
        if endpoint.database.is_empty() {
            return Err(StoreError::InvalidEndpoint("empty database name".into()));
        }

        // No client-wide timeout: it would also cut the long-lived feed body.
        let client = Client::builder().build()?;

        Ok(HttpStore {
            client,
            base_url: endpoint.base_url(),
            database: endpoint.database.clone(),
            credentials: endpoint.credentials(),
            timeout: endpoint.timeout(),
        })
    }
}

/// A database handle backed by the CouchDB HTTP API.
pub struct HttpStore {
    client: Client,
    base_url: String,
    database: String,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl HttpStore {
    /// Returns the database URL.
    pub fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(&self.database))
    }

    fn design_url(&self, path: &DesignPath) -> String {
        let mut url = self.database_url();
        for segment in path.segments() {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        builder
    }

    fn bounded_request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.request(method, url);
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn query<T: DeserializeOwned>(&self, url: &str, params: &QueryParams) -> StoreResult<T> {
        let builder = match params.keys_body() {
            Some(body) => self.bounded_request(Method::POST, url).json(&body),
            None => self.bounded_request(Method::GET, url),
        };

        let response = builder.query(&params.query_pairs()).send().await?;
        handle_response(response).await
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    fn database(&self) -> &str {
        &self.database
    }

    async fn exists(&self) -> StoreResult<bool> {
        let response = self
            .bounded_request(Method::GET, &self.database_url())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::server(status.as_u16(), body))
            }
        }
    }

    async fn list(&self, path: &str, params: &QueryParams) -> StoreResult<Vec<ConfigDocument>> {
        let url = self.design_url(&DesignPath::parse_list(path)?);
        debug!(%url, "list query");
        self.query(&url, params).await
    }

    async fn view(&self, path: &str, params: &QueryParams) -> StoreResult<Vec<ViewRow>> {
        let url = self.design_url(&DesignPath::parse_view(path)?);
        debug!(%url, "view query");
        let response: ViewResponse = self.query(&url, params).await?;
        Ok(response.rows)
    }

    async fn changes(&self, options: &FeedOptions) -> StoreResult<ChangeStream> {
        let url = format!("{}/_changes", self.database_url());
        let mut pairs = vec![
            ("feed".to_string(), "continuous".to_string()),
            ("heartbeat".to_string(), HEARTBEAT_MS.to_string()),
        ];
        pairs.extend(options.query_pairs());

        let response = self.request(Method::GET, &url).query(&pairs).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::server(status.as_u16(), body));
        }

        debug!(database = %self.database, "change feed opened");
        let (sender, stream) = ChangeStream::channel();
        tokio::spawn(pump_feed(response, sender));
        Ok(stream)
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::server(status.as_u16(), body));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Reads a continuous feed body line by line into `sender`.
///
/// Stops after the first error record, or when the consumer goes away.
async fn pump_feed(response: Response, sender: FeedSender) {
    let mut body = response.bytes_stream();
    let mut buffer = BytesMut::new();

    loop {
        let chunk = match body.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                warn!(error = %e, "change feed body failed");
                let _ = sender.send(FeedRecord::Error(e.into())).await;
                return;
            }
            None => {
                let _ = sender.send(FeedRecord::Error(StoreError::FeedClosed)).await;
                return;
            }
        };

        buffer.extend_from_slice(&chunk);
        for line in drain_lines(&mut buffer) {
            let record = match parse_feed_line(&line) {
                Ok(None) => continue,
                Ok(Some(FeedLine::Change(record))) => FeedRecord::Change(record),
                Ok(Some(FeedLine::End { last_seq })) => {
                    debug!(%last_seq, "server ended change feed");
                    FeedRecord::Error(StoreError::FeedClosed)
                }
                Err(e) => FeedRecord::Error(e.into()),
            };

            let terminal = matches!(record, FeedRecord::Error(_));
            if sender.send(record).await.is_err() {
                debug!("change feed consumer dropped");
                return;
            }
            if terminal {
                return;
            }
        }
    }
}

/// Splits complete `\n`-terminated lines off the front of `buffer`.
fn drain_lines(buffer: &mut BytesMut) -> Vec<Bytes> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let mut line = buffer.split_to(pos + 1);
        line.truncate(pos);
        lines.push(line.freeze());
    }
    lines
}
