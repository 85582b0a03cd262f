//! Initial-load query strategies.

use crate::config::SyncConfig;
use crate::error::{SourceError, SourceResult};
use couchconf_protocol::{list_path, ConfigDocument};
use couchconf_store::DocumentStore;
use tracing::{debug, warn};

/// How the full document set is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStrategy {
    /// Run a stored list transform over the view. Rows pass through as the
    /// transform produced them.
    List {
        /// Name of the list function.
        list_name: String,
    },
    /// Query the view directly and take each row's embedded document.
    View,
}

impl QueryStrategy {
    /// Selects the strategy for `config`: List when a list name is set.
    pub fn for_config(config: &SyncConfig) -> Self {
        match config.list_name() {
            Some(list_name) => QueryStrategy::List {
                list_name: list_name.to_string(),
            },
            None => QueryStrategy::View,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            QueryStrategy::List { .. } => "list",
            QueryStrategy::View => "view",
        }
    }

    /// Fetches every configuration document.
    ///
    /// Store failures come back as [`SourceError::Query`] with the store error
    /// untouched and no partial result.
    pub async fn fetch<S>(&self, store: &S, config: &SyncConfig) -> SourceResult<Vec<ConfigDocument>>
    where
        S: DocumentStore + ?Sized,
    {
        match self {
            QueryStrategy::List { list_name } => fetch_list(store, config, list_name).await,
            QueryStrategy::View => fetch_view(store, config).await,
        }
    }
}

async fn fetch_list<S>(store: &S, config: &SyncConfig, list_name: &str) -> SourceResult<Vec<ConfigDocument>>
where
    S: DocumentStore + ?Sized,
{
    let path = list_path(config.query_path(), list_name);
    debug!(%path, "fetching services through list");

    // List output is handed over as-is; ids are not injected here.
    store
        .list(&path, &config.query_params())
        .await
        .map_err(SourceError::Query)
}

async fn fetch_view<S>(store: &S, config: &SyncConfig) -> SourceResult<Vec<ConfigDocument>>
where
    S: DocumentStore + ?Sized,
{
    debug!(path = config.query_path(), "fetching services through view");
    let rows = store
        .view(config.query_path(), &config.query_params())
        .await
        .map_err(SourceError::Query)?;

    let mut documents = Vec::with_capacity(rows.len());
    for row in rows {
        let row_id = row.id.clone();
        match row.into_document() {
            Some(doc) => documents.push(doc),
            None => warn!(row = ?row_id, "view row has no document, skipping"),
        }
    }
    Ok(documents)
}
