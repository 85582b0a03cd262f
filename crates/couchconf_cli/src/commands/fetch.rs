//! Fetch command implementation.

use super::document_line;
use couchconf_protocol::ConfigDocument;
use couchconf_source::{ConfigSource, SyncConfig};
use couchconf_store::{Connector, HttpConnector};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Fetch result.
#[derive(Debug, Serialize)]
pub struct FetchResult {
    /// Database the services came from.
    pub database: String,
    /// Query strategy used (list, view).
    pub strategy: &'static str,
    /// Number of documents.
    pub count: usize,
    /// The documents, in store order.
    pub services: Vec<ConfigDocument>,
}

/// Runs the fetch command.
pub async fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::load(path)?;
    let result = fetch(config, HttpConnector).await?;

    render(&result, format, &mut std::io::stdout())?;
    Ok(())
}

/// Initializes a source and loads its services once.
pub async fn fetch<C: Connector>(
    config: SyncConfig,
    connector: C,
) -> Result<FetchResult, Box<dyn std::error::Error>> {
    let database = config.database_name().to_string();
    let strategy = config.strategy().name();

    let source = ConfigSource::new(config, connector);
    source.init().await?;
    let services = source.get_services().await?;

    Ok(FetchResult {
        database,
        strategy,
        count: services.len(),
        services,
    })
}

/// Writes `result` as pretty JSON or as text lines.
pub fn render(
    result: &FetchResult,
    format: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => {
            writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
        }
        _ => {
            writeln!(out, "Database: {}", result.database)?;
            writeln!(out, "Strategy: {}", result.strategy)?;
            writeln!(out, "Services: {}", result.count)?;
            for doc in &result.services {
                writeln!(out, "  {}", document_line(doc))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use couchconf_store::{MemoryConnector, MemoryStore};
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new("sites");
        store.set_view_documents(vec![
            ConfigDocument::from_value(json!({"_id": "alpha", "port": 80})).unwrap(),
        ]);
        store
    }

    fn config() -> SyncConfig {
        SyncConfig::builder("localhost", 5984, "sites", "app/all")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn fetch_loads_services() {
        let result = fetch(config(), MemoryConnector::new(store())).await.unwrap();
        assert_eq!(result.database, "sites");
        assert_eq!(result.strategy, "view");
        assert_eq!(result.count, 1);
        assert_eq!(result.services[0].id(), Some("alpha"));
    }

    #[tokio::test]
    async fn fetch_reports_missing_database() {
        let store = store();
        store.set_present(false);
        let err = fetch(config(), MemoryConnector::new(store)).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn render_text_and_json() {
        let result = fetch(config(), MemoryConnector::new(store())).await.unwrap();

        let mut text = Vec::new();
        render(&result, "text", &mut text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("Strategy: view"));
        assert!(text.contains("  alpha\t"));

        let mut out = Vec::new();
        render(&result, "json", &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["count"], json!(1));
        assert_eq!(value["services"][0]["id"], json!("alpha"));
    }

    #[tokio::test]
    async fn run_reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "", "port": 5984}}"#).unwrap();

        let err = run(file.path(), "text").await.unwrap_err();
        assert!(err.to_string().contains("missing option host"));
    }
}
