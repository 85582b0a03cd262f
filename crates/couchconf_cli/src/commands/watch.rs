//! Watch command implementation.

use super::document_line;
use couchconf_protocol::ConfigDocument;
use couchconf_source::{ConfigPlugin, PluginHost, SyncConfig};
use couchconf_store::{Connector, HttpConnector};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Event forwarded from source listeners to the printing loop.
#[derive(Debug)]
enum WatchEvent {
    Update(Vec<ConfigDocument>),
    Failed(String),
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The shutdown signal fired.
    Interrupted,
    /// The change feed failed.
    FeedFailed(String),
}

/// Runs the watch command until ctrl-c or a feed failure.
pub async fn run(path: &Path, namespace: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::load(path)?;
    let outcome = watch(
        config,
        HttpConnector,
        namespace,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
        &mut std::io::stdout(),
    )
    .await?;

    match outcome {
        WatchOutcome::Interrupted => Ok(()),
        WatchOutcome::FeedFailed(message) => Err(message.into()),
    }
}

/// Attaches and initializes a source, prints its services, then prints
/// every update until `shutdown` resolves or the feed fails.
pub async fn watch<C, F>(
    config: SyncConfig,
    connector: C,
    namespace: &str,
    shutdown: F,
    out: &mut impl Write,
) -> Result<WatchOutcome, Box<dyn std::error::Error>>
where
    C: Connector,
    F: Future<Output = ()>,
{
    let mut host = PluginHost::new();
    let plugin = ConfigPlugin::new(namespace);
    let source = plugin.attach(&mut host, config, connector);

    let (sender, mut events) = mpsc::unbounded_channel();
    let updates = sender.clone();
    source.on_update(move |docs| {
        let _ = updates.send(WatchEvent::Update(docs.to_vec()));
    });
    source.on_error(move |e| {
        let _ = sender.send(WatchEvent::Failed(e.to_string()));
    });

    plugin.init(&host).await?;
    let services = source.get_services().await?;
    info!(namespace, count = services.len(), "loaded services");
    for doc in &services {
        writeln!(out, "{}", document_line(doc))?;
    }
    out.flush()?;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                return Ok(WatchOutcome::Interrupted);
            }
            event = events.recv() => match event {
                Some(WatchEvent::Update(docs)) => {
                    for doc in &docs {
                        writeln!(out, "update\t{}", document_line(doc))?;
                    }
                    out.flush()?;
                }
                Some(WatchEvent::Failed(message)) => {
                    error!(%message, "watch stopped");
                    return Ok(WatchOutcome::FeedFailed(message));
                }
                // The source owns both senders and outlives this loop.
                None => return Ok(WatchOutcome::Interrupted),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couchconf_protocol::ChangeRecord;
    use couchconf_store::{MemoryConnector, MemoryStore};
    use serde_json::json;
    use std::time::Duration;

    fn doc(value: serde_json::Value) -> ConfigDocument {
        ConfigDocument::from_value(value).unwrap()
    }

    fn config() -> SyncConfig {
        SyncConfig::builder("localhost", 5984, "sites", "app/all")
            .build()
            .unwrap()
    }

    /// Waits for the feed to open, then injects `change` followed by `error`.
    fn drive(store: MemoryStore, change: ChangeRecord, error: &'static str) {
        tokio::spawn(async move {
            while store.open_feeds() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            store.inject_change(change);
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.inject_error(error);
        });
    }

    #[tokio::test]
    async fn prints_services_and_updates_until_feed_fails() {
        let store = MemoryStore::new("sites");
        store.set_view_documents(vec![doc(json!({"_id": "alpha"}))]);
        drive(
            store.clone(),
            ChangeRecord::with_doc(doc(json!({"_id": "beta", "port": 81}))),
            "connection reset",
        );

        let mut out = Vec::new();
        let outcome = watch(
            config(),
            MemoryConnector::new(store),
            "settings",
            std::future::pending::<()>(),
            &mut out,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, WatchOutcome::FeedFailed(ref m) if m.contains("connection reset")));
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alpha\t"));
        assert!(lines[1].starts_with("update\tbeta\t"));
    }

    #[tokio::test]
    async fn shutdown_ends_watch() {
        let store = MemoryStore::new("sites");
        let mut out = Vec::new();
        let outcome = watch(
            config(),
            MemoryConnector::new(store),
            "settings",
            async {},
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(outcome, WatchOutcome::Interrupted);
    }

    #[tokio::test]
    async fn init_failure_is_returned() {
        let store = MemoryStore::new("sites");
        store.set_present(false);
        let mut out = Vec::new();
        let err = watch(
            config(),
            MemoryConnector::new(store),
            "settings",
            async {},
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(out.is_empty());
    }
}
