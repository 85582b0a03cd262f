//! Binding of configuration sources into a host application.

use crate::config::SyncConfig;
use crate::error::{SourceError, SourceResult};
use crate::source::ConfigSource;
use couchconf_store::Connector;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Namespace a plugin attaches under when none is given.
pub const DEFAULT_NAMESPACE: &str = "externalConfig";

/// Registry of configuration sources keyed by namespace.
pub struct PluginHost<C: Connector> {
    sources: HashMap<String, Arc<ConfigSource<C>>>,
}

impl<C: Connector> PluginHost<C> {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Returns the source attached under `namespace`.
    pub fn get(&self, namespace: &str) -> Option<&Arc<ConfigSource<C>>> {
        self.sources.get(namespace)
    }

    /// Attached namespaces, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of attached sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<C: Connector> Default for PluginHost<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> std::fmt::Debug for PluginHost<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("namespaces", &self.namespaces())
            .finish()
    }
}

/// Attaches a [`ConfigSource`] to a [`PluginHost`] and initializes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPlugin {
    namespace: String,
}

impl ConfigPlugin {
    /// Creates a plugin attaching under `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The namespace this plugin attaches under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Builds an uninitialized source and registers it on `host`.
    ///
    /// A source already attached under the same namespace is replaced.
    pub fn attach<C: Connector>(
        &self,
        host: &mut PluginHost<C>,
        config: SyncConfig,
        connector: C,
    ) -> Arc<ConfigSource<C>> {
        let source = Arc::new(ConfigSource::new(config, connector));
        debug!(namespace = %self.namespace, "attaching configuration source");
        host.sources
            .insert(self.namespace.clone(), Arc::clone(&source));
        source
    }

    /// Initializes the source attached under this plugin's namespace.
    ///
    /// Fails with [`SourceError::NotAttached`] if `attach` was not called,
    /// otherwise with whatever [`ConfigSource::init`] reports.
    pub async fn init<C: Connector>(
        &self,
        host: &PluginHost<C>,
    ) -> SourceResult<Arc<ConfigSource<C>>> {
        let source = host
            .get(&self.namespace)
            .cloned()
            .ok_or_else(|| SourceError::NotAttached(self.namespace.clone()))?;
        source.init().await?;
        Ok(source)
    }
}

impl Default for ConfigPlugin {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couchconf_store::{MemoryConnector, MemoryStore};

    fn config() -> SyncConfig {
        SyncConfig::builder("localhost", 5984, "sites", "app/all")
            .build()
            .unwrap()
    }

    #[test]
    fn default_namespace() {
        assert_eq!(ConfigPlugin::default().namespace(), "externalConfig");
    }

    #[test]
    fn attach_registers_uninitialized_source() {
        let store = MemoryStore::new("sites");
        let mut host = PluginHost::new();
        let source = ConfigPlugin::default().attach(&mut host, config(), MemoryConnector::new(store.clone()));

        assert!(!source.is_initialized());
        assert_eq!(host.namespaces(), vec!["externalConfig"]);
        assert!(Arc::ptr_eq(host.get("externalConfig").unwrap(), &source));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn init_without_attach() {
        let host: PluginHost<MemoryConnector> = PluginHost::new();
        let err = ConfigPlugin::new("settings").init(&host).await.unwrap_err();
        assert!(matches!(err, SourceError::NotAttached(ref ns) if ns == "settings"));
    }

    #[tokio::test]
    async fn init_initializes_attached_source() {
        let store = MemoryStore::new("sites");
        let mut host = PluginHost::new();
        let plugin = ConfigPlugin::new("settings");
        plugin.attach(&mut host, config(), MemoryConnector::new(store));

        let source = plugin.init(&host).await.unwrap();
        assert!(source.is_initialized());
        assert!(host.get("settings").unwrap().is_initialized());
    }

    #[tokio::test]
    async fn init_failure_propagates() {
        let store = MemoryStore::new("sites");
        store.set_present(false);
        let mut host = PluginHost::new();
        let plugin = ConfigPlugin::default();
        plugin.attach(&mut host, config(), MemoryConnector::new(store));

        let err = plugin.init(&host).await.unwrap_err();
        assert!(matches!(err, SourceError::CollectionNotFound { .. }));
    }
}
