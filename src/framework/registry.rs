//! Explicit plugin registry.
//!
//! A plain name → factory catalog populated by an explicit initialization
//! list, so plugin availability never depends on module import side effects
//! or registration order.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, PrefixCacheConfig};
use crate::prefix::{ModelPrefixStore, PrefixCachePlugin, PREFIX_CACHE_PLUGIN_NAME};

use super::plugin::Scorer;

/// Errors building a scorer from the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no scoring plugin registered under name: {0}")]
    UnknownPlugin(String),

    #[error("invalid plugin configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds a scorer from its raw (JSON) configuration.
pub type ScorerFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Scorer>, RegistryError> + Send + Sync>;

/// Catalog of available scoring plugins.
pub struct PluginRegistry {
    factories: HashMap<String, ScorerFactory>,
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with every built-in scorer.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            PREFIX_CACHE_PLUGIN_NAME,
            Box::new(|raw| {
                let config: PrefixCacheConfig = serde_json::from_value(raw.clone())
                    .map_err(|e| RegistryError::InvalidConfig(e.to_string()))?;
                let store = Arc::new(ModelPrefixStore::new(config.store.clone()));
                let plugin = PrefixCachePlugin::new(&config, store)?;
                Ok(Arc::new(plugin) as Arc<dyn Scorer>)
            }),
        );
        registry
    }

    /// Register a factory under `name`, replacing any existing entry.
    pub fn register(&mut self, name: impl Into<String>, factory: ScorerFactory) {
        let name = name.into();
        debug!(plugin = %name, "registered scoring plugin");
        self.factories.insert(name, factory);
    }

    /// Build the named scorer from its raw configuration.
    pub fn build(
        &self,
        name: &str,
        config: &serde_json::Value,
    ) -> Result<Arc<dyn Scorer>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownPlugin(name.to_string()))?;
        factory(config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered plugin names, sorted for stable reporting.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_prefix_cache() {
        let registry = PluginRegistry::with_builtins();
        assert!(registry.contains(PREFIX_CACHE_PLUGIN_NAME));
        assert_eq!(registry.names(), vec![PREFIX_CACHE_PLUGIN_NAME]);
    }

    #[test]
    fn builds_prefix_cache_by_name() {
        let registry = PluginRegistry::with_builtins();
        let scorer = registry
            .build(PREFIX_CACHE_PLUGIN_NAME, &serde_json::json!({}))
            .expect("builtin config is valid");
        assert_eq!(scorer.name(), PREFIX_CACHE_PLUGIN_NAME);
    }

    #[test]
    fn unknown_plugin_is_an_error() {
        let registry = PluginRegistry::with_builtins();
        let err = registry
            .build("no-such-plugin", &serde_json::json!({}))
            .err()
            .expect("expected build to fail");
        assert!(matches!(err, RegistryError::UnknownPlugin(_)));
    }

    #[test]
    fn invalid_config_fails_build() {
        let registry = PluginRegistry::with_builtins();
        let err = registry
            .build(PREFIX_CACHE_PLUGIN_NAME, &serde_json::json!({"block_size": 0}))
            .err()
            .expect("expected build to fail");
        assert!(matches!(err, RegistryError::Config(_)));
    }
}
