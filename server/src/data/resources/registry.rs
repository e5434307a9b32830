use std::collections::BTreeMap;
use std::sync::Arc;

use super::config::{ResourceConfig, ResourceConfigError};

/// Immutable name → resource lookup shared by request handlers
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Arc<ResourceConfig>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration entries keyed by resource name
    pub fn from_configs(
        configs: BTreeMap<String, ResourceConfig>,
    ) -> Result<Self, ResourceConfigError> {
        let mut registry = Self::new();
        for (name, mut config) in configs {
            config.name = name;
            registry.register(config)?;
        }
        Ok(registry)
    }

    /// Validate and add a resource
    pub fn register(&mut self, config: ResourceConfig) -> Result<(), ResourceConfigError> {
        config.validate()?;
        if self.resources.contains_key(&config.name) {
            return Err(ResourceConfigError::DuplicateResource(config.name));
        }
        tracing::debug!(resource = %config, "Registered resource");
        self.resources.insert(config.name.clone(), Arc::new(config));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceConfig>> {
        self.resources.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
