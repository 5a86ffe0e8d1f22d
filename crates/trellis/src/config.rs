//! Binder instance map configuration.

use serde::{Deserialize, Serialize};

use crate::instance::BinderInstanceMap;
use crate::registry::BinderRegistry;
use crate::view::ViewBackend;

/// Configuration for a [`BinderInstanceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceMapConfig {
    /// Queue `add`/`remove` requests until
    /// [`do_delay_operations`](BinderInstanceMap::do_delay_operations).
    pub delay_operations: bool,
    /// Refresh new instances whenever their node announces an update.
    pub refresh_on_update: bool,
    /// Start observing the tree when a root model is set.
    pub observe_tree: bool,
}

impl Default for InstanceMapConfig {
    fn default() -> Self {
        Self {
            delay_operations: false,
            refresh_on_update: false,
            observe_tree: true,
        }
    }
}

impl InstanceMapConfig {
    /// Configuration with delayed operations enabled.
    pub fn delayed() -> Self {
        Self {
            delay_operations: true,
            ..Default::default()
        }
    }
}

/// Builder for creating instance maps with custom configuration.
#[derive(Debug, Default)]
pub struct InstanceMapBuilder {
    config: InstanceMapConfig,
}

impl InstanceMapBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: InstanceMapConfig) -> Self {
        Self { config }
    }

    /// Enable or disable delayed operations.
    pub fn delay_operations(mut self, enabled: bool) -> Self {
        self.config.delay_operations = enabled;
        self
    }

    /// Enable or disable refresh on model updates for new instances.
    pub fn refresh_on_update(mut self, enabled: bool) -> Self {
        self.config.refresh_on_update = enabled;
        self
    }

    /// Enable or disable automatic tree observation.
    pub fn observe_tree(mut self, enabled: bool) -> Self {
        self.config.observe_tree = enabled;
        self
    }

    /// Build the instance map.
    pub fn build(self, registry: BinderRegistry, backend: impl ViewBackend + 'static) -> BinderInstanceMap {
        BinderInstanceMap::with_config(registry, backend, self.config)
    }
}
