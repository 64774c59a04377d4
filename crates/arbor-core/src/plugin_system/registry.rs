//! Process-wide registry of loaded plugin descriptors.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use crate::contract;
use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};

/// Publish-once holder for the final plugin set and its load order.
///
/// The host constructs one registry, hands it to the boot pipeline, and
/// shares it from then on. Both slots are written exactly once; a second
/// write is a caller error that leaves the published value untouched.
/// Reading the load order before it is published is fatal, since any
/// ordering answer invented at that point would be silently wrong.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: OnceLock<Vec<Arc<PluginDescriptor>>>,
    load_order: OnceLock<HashMap<PluginId, usize>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the final descriptor list.
    pub fn initialize(&self, plugins: Vec<Arc<PluginDescriptor>>) {
        if self.plugins.set(plugins).is_err() {
            contract::violation("plugin registry is already initialized");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.plugins.get().is_some()
    }

    /// All published descriptors, enabled or not. Empty before publication.
    pub fn plugins(&self) -> &[Arc<PluginDescriptor>] {
        self.plugins.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins().len()
    }

    pub fn find_plugin(&self, id: &PluginId) -> Option<&Arc<PluginDescriptor>> {
        self.plugins().iter().find(|descriptor| descriptor.id() == id)
    }

    pub fn is_plugin_loaded(&self, id: &PluginId) -> bool {
        self.find_plugin(id).is_some_and(|descriptor| descriptor.is_loaded())
    }

    pub fn enabled_plugin_ids(&self) -> HashSet<PluginId> {
        self.plugins()
            .iter()
            .filter(|descriptor| descriptor.is_enabled())
            .map(|descriptor| descriptor.id().clone())
            .collect()
    }

    /// Publishes the dependency-sorted boot order.
    pub fn set_plugin_load_order(&self, order: HashMap<PluginId, usize>) {
        if self.load_order.set(order).is_err() {
            contract::violation("plugin load order is already set");
        }
    }

    /// Position of a plugin in the boot order, `None` for unknown ids.
    ///
    /// # Panics
    ///
    /// Panics when the load order has not been published yet.
    pub fn plugin_load_order(&self, id: &PluginId) -> Option<usize> {
        let Some(order) = self.load_order.get() else {
            panic!("plugin load order queried before initialization");
        };
        order.get(id).copied()
    }
}
