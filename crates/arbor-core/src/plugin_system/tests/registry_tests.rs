#![cfg(test)]

use std::collections::HashMap;
use std::sync::Arc;

use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::registry::PluginRegistry;

fn descriptors(ids: &[&str]) -> Vec<Arc<PluginDescriptor>> {
    ids.iter()
        .map(|id| Arc::new(PluginDescriptor::builder(*id).build()))
        .collect()
}

#[test]
fn test_initialize_and_query() {
    let registry = PluginRegistry::new();
    assert!(!registry.is_initialized());
    assert!(registry.plugins().is_empty());

    registry.initialize(descriptors(&["a", "b"]));
    assert!(registry.is_initialized());
    assert_eq!(registry.plugin_count(), 2);
    assert!(registry.find_plugin(&PluginId::from("a")).is_some());
    assert!(registry.find_plugin(&PluginId::from("missing")).is_none());
    assert_eq!(registry.enabled_plugin_ids().len(), 2);
}

#[test]
#[should_panic(expected = "already initialized")]
fn test_double_initialize_is_a_contract_violation() {
    let registry = PluginRegistry::new();
    registry.initialize(descriptors(&["a"]));
    registry.initialize(descriptors(&["b"]));
}

#[test]
#[should_panic(expected = "before initialization")]
fn test_load_order_query_before_publication_panics() {
    let registry = PluginRegistry::new();
    registry.plugin_load_order(&PluginId::from("a"));
}

#[test]
fn test_load_order_positions() {
    let registry = PluginRegistry::new();
    let mut order = HashMap::new();
    order.insert(PluginId::from("a"), 0);
    order.insert(PluginId::from("b"), 1);
    registry.set_plugin_load_order(order);

    assert_eq!(registry.plugin_load_order(&PluginId::from("a")), Some(0));
    assert_eq!(registry.plugin_load_order(&PluginId::from("b")), Some(1));
    assert_eq!(registry.plugin_load_order(&PluginId::from("unknown")), None);
}

#[test]
#[should_panic(expected = "already set")]
fn test_double_load_order_is_a_contract_violation() {
    let registry = PluginRegistry::new();
    registry.set_plugin_load_order(HashMap::new());
    registry.set_plugin_load_order(HashMap::new());
}
