#![cfg(test)]

use crate::module_roots::order_entry::{
    DependencyScope, LibraryLevel, OrderEntry, OrderEntryKind, OrderEntryList,
};
use crate::utils::xml;

fn round_trip(entry: &OrderEntry) -> OrderEntry {
    OrderEntry::read_external(&entry.write_external()).expect("entry should read back")
}

#[test]
fn test_module_source_round_trip() {
    let entry = OrderEntry::module_source();
    assert!(round_trip(&entry).is_equivalent_to(&entry));
}

#[test]
fn test_module_entry_round_trip() {
    let mut entry = OrderEntry::module("util");
    entry.set_exported(true);
    entry.set_scope(DependencyScope::Test);
    let read = round_trip(&entry);
    assert!(read.is_equivalent_to(&entry));
    assert!(read.is_exported());
    assert_eq!(read.scope(), DependencyScope::Test);
}

#[test]
fn test_library_entry_round_trip() {
    let entry = OrderEntry::library("log4j", LibraryLevel::Application);
    let read = round_trip(&entry);
    assert!(read.is_equivalent_to(&entry));
    match read.kind() {
        OrderEntryKind::Library { library_name, level } => {
            assert_eq!(library_name, "log4j");
            assert_eq!(*level, LibraryLevel::Application);
        }
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn test_sdk_entry_round_trip() {
    let named = round_trip(&OrderEntry::sdk(Some("jdk-17".to_string())));
    assert_eq!(
        named.kind(),
        &OrderEntryKind::Sdk {
            sdk_name: Some("jdk-17".to_string())
        }
    );
    let inherited = round_trip(&OrderEntry::sdk(None));
    assert_eq!(inherited.kind(), &OrderEntryKind::Sdk { sdk_name: None });
}

#[test]
fn test_default_scope_is_not_written() {
    let entry = OrderEntry::module("util");
    let element = entry.write_external();
    assert!(xml::attr(&element, "scope").is_none());
    assert!(xml::attr(&element, "exported").is_none());
}

#[test]
fn test_unknown_entry_type_is_skipped() {
    let element = xml::parse_bytes(br#"<orderEntry type="starship"/>"#).expect("parse");
    assert!(OrderEntry::read_external(&element).is_none());
}

#[test]
fn test_entry_without_type_is_skipped() {
    let element = xml::parse_bytes(b"<orderEntry/>").expect("parse");
    assert!(OrderEntry::read_external(&element).is_none());
}

#[test]
fn test_clones_keep_the_entry_id() {
    let entry = OrderEntry::module("util");
    assert_eq!(entry.clone().entry_id(), entry.entry_id());
}

#[test]
fn test_entries_get_distinct_ids() {
    assert_ne!(
        OrderEntry::module("a").entry_id(),
        OrderEntry::module("a").entry_id()
    );
}

#[test]
fn test_equivalence_ignores_identity() {
    let a = OrderEntry::library("x", LibraryLevel::Project);
    let b = OrderEntry::library("x", LibraryLevel::Project);
    assert!(a.is_equivalent_to(&b));
    let mut c = OrderEntry::library("x", LibraryLevel::Project);
    c.set_exported(true);
    assert!(!a.is_equivalent_to(&c));
}

#[test]
fn test_list_restamps_indices_on_mutation() {
    let mut list = OrderEntryList::new();
    list.push(OrderEntry::module("a"));
    list.push(OrderEntry::module("b"));
    list.push(OrderEntry::module("c"));
    assert_eq!(
        list.iter().map(OrderEntry::index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    list.insert(1, OrderEntry::module("d"));
    assert_eq!(
        list.iter().map(OrderEntry::index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );

    let removed = list.remove(0);
    assert_eq!(removed.presentable_name(), "a");
    assert_eq!(
        list.iter().map(OrderEntry::index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(list.as_slice()[0].presentable_name(), "d");
}

#[test]
fn test_remove_by_entry_id() {
    let mut list = OrderEntryList::new();
    list.push(OrderEntry::module("a"));
    let target = OrderEntry::module("b");
    let target_id = target.entry_id();
    list.push(target);

    assert!(list.remove_entry(target_id).is_some());
    assert!(list.remove_entry(target_id).is_none());
    assert_eq!(list.len(), 1);
}
