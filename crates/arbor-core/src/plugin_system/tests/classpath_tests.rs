#![cfg(test)]

use std::collections::HashSet;
use std::fs;

use tempfile::tempdir;

use crate::plugin_system::classpath::{ClassPathItem, ClassPathPluginSet, parse_requires};
use crate::plugin_system::descriptor::PluginId;
use crate::plugin_system::loader::load_descriptor;

fn ids(names: &[&str]) -> Vec<PluginId> {
    names.iter().map(|name| PluginId::from(*name)).collect()
}

fn enabled(names: &[&str]) -> HashSet<PluginId> {
    names.iter().map(|name| PluginId::from(*name)).collect()
}

#[test]
fn test_plugin_set_requires_every_member() {
    let set = ClassPathPluginSet::new(ids(&["p1", "p2"]));
    assert!(set.accept(&enabled(&["p1", "p2", "p3"])));
    assert!(!set.accept(&enabled(&["p1"])));
    assert!(!set.accept(&enabled(&[])));
}

#[test]
fn test_item_without_sets_is_always_visible() {
    let item = ClassPathItem::new("lib/core.jar".into(), Vec::new());
    assert!(item.accept(&enabled(&[])));
    assert!(item.accept(&enabled(&["anything"])));
}

#[test]
fn test_item_accepts_when_any_set_is_satisfied() {
    let item = ClassPathItem::new(
        "lib/bridge.jar".into(),
        vec![
            ClassPathPluginSet::new(ids(&["p1"])),
            ClassPathPluginSet::new(ids(&["p2", "p3"])),
        ],
    );
    assert!(item.accept(&enabled(&["p1"])));
    assert!(item.accept(&enabled(&["p2", "p3"])));
    assert!(!item.accept(&enabled(&["p2"])));
    assert!(!item.accept(&enabled(&[])));
}

#[test]
fn test_growing_the_enabled_set_never_hides_archives() {
    let items = vec![
        ClassPathItem::new("a.jar".into(), Vec::new()),
        ClassPathItem::new("b.jar".into(), vec![ClassPathPluginSet::new(ids(&["p1"]))]),
        ClassPathItem::new(
            "c.jar".into(),
            vec![ClassPathPluginSet::new(ids(&["p1", "p2"]))],
        ),
    ];
    let sets = [
        enabled(&[]),
        enabled(&["p1"]),
        enabled(&["p1", "p2"]),
        enabled(&["p1", "p2", "p3"]),
    ];
    for window in sets.windows(2) {
        let smaller: Vec<_> = items.iter().filter(|item| item.accept(&window[0])).collect();
        let larger: Vec<_> = items.iter().filter(|item| item.accept(&window[1])).collect();
        for item in smaller {
            assert!(larger.contains(&item));
        }
    }
}

#[test]
fn test_parse_requires_with_groups() {
    let sets = parse_requires(
        br#"<requires>
            <plugins><plugin>p1</plugin><plugin>p2</plugin></plugins>
            <plugins><plugin>p3</plugin></plugins>
        </requires>"#,
    )
    .expect("sidecar should parse");
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].ids(), ids(&["p1", "p2"]).as_slice());
    assert_eq!(sets[1].ids(), ids(&["p3"]).as_slice());
}

#[test]
fn test_parse_requires_bare_plugins_root() {
    let sets = parse_requires(b"<plugins><plugin>p1</plugin></plugins>")
        .expect("sidecar should parse");
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].ids(), ids(&["p1"]).as_slice());
}

#[test]
fn test_parse_requires_rejects_malformed_xml() {
    assert!(parse_requires(b"<plugins><plugin>p1").is_err());
}

#[test]
fn test_requires_sidecar_gates_jar_visibility() {
    let dir = tempdir().expect("tempdir");
    let plugin_root = dir.path().join("demo.plugin");
    let meta_inf = plugin_root.join("META-INF");
    let lib = plugin_root.join("lib");
    fs::create_dir_all(&meta_inf).expect("mkdir");
    fs::create_dir_all(&lib).expect("mkdir");
    fs::write(
        meta_inf.join("plugin.xml"),
        "<plugin><id>demo.plugin</id></plugin>",
    )
    .expect("write descriptor");
    fs::write(lib.join("foo.jar"), b"jar-bytes").expect("write jar");
    fs::write(
        lib.join("foo.jar.requires"),
        "<plugins><plugin>p1</plugin></plugins>",
    )
    .expect("write sidecar");

    let descriptor = load_descriptor(&plugin_root, false).expect("plugin should load");

    let visible = descriptor.get_class_path(&enabled(&["p1"]));
    assert_eq!(visible, vec![lib.join("foo.jar")]);

    let hidden = descriptor.get_class_path(&enabled(&[]));
    assert!(hidden.is_empty());
}

#[test]
fn test_class_path_items_are_computed_once() {
    let dir = tempdir().expect("tempdir");
    let plugin_root = dir.path().join("demo.plugin");
    let meta_inf = plugin_root.join("META-INF");
    let lib = plugin_root.join("lib");
    fs::create_dir_all(&meta_inf).expect("mkdir");
    fs::create_dir_all(&lib).expect("mkdir");
    fs::write(
        meta_inf.join("plugin.xml"),
        "<plugin><id>demo.plugin</id></plugin>",
    )
    .expect("write descriptor");
    fs::write(lib.join("a.jar"), b"jar-bytes").expect("write jar");

    let descriptor = load_descriptor(&plugin_root, false).expect("plugin should load");
    assert_eq!(descriptor.class_path_items().len(), 1);

    // a later disk change must not be observed by the cached item list
    fs::write(lib.join("b.jar"), b"jar-bytes").expect("write jar");
    assert_eq!(descriptor.class_path_items().len(), 1);
}
