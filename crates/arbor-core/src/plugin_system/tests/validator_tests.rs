#![cfg(test)]

use std::collections::HashMap;

use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::validator::{
    BuildNumberValidator, PluginVersionValidator, check_dependants, is_incompatible,
};
use crate::plugin_system::version::BuildNumber;

fn resolver_over<'a>(
    descriptors: &'a [PluginDescriptor],
) -> impl Fn(&PluginId) -> Option<&'a PluginDescriptor> + 'a {
    let by_id: HashMap<&PluginId, &PluginDescriptor> = descriptors
        .iter()
        .map(|descriptor| (descriptor.id(), descriptor))
        .collect();
    move |id| by_id.get(id).copied()
}

#[test]
fn test_missing_dependency_is_still_checked_but_not_descended() {
    let descriptor = PluginDescriptor::builder("root").depends("absent").build();
    let mut checked = Vec::new();
    let ok = check_dependants(&descriptor, &|_| None, &mut |id| {
        checked.push(id.clone());
        true
    });
    assert!(ok);
    assert!(checked.contains(&PluginId::from("absent")));
}

#[test]
fn test_rejection_stops_the_walk() {
    let a = PluginDescriptor::builder("a").depends("b").depends("c").build();
    let b = PluginDescriptor::builder("b").build();
    let c = PluginDescriptor::builder("c").build();
    let all = vec![b, c];
    let resolver = resolver_over(&all);

    let mut checked = Vec::new();
    let ok = check_dependants(&a, &|id| resolver(id), &mut |id| {
        checked.push(id.clone());
        id != &PluginId::from("b")
    });
    assert!(!ok);
    // "b" is rejected first; neither "c" nor the platform get a turn
    assert_eq!(checked, vec![PluginId::from("b")]);
}

#[test]
fn test_cycle_terminates_and_checks_each_id_once() {
    let a = PluginDescriptor::builder("a").depends("b").build();
    let b = PluginDescriptor::builder("b").depends("a").build();
    let all = vec![a, b];
    let resolver = resolver_over(&all);

    let mut counts: HashMap<PluginId, usize> = HashMap::new();
    let ok = check_dependants(&all[0], &|id| resolver(id), &mut |id| {
        *counts.entry(id.clone()).or_default() += 1;
        true
    });
    assert!(ok);
    for (id, count) in &counts {
        assert_eq!(*count, 1, "{id} checked more than once");
    }
    assert!(counts.contains_key(&PluginId::from("b")));
    assert!(!counts.contains_key(&PluginId::from("a")));
}

#[test]
fn test_diamond_checks_shared_dependency_once() {
    let a = PluginDescriptor::builder("a").depends("b").depends("c").build();
    let b = PluginDescriptor::builder("b").depends("d").build();
    let c = PluginDescriptor::builder("c").depends("d").build();
    let d = PluginDescriptor::builder("d").build();
    let all = vec![b, c, d];
    let resolver = resolver_over(&all);

    let mut counts: HashMap<PluginId, usize> = HashMap::new();
    let ok = check_dependants(&a, &|id| resolver(id), &mut |id| {
        *counts.entry(id.clone()).or_default() += 1;
        true
    });
    assert!(ok);
    assert_eq!(counts.get(&PluginId::from("d")), Some(&1));
}

#[test]
fn test_optional_dependencies_are_skipped() {
    let descriptor = PluginDescriptor::builder("root")
        .depends("hard")
        .depends_optionally("soft")
        .build();
    let mut checked = Vec::new();
    let ok = check_dependants(&descriptor, &|_| None, &mut |id| {
        checked.push(id.clone());
        true
    });
    assert!(ok);
    assert!(checked.contains(&PluginId::from("hard")));
    assert!(!checked.contains(&PluginId::from("soft")));
}

#[test]
fn test_build_number_validator() {
    let validator = BuildNumberValidator::new(BuildNumber::Release(100));

    let no_target = PluginDescriptor::builder("a").build();
    assert!(!is_incompatible(&no_target, &validator));

    let same_build = PluginDescriptor::builder("b").platform_version("100").build();
    assert!(!is_incompatible(&same_build, &validator));

    let other_build = PluginDescriptor::builder("c").platform_version("99").build();
    assert!(is_incompatible(&other_build, &validator));

    let snapshot_plugin = PluginDescriptor::builder("d")
        .platform_version("SNAPSHOT")
        .build();
    assert!(!is_incompatible(&snapshot_plugin, &validator));

    let unparseable = PluginDescriptor::builder("e")
        .platform_version("not-a-build")
        .build();
    assert!(!is_incompatible(&unparseable, &validator));
}

#[test]
fn test_snapshot_platform_accepts_everything() {
    let validator = BuildNumberValidator::new(BuildNumber::Snapshot);
    let descriptor = PluginDescriptor::builder("a").platform_version("99").build();
    assert!(validator.validate_version(&descriptor));
}
