//! Dependency-graph and platform-version validation.

use std::collections::HashSet;

use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::version::BuildNumber;

/// Pluggable platform-version compatibility policy.
pub trait PluginVersionValidator {
    /// True when the descriptor may load on this platform build.
    fn validate_version(&self, descriptor: &PluginDescriptor) -> bool;
}

/// Policy that accepts every descriptor.
#[derive(Debug, Default)]
pub struct AcceptAllVersions;

impl PluginVersionValidator for AcceptAllVersions {
    fn validate_version(&self, _descriptor: &PluginDescriptor) -> bool {
        true
    }
}

/// Build-number policy: a plugin is rejected only when it targets a
/// different platform build and neither side is a snapshot. Unparseable or
/// absent build targets are accepted.
#[derive(Debug)]
pub struct BuildNumberValidator {
    build: BuildNumber,
}

impl BuildNumberValidator {
    pub fn new(build: BuildNumber) -> Self {
        Self { build }
    }
}

impl PluginVersionValidator for BuildNumberValidator {
    fn validate_version(&self, descriptor: &PluginDescriptor) -> bool {
        let Some(platform_version) = descriptor.platform_version() else {
            return true;
        };
        if platform_version.is_empty() {
            return true;
        }
        let Ok(plugin_build) = platform_version.parse::<BuildNumber>() else {
            return true;
        };
        if self.build.is_snapshot() || plugin_build.is_snapshot() {
            return true;
        }
        self.build == plugin_build
    }
}

pub fn is_incompatible(descriptor: &PluginDescriptor, validator: &dyn PluginVersionValidator) -> bool {
    !validator.validate_version(descriptor)
}

/// Walks the hard (non-optional) dependency closure of `descriptor` depth
/// first, invoking `check` exactly once per reachable dependency id.
///
/// Returns `false` as soon as `check` rejects an id; the walk does not
/// continue past a rejection. Cycles terminate through the processed set.
/// A dependency the resolver cannot produce a descriptor for is still
/// checked, but nothing is descended into; tolerating such holes is the
/// caller's decision, expressed through `check`.
pub fn check_dependants<'a>(
    descriptor: &PluginDescriptor,
    resolver: &dyn Fn(&PluginId) -> Option<&'a PluginDescriptor>,
    check: &mut dyn FnMut(&PluginId) -> bool,
) -> bool {
    let mut processed = HashSet::new();
    processed.insert(descriptor.id().clone());
    check_dependants_inner(descriptor, resolver, check, &mut processed)
}

fn check_dependants_inner<'a>(
    descriptor: &PluginDescriptor,
    resolver: &dyn Fn(&PluginId) -> Option<&'a PluginDescriptor>,
    check: &mut dyn FnMut(&PluginId) -> bool,
    processed: &mut HashSet<PluginId>,
) -> bool {
    for dependency in descriptor.dependencies() {
        if processed.contains(dependency) || descriptor.is_optional_dependency(dependency) {
            continue;
        }
        processed.insert(dependency.clone());
        if !check(dependency) {
            return false;
        }
        if let Some(dependency_descriptor) = resolver(dependency) {
            if !check_dependants_inner(dependency_descriptor, resolver, check, processed) {
                return false;
            }
        }
    }
    true
}
