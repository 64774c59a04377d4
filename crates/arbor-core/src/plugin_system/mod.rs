//! Plugin descriptor loading, validation and the published plugin set.
//!
//! The lifecycle runs in three stages. Discovery
//! ([`loader::PluginLoader::load_all`]) turns plugin directories into
//! [`descriptor::PluginDescriptor`] values. Filtering and ordering
//! ([`loader::initialize_plugins`]) applies the disabled list, the platform
//! version policy and the hard-dependency checks, then computes a
//! deterministic dependency-sorted load order. The outcome is published
//! once into a [`registry::PluginRegistry`] shared for the rest of the
//! process lifetime.

pub mod bean;
pub mod classpath;
pub mod descriptor;
pub mod disabled;
pub mod error;
pub mod loader;
pub mod permissions;
pub mod registry;
pub mod validator;
pub mod version;

#[cfg(test)]
mod tests;

pub use bean::PluginBean;
pub use classpath::{ClassPathItem, ClassPathPluginSet};
pub use descriptor::{BASE_PLUGIN_ID, PluginDescriptor, PluginId, PluginStatus, PluginVendor};
pub use disabled::DisabledPlugins;
pub use error::PluginSystemError;
pub use loader::{PluginLoader, PluginsInitializeInfo, initialize_plugins, load_descriptor};
pub use permissions::{PluginPermissionDescriptor, PluginPermissionType};
pub use registry::PluginRegistry;
pub use validator::{
    AcceptAllVersions, BuildNumberValidator, PluginVersionValidator, check_dependants,
};
pub use version::{BuildNumber, compare_version_numbers};
