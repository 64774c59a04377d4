//! # Arbor Core
//!
//! Core of the Arbor platform: plugin descriptor loading with dependency
//! validation and classpath assembly, and the copy-on-write module root
//! model that backs project configuration.
//!
//! The two subsystems are independent; hosts typically boot the plugin
//! system once ([`plugin_system::initialize_plugins`]) and then create and
//! edit [`module_roots::ModuleRootLayer`] values per module for the rest of
//! the session.

mod contract;

pub mod error;
pub mod module_roots;
pub mod plugin_system;
pub mod progress;
pub mod utils;

pub use error::{Error, Result};
pub use module_roots::{ModuleExtension, ModuleRootLayer};
pub use plugin_system::{PluginDescriptor, PluginId, PluginLoader, PluginRegistry};
