//! The module root model: content roots, dependency order and extensions.
//!
//! A module's roots live in a [`layer::ModuleRootLayer`]. Reads go straight
//! to the committed layer; edits go through a modifiable copy that is
//! diffed and pushed back, so unchanged commits cost nothing and fire no
//! events.

pub mod content_entry;
pub mod error;
pub mod extension;
pub mod layer;
pub mod order_entry;

#[cfg(test)]
mod tests;

pub use content_entry::{ContentEntry, ContentFolder, ContentFolderKind};
pub use error::ModuleRootError;
pub use extension::{
    MODULE_EXTENSION_ELEMENT, ModuleExtension, ModuleExtensionProvider, ModuleExtensionProviders,
    extension_state_element,
};
pub use layer::{ModuleRootLayer, ModuleRootListener};
pub use order_entry::{
    DependencyScope, LibraryLevel, OrderEntry, OrderEntryKind, OrderEntryList,
};
