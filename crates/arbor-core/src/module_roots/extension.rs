//! Module extensions: pluggable per-module facets with independent state.
//!
//! Extensions persist under `<module-extension id="...">` elements inside a
//! layer. The set of known providers is fixed at startup through an explicit
//! [`ModuleExtensionProviders`] registry; layers index their extension slots
//! by provider registration index. State whose provider id is unknown in
//! this product configuration is carried verbatim by the layer and written
//! back untouched.

use std::any::Any;
use std::collections::HashMap;

use xmltree::Element;

use crate::contract;

pub const MODULE_EXTENSION_ELEMENT: &str = "module-extension";
pub const EXTENSION_ID_ATTR: &str = "id";

/// A per-module facet with persistable state.
///
/// `state` must return an element named [`MODULE_EXTENSION_ELEMENT`] whose
/// [`EXTENSION_ID_ATTR`] equals the provider id, or `None` when the
/// extension is at its default and nothing should be written.
pub trait ModuleExtension: Any + Send {
    /// Provider id this extension persists under.
    fn id(&self) -> &str;

    /// Disabled extensions keep state but do not participate in queries.
    fn is_enabled(&self) -> bool;

    fn load_state(&mut self, element: &Element);

    fn state(&self) -> Option<Element>;

    /// True when this extension's state differs from `other`'s.
    fn is_modified(&self, other: &dyn ModuleExtension) -> bool;

    /// Takes over `other`'s state.
    fn commit(&mut self, other: &dyn ModuleExtension);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creates the skeleton of a state element for [`ModuleExtension::state`]
/// implementations.
pub fn extension_state_element(id: &str) -> Element {
    let mut element = Element::new(MODULE_EXTENSION_ELEMENT);
    element
        .attributes
        .insert(EXTENSION_ID_ATTR.to_string(), id.to_string());
    element
}

type ExtensionFactory = dyn Fn() -> Box<dyn ModuleExtension> + Send + Sync;

/// One registered extension provider.
pub struct ModuleExtensionProvider {
    id: String,
    index: usize,
    factory: Box<ExtensionFactory>,
}

impl ModuleExtensionProvider {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registration index; slot position inside every layer.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn create_extension(&self) -> Box<dyn ModuleExtension> {
        (self.factory)()
    }
}

/// Registry of all extension providers of the running product. Built once
/// at startup and shared, immutable from then on.
#[derive(Default)]
pub struct ModuleExtensionProviders {
    providers: Vec<ModuleExtensionProvider>,
    by_id: HashMap<String, usize>,
}

impl ModuleExtensionProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider. Duplicate ids are a caller error; the first
    /// registration stays in effect.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn() -> Box<dyn ModuleExtension> + Send + Sync + 'static,
    ) {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            contract::violation(&format!("module extension provider '{id}' is already registered"));
            return;
        }
        let index = self.providers.len();
        self.by_id.insert(id.clone(), index);
        self.providers.push(ModuleExtensionProvider {
            id,
            index,
            factory: Box::new(factory),
        });
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn providers(&self) -> &[ModuleExtensionProvider] {
        &self.providers
    }

    pub fn find(&self, id: &str) -> Option<&ModuleExtensionProvider> {
        self.by_id.get(id).map(|&index| &self.providers[index])
    }
}
