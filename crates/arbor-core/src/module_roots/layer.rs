//! The module root layer: one complete root configuration of a module.
//!
//! A layer owns three kinds of state: content entries keyed and ordered by
//! their root URL, the ordered list of order entries, and one extension slot
//! per registered provider. Editing follows a copy-on-write discipline: the
//! committed layer is read through directly, a modifiable copy is produced
//! with [`ModuleRootLayer::new_modifiable`], edited, and pushed back with
//! [`ModuleRootLayer::copy`], which reports whether anything changed so the
//! host can skip no-op commits and their notifications.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use xmltree::{Element, XMLNode};

use crate::contract;
use crate::module_roots::content_entry::{ContentEntry, ContentFolderKind};
use crate::module_roots::error::ModuleRootError;
use crate::module_roots::extension::{
    EXTENSION_ID_ATTR, MODULE_EXTENSION_ELEMENT, ModuleExtension, ModuleExtensionProviders,
};
use crate::module_roots::order_entry::{
    LibraryLevel, ORDER_ENTRY_ELEMENT, OrderEntry, OrderEntryKind, OrderEntryList,
};
use crate::progress::ProgressIndicator;
use crate::utils::xml;

const PROGRESS_CHECK_INTERVAL: usize = 10;

/// Receives change notifications while a modifiable layer is pushed back
/// into its committed counterpart.
pub trait ModuleRootListener {
    fn before_extension_changed(&self, _extension_id: &str) {}

    /// Content or order entries changed.
    fn root_set_changed(&self) {}
}

pub struct ModuleRootLayer {
    content: BTreeMap<String, ContentEntry>,
    order: OrderEntryList,
    extensions: Vec<Option<Box<dyn ModuleExtension>>>,
    /// State of extensions this product does not know, carried verbatim.
    unknown_extensions: Vec<Element>,
    providers: Arc<ModuleExtensionProviders>,
    writable: bool,
    disposed: bool,
}

impl ModuleRootLayer {
    /// Fresh writable layer: provider-created extensions, a single
    /// module-source order entry and no content.
    pub fn new(providers: Arc<ModuleExtensionProviders>) -> Self {
        let mut layer = Self {
            content: BTreeMap::new(),
            order: OrderEntryList::new(),
            extensions: Vec::new(),
            unknown_extensions: Vec::new(),
            providers,
            writable: true,
            disposed: false,
        };
        layer.init();
        layer
    }

    fn init(&mut self) {
        self.order.clear();
        self.extensions = self
            .providers
            .providers()
            .iter()
            .map(|provider| Some(provider.create_extension()))
            .collect();
        self.order.push(OrderEntry::module_source());
    }

    /// Deep, independent, writable copy of `original`. Entry identities are
    /// preserved so a later [`copy`](Self::copy) back can match entries.
    pub fn new_modifiable(original: &ModuleRootLayer) -> Self {
        let extensions = original
            .providers
            .providers()
            .iter()
            .map(|provider| {
                let mut extension = provider.create_extension();
                if let Some(source) = original.extensions.get(provider.index()).and_then(Option::as_ref)
                {
                    extension.commit(source.as_ref());
                }
                Some(extension)
            })
            .collect();
        Self {
            content: original.content.clone(),
            order: {
                let mut order = OrderEntryList::new();
                order.replace_all(original.order.iter().cloned().collect());
                order
            },
            extensions,
            unknown_extensions: original.unknown_extensions.clone(),
            providers: Arc::clone(&original.providers),
            writable: true,
            disposed: false,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Marks the layer committed; further structural edits violate the
    /// write contract.
    pub fn freeze(&mut self) {
        self.writable = false;
    }

    fn assert_mutable(&self) -> bool {
        contract::require(!self.disposed, "module root layer is already disposed")
            && contract::require(self.writable, "attempt to modify a committed module root layer")
    }

    // -- persistence ------------------------------------------------------

    /// Replaces the layer's state with the given persisted element.
    ///
    /// Child elements dispatch on their name; unrecognized ones are skipped.
    /// Exactly one module-source entry survives: extras are dropped, a
    /// missing one is synthesized at the end. Cancellation is polled every
    /// few children so huge layers abort promptly.
    pub fn load_state(
        &mut self,
        element: &Element,
        progress: Option<&dyn ProgressIndicator>,
    ) -> Result<(), ModuleRootError> {
        if !self.assert_mutable() {
            return Ok(());
        }
        self.content.clear();
        self.order.clear();
        self.unknown_extensions.clear();

        let mut module_source_added = false;
        for (index, child) in xml::child_elements(element).enumerate() {
            if (index + 1) % PROGRESS_CHECK_INTERVAL == 0 {
                if let Some(progress) = progress {
                    progress.check_canceled()?;
                }
            }
            match child.name.as_str() {
                MODULE_EXTENSION_ELEMENT => self.load_extension_state(child),
                ContentEntry::ELEMENT_NAME => {
                    if let Some(entry) = ContentEntry::read_external(child) {
                        self.content.insert(entry.url().to_string(), entry);
                    }
                }
                ORDER_ENTRY_ELEMENT => {
                    let Some(entry) = OrderEntry::read_external(child) else {
                        continue;
                    };
                    if entry.is_module_source() {
                        if module_source_added {
                            continue;
                        }
                        module_source_added = true;
                    }
                    self.order.push(entry);
                }
                other => log::debug!("skipping unrecognized module root element <{other}>"),
            }
        }
        if !module_source_added {
            self.order.push(OrderEntry::module_source());
        }
        Ok(())
    }

    fn load_extension_state(&mut self, child: &Element) {
        let Some(id) = xml::attr(child, EXTENSION_ID_ATTR) else {
            log::warn!("module extension element without id attribute");
            return;
        };
        match self.providers.find(id) {
            Some(provider) => {
                if let Some(extension) = self.extensions[provider.index()].as_deref_mut() {
                    extension.load_state(child);
                }
            }
            None => {
                log::info!("preserving state of unknown module extension '{id}'");
                self.unknown_extensions.push(child.clone());
            }
        }
    }

    /// Appends the layer's state to `element`: extension states (known and
    /// unknown alike, sorted by id), then content entries in URL order, then
    /// order entries in list order.
    pub fn write_external(&self, element: &mut Element) {
        let mut extension_elements: Vec<Element> = self
            .extensions
            .iter()
            .flatten()
            .filter_map(|extension| extension.state())
            .collect();
        extension_elements.extend(self.unknown_extensions.iter().cloned());
        extension_elements.sort_by(|a, b| {
            xml::attr(a, EXTENSION_ID_ATTR)
                .unwrap_or("")
                .cmp(xml::attr(b, EXTENSION_ID_ATTR).unwrap_or(""))
        });
        for extension_element in extension_elements {
            element.children.push(XMLNode::Element(extension_element));
        }
        for entry in self.content.values() {
            element.children.push(XMLNode::Element(entry.write_external()));
        }
        for entry in &self.order {
            element.children.push(XMLNode::Element(entry.write_external()));
        }
    }

    // -- content entries --------------------------------------------------

    /// Adds a content root, or returns the existing entry for the URL.
    pub fn add_content_entry(&mut self, url: impl Into<String>) -> &mut ContentEntry {
        self.assert_mutable();
        let url = url.into();
        self.content
            .entry(url.clone())
            .or_insert_with(|| ContentEntry::new(url))
    }

    pub fn remove_content_entry(&mut self, url: &str) {
        self.assert_mutable();
        if !contract::require(
            self.content.contains_key(url),
            "removing a content entry that is not part of this layer",
        ) {
            return;
        }
        self.content.remove(url);
    }

    /// Content entries in lexicographic URL order.
    pub fn content_entries(&self) -> impl Iterator<Item = &ContentEntry> {
        self.content.values()
    }

    pub fn content_entry(&self, url: &str) -> Option<&ContentEntry> {
        self.content.get(url)
    }

    pub fn content_entry_mut(&mut self, url: &str) -> Option<&mut ContentEntry> {
        self.content.get_mut(url)
    }

    pub fn content_root_urls(&self) -> Vec<String> {
        self.content.keys().cloned().collect()
    }

    pub fn folder_urls(&self, predicate: impl Fn(ContentFolderKind) -> bool) -> Vec<String> {
        self.content
            .values()
            .flat_map(|entry| entry.folder_urls(&predicate))
            .collect()
    }

    pub fn source_root_urls(&self, include_tests: bool) -> Vec<String> {
        self.folder_urls(|kind| kind.is_source() && (include_tests || !kind.is_test()))
    }

    pub fn exclude_root_urls(&self) -> Vec<String> {
        self.folder_urls(|kind| kind.is_excluded())
    }

    // -- order entries ----------------------------------------------------

    pub fn order_entries(&self) -> &[OrderEntry] {
        self.order.as_slice()
    }

    pub fn module_source_entry(&self) -> Option<&OrderEntry> {
        self.order.iter().find(|entry| entry.is_module_source())
    }

    pub fn find_sdk_entry(&self) -> Option<&OrderEntry> {
        self.order.iter().find(|entry| entry.is_sdk())
    }

    pub fn find_library_entry(&self, library_name: &str) -> Option<&OrderEntry> {
        self.order.iter().find(|entry| {
            matches!(entry.kind(), OrderEntryKind::Library { library_name: name, .. } if name == library_name)
        })
    }

    /// Names of all module dependencies, in order.
    pub fn dependency_module_names(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|entry| match entry.kind() {
                OrderEntryKind::Module { module_name } => Some(module_name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Appends an arbitrary entry at the end of the order.
    pub fn add_order_entry(&mut self, entry: OrderEntry) -> &OrderEntry {
        self.assert_mutable();
        self.order.push(entry);
        &self.order.as_slice()[self.order.len() - 1]
    }

    pub fn add_module_entry(&mut self, module_name: impl Into<String>) -> &OrderEntry {
        self.add_order_entry(OrderEntry::module(module_name))
    }

    pub fn add_library_entry(
        &mut self,
        library_name: impl Into<String>,
        level: LibraryLevel,
    ) -> &OrderEntry {
        self.add_order_entry(OrderEntry::library(library_name, level))
    }

    /// Inserts an SDK entry at its canonical position: right after the last
    /// existing SDK entry, otherwise immediately before the module-source
    /// entry, otherwise first.
    pub fn add_sdk_entry(&mut self, sdk_name: Option<String>) -> &OrderEntry {
        self.assert_mutable();
        let mut source_position = None;
        let mut sdk_position = None;
        for (position, entry) in self.order.iter().enumerate() {
            if entry.is_module_source() {
                source_position = Some(position);
            } else if entry.is_sdk() {
                sdk_position = Some(position);
            }
        }
        let at = match (sdk_position, source_position) {
            (Some(sdk), _) => sdk + 1,
            (None, Some(source)) => source,
            (None, None) => 0,
        };
        self.order.insert(at, OrderEntry::sdk(sdk_name));
        &self.order.as_slice()[at]
    }

    pub fn order_entry_mut(&mut self, entry_id: u64) -> Option<&mut OrderEntry> {
        self.assert_mutable();
        let position = self.order.position_of(entry_id)?;
        self.order.get_mut(position)
    }

    pub fn remove_order_entry(&mut self, entry_id: u64) {
        self.assert_mutable();
        if self.order.remove_entry(entry_id).is_none() {
            contract::violation("removing an order entry that is not part of this layer");
        }
    }

    /// Reorders the entries to the given id sequence. The sequence must be
    /// a permutation of the current entries; otherwise the call is rejected
    /// and the layer is left untouched.
    pub fn rearrange_order_entries(&mut self, new_order: &[u64]) {
        if !self.assert_mutable() {
            return;
        }
        if let Some(error) = self.check_valid_rearrangement(new_order) {
            contract::violation(&error);
            return;
        }
        let mut by_id: HashMap<u64, OrderEntry> = self
            .order
            .take_all()
            .into_iter()
            .map(|entry| (entry.entry_id(), entry))
            .collect();
        let entries = new_order
            .iter()
            .filter_map(|entry_id| by_id.remove(entry_id))
            .collect();
        self.order.replace_all(entries);
    }

    fn check_valid_rearrangement(&self, new_order: &[u64]) -> Option<String> {
        if new_order.len() != self.order.len() {
            return Some(format!(
                "invalid rearrangement: old size {}, new size {}",
                self.order.len(),
                new_order.len()
            ));
        }
        let mut seen = HashSet::new();
        for entry_id in new_order {
            if self.order.position_of(*entry_id).is_none() {
                return Some(format!(
                    "invalid rearrangement: order entry {entry_id} is not part of this layer"
                ));
            }
            if !seen.insert(*entry_id) {
                return Some(format!(
                    "invalid rearrangement: duplicate order entry {entry_id}"
                ));
            }
        }
        None
    }

    // -- extensions -------------------------------------------------------

    /// The enabled extension of the given concrete type, if any.
    pub fn extension<T: ModuleExtension>(&self) -> Option<&T> {
        self.extensions
            .iter()
            .flatten()
            .filter(|extension| extension.is_enabled())
            .find_map(|extension| extension.as_any().downcast_ref::<T>())
    }

    /// The extension of the given concrete type regardless of enablement.
    pub fn extension_without_check<T: ModuleExtension>(&self) -> Option<&T> {
        self.extensions
            .iter()
            .flatten()
            .find_map(|extension| extension.as_any().downcast_ref::<T>())
    }

    pub fn extension_by_id(&self, id: &str) -> Option<&dyn ModuleExtension> {
        let provider = self.providers.find(id)?;
        self.extensions.get(provider.index())?.as_deref()
    }

    pub fn extension_by_id_mut(&mut self, id: &str) -> Option<&mut dyn ModuleExtension> {
        self.assert_mutable();
        let provider = self.providers.find(id)?;
        self.extensions.get_mut(provider.index())?.as_deref_mut()
    }

    // -- diffing and commit -----------------------------------------------

    fn are_extensions_changed(&self, other: &ModuleRootLayer) -> bool {
        self.providers.providers().iter().any(|provider| {
            let index = provider.index();
            match (&self.extensions[index], &other.extensions[index]) {
                (Some(mine), Some(theirs)) => mine.is_modified(theirs.as_ref()),
                (None, None) => false,
                _ => true,
            }
        })
    }

    fn are_order_entries_changed(&self, other: &ModuleRootLayer) -> bool {
        self.order.len() != other.order.len()
            || self
                .order
                .iter()
                .zip(other.order.iter())
                .any(|(mine, theirs)| !mine.is_equivalent_to(theirs))
    }

    fn are_content_entries_changed(&self, other: &ModuleRootLayer) -> bool {
        self.content.len() != other.content.len() || self.content.keys().ne(other.content.keys())
    }

    /// True when committing this layer into `committed` would change it.
    pub fn is_changed(&self, committed: &ModuleRootLayer) -> bool {
        self.are_extensions_changed(committed)
            || self.are_order_entries_changed(committed)
            || self.are_content_entries_changed(committed)
    }

    /// Pushes this layer's state into `target`, firing listener callbacks
    /// only for parts that actually differ. Returns whether anything
    /// changed; committing an unchanged layer is a silent no-op, so commit
    /// is idempotent.
    pub fn copy(&self, target: &mut ModuleRootLayer, listener: Option<&dyn ModuleRootListener>) -> bool {
        if !contract::require(
            Arc::ptr_eq(&self.providers, &target.providers),
            "layers built from different extension provider registries",
        ) {
            return false;
        }
        let mut changed = false;

        for provider in self.providers.providers() {
            let index = provider.index();
            let modified = match (&self.extensions[index], &target.extensions[index]) {
                (Some(mine), Some(theirs)) => mine.is_modified(theirs.as_ref()),
                _ => false,
            };
            if !modified {
                continue;
            }
            if let Some(listener) = listener {
                listener.before_extension_changed(provider.id());
            }
            if let (Some(source), Some(target_extension)) =
                (&self.extensions[index], &mut target.extensions[index])
            {
                target_extension.commit(source.as_ref());
            }
            changed = true;
        }

        let order_changed = self.are_order_entries_changed(target);
        if order_changed {
            target
                .order
                .replace_all(self.order.iter().cloned().collect());
        }
        let content_changed = self.are_content_entries_changed(target);
        if content_changed {
            target.content = self.content.clone();
        }
        if order_changed || content_changed {
            if let Some(listener) = listener {
                listener.root_set_changed();
            }
            changed = true;
        }

        if target.unknown_extensions != self.unknown_extensions {
            target.unknown_extensions = self.unknown_extensions.clone();
        }
        changed
    }

    /// Releases everything the layer holds. Reuse after dispose is a caller
    /// error.
    pub fn dispose(&mut self) {
        if self.disposed {
            contract::violation("module root layer disposed twice");
            return;
        }
        self.content.clear();
        self.order.clear();
        self.extensions.clear();
        self.unknown_extensions.clear();
        self.disposed = true;
    }
}
