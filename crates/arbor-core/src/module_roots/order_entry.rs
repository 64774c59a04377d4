//! Order entries: the items of a module's dependency resolution order.

use std::sync::atomic::{AtomicU64, Ordering};

use xmltree::Element;

use crate::utils::xml;

pub(crate) const ORDER_ENTRY_ELEMENT: &str = "orderEntry";
const TYPE_ATTR: &str = "type";
const EXPORTED_ATTR: &str = "exported";
const SCOPE_ATTR: &str = "scope";
const MODULE_NAME_ATTR: &str = "module-name";
const LIBRARY_NAME_ATTR: &str = "name";
const LIBRARY_LEVEL_ATTR: &str = "level";
const SDK_NAME_ATTR: &str = "name";

const MODULE_SOURCE_TYPE: &str = "module-source";
const MODULE_TYPE: &str = "module";
const LIBRARY_TYPE: &str = "library";
const SDK_TYPE: &str = "sdk";

/// Visibility scope of an exportable dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependencyScope {
    #[default]
    Compile,
    Test,
    Runtime,
    Provided,
}

impl DependencyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyScope::Compile => "COMPILE",
            DependencyScope::Test => "TEST",
            DependencyScope::Runtime => "RUNTIME",
            DependencyScope::Provided => "PROVIDED",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "COMPILE" => Some(DependencyScope::Compile),
            "TEST" => Some(DependencyScope::Test),
            "RUNTIME" => Some(DependencyScope::Runtime),
            "PROVIDED" => Some(DependencyScope::Provided),
            _ => None,
        }
    }

    pub fn is_for_production_compile(&self) -> bool {
        matches!(self, DependencyScope::Compile | DependencyScope::Provided)
    }

    pub fn is_for_production_runtime(&self) -> bool {
        matches!(self, DependencyScope::Compile | DependencyScope::Runtime)
    }
}

/// Where a library referenced by an order entry is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryLevel {
    Module,
    Project,
    Application,
}

impl LibraryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryLevel::Module => "module",
            LibraryLevel::Project => "project",
            LibraryLevel::Application => "application",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "module" => Some(LibraryLevel::Module),
            "project" => Some(LibraryLevel::Project),
            "application" => Some(LibraryLevel::Application),
            _ => None,
        }
    }
}

/// What an order entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEntryKind {
    /// The module's own sources. Exactly one per layer.
    ModuleSource,
    /// Another module of the project, referenced by name. The reference may
    /// dangle; resolution happens elsewhere.
    Module { module_name: String },
    Library { library_name: String, level: LibraryLevel },
    /// The module SDK; `None` inherits the project SDK.
    Sdk { sdk_name: Option<String> },
}

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// One slot in a module's resolution order.
///
/// Each entry carries a process-unique id, assigned at construction and kept
/// through clones, which rearrangement uses to match entries without relying
/// on positions. The `index` field caches the entry's current position and
/// is re-stamped by [`OrderEntryList`] on every structural change.
#[derive(Debug, Clone)]
pub struct OrderEntry {
    entry_id: u64,
    kind: OrderEntryKind,
    exported: bool,
    scope: DependencyScope,
    index: usize,
}

impl OrderEntry {
    fn new(kind: OrderEntryKind) -> Self {
        Self {
            entry_id: NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            exported: false,
            scope: DependencyScope::default(),
            index: 0,
        }
    }

    pub fn module_source() -> Self {
        Self::new(OrderEntryKind::ModuleSource)
    }

    pub fn module(module_name: impl Into<String>) -> Self {
        Self::new(OrderEntryKind::Module {
            module_name: module_name.into(),
        })
    }

    pub fn library(library_name: impl Into<String>, level: LibraryLevel) -> Self {
        Self::new(OrderEntryKind::Library {
            library_name: library_name.into(),
            level,
        })
    }

    pub fn sdk(sdk_name: Option<String>) -> Self {
        Self::new(OrderEntryKind::Sdk { sdk_name })
    }

    pub fn entry_id(&self) -> u64 {
        self.entry_id
    }

    pub fn kind(&self) -> &OrderEntryKind {
        &self.kind
    }

    pub fn is_module_source(&self) -> bool {
        matches!(self.kind, OrderEntryKind::ModuleSource)
    }

    pub fn is_sdk(&self) -> bool {
        matches!(self.kind, OrderEntryKind::Sdk { .. })
    }

    /// Module and library entries can be re-exported to dependents.
    pub fn is_exportable(&self) -> bool {
        matches!(
            self.kind,
            OrderEntryKind::Module { .. } | OrderEntryKind::Library { .. }
        )
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    pub fn set_exported(&mut self, exported: bool) {
        self.exported = exported;
    }

    pub fn scope(&self) -> DependencyScope {
        self.scope
    }

    pub fn set_scope(&mut self, scope: DependencyScope) {
        self.scope = scope;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn presentable_name(&self) -> String {
        match &self.kind {
            OrderEntryKind::ModuleSource => "<module source>".to_string(),
            OrderEntryKind::Module { module_name } => module_name.clone(),
            OrderEntryKind::Library { library_name, .. } => library_name.clone(),
            OrderEntryKind::Sdk { sdk_name } => match sdk_name {
                Some(name) => name.clone(),
                None => "<inherited sdk>".to_string(),
            },
        }
    }

    /// Equality used by layer diffing: kind together with the exportable
    /// attributes. Entry ids and cached indices do not participate.
    pub fn is_equivalent_to(&self, other: &OrderEntry) -> bool {
        self.kind == other.kind && self.exported == other.exported && self.scope == other.scope
    }

    /// Reads one `<orderEntry>`. An unknown or missing type is logged and
    /// skipped rather than failing the whole layer.
    pub fn read_external(element: &Element) -> Option<OrderEntry> {
        let Some(entry_type) = xml::attr(element, TYPE_ATTR) else {
            log::warn!("order entry without type attribute");
            return None;
        };
        let kind = match entry_type {
            MODULE_SOURCE_TYPE => OrderEntryKind::ModuleSource,
            MODULE_TYPE => {
                let Some(module_name) = xml::attr(element, MODULE_NAME_ATTR) else {
                    log::warn!("module order entry without module name");
                    return None;
                };
                OrderEntryKind::Module {
                    module_name: module_name.to_string(),
                }
            }
            LIBRARY_TYPE => {
                let Some(library_name) = xml::attr(element, LIBRARY_NAME_ATTR) else {
                    log::warn!("library order entry without library name");
                    return None;
                };
                let level = xml::attr(element, LIBRARY_LEVEL_ATTR)
                    .and_then(LibraryLevel::parse)
                    .unwrap_or(LibraryLevel::Project);
                OrderEntryKind::Library {
                    library_name: library_name.to_string(),
                    level,
                }
            }
            SDK_TYPE => OrderEntryKind::Sdk {
                sdk_name: xml::attr(element, SDK_NAME_ATTR).map(str::to_string),
            },
            unknown => {
                log::warn!("skipping order entry of unknown type '{unknown}'");
                return None;
            }
        };

        let mut entry = OrderEntry::new(kind);
        if entry.is_exportable() {
            entry.exported = xml::bool_attr(element, EXPORTED_ATTR);
            if let Some(scope) = xml::attr(element, SCOPE_ATTR) {
                match DependencyScope::parse(scope) {
                    Some(scope) => entry.scope = scope,
                    None => log::warn!("unknown dependency scope '{scope}', using COMPILE"),
                }
            }
        }
        Some(entry)
    }

    pub fn write_external(&self) -> Element {
        let mut element = Element::new(ORDER_ENTRY_ELEMENT);
        let attributes = &mut element.attributes;
        match &self.kind {
            OrderEntryKind::ModuleSource => {
                attributes.insert(TYPE_ATTR.to_string(), MODULE_SOURCE_TYPE.to_string());
            }
            OrderEntryKind::Module { module_name } => {
                attributes.insert(TYPE_ATTR.to_string(), MODULE_TYPE.to_string());
                attributes.insert(MODULE_NAME_ATTR.to_string(), module_name.clone());
            }
            OrderEntryKind::Library { library_name, level } => {
                attributes.insert(TYPE_ATTR.to_string(), LIBRARY_TYPE.to_string());
                attributes.insert(LIBRARY_NAME_ATTR.to_string(), library_name.clone());
                attributes.insert(LIBRARY_LEVEL_ATTR.to_string(), level.as_str().to_string());
            }
            OrderEntryKind::Sdk { sdk_name } => {
                attributes.insert(TYPE_ATTR.to_string(), SDK_TYPE.to_string());
                if let Some(name) = sdk_name {
                    attributes.insert(SDK_NAME_ATTR.to_string(), name.clone());
                }
            }
        }
        if self.is_exportable() {
            if self.exported {
                element
                    .attributes
                    .insert(EXPORTED_ATTR.to_string(), "true".to_string());
            }
            if self.scope != DependencyScope::Compile {
                element
                    .attributes
                    .insert(SCOPE_ATTR.to_string(), self.scope.as_str().to_string());
            }
        }
        element
    }
}

/// Ordered entry list that keeps every entry's cached index in sync with
/// its actual position after any structural mutation.
#[derive(Debug, Clone, Default)]
pub struct OrderEntryList {
    entries: Vec<OrderEntry>,
}

impl OrderEntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[OrderEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&OrderEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut OrderEntry> {
        self.entries.get_mut(index)
    }

    pub fn position_of(&self, entry_id: u64) -> Option<usize> {
        self.entries.iter().position(|entry| entry.entry_id == entry_id)
    }

    pub fn push(&mut self, mut entry: OrderEntry) {
        entry.index = self.entries.len();
        self.entries.push(entry);
    }

    pub fn insert(&mut self, at: usize, entry: OrderEntry) {
        self.entries.insert(at, entry);
        self.restamp_from(at);
    }

    pub fn remove(&mut self, at: usize) -> OrderEntry {
        let removed = self.entries.remove(at);
        self.restamp_from(at);
        removed
    }

    pub fn remove_entry(&mut self, entry_id: u64) -> Option<OrderEntry> {
        let position = self.position_of(entry_id)?;
        Some(self.remove(position))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn replace_all(&mut self, entries: Vec<OrderEntry>) {
        self.entries = entries;
        self.restamp_from(0);
    }

    pub(crate) fn take_all(&mut self) -> Vec<OrderEntry> {
        std::mem::take(&mut self.entries)
    }

    fn restamp_from(&mut self, start: usize) {
        for index in start..self.entries.len() {
            self.entries[index].index = index;
        }
    }
}

impl<'a> IntoIterator for &'a OrderEntryList {
    type Item = &'a OrderEntry;
    type IntoIter = std::slice::Iter<'a, OrderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
