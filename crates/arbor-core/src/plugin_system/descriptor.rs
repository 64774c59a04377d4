//! Interpreted plugin descriptors.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use xmltree::Element;

use crate::plugin_system::bean::PluginBean;
use crate::plugin_system::classpath::{self, ClassPathItem};
use crate::plugin_system::permissions::{PluginPermissionDescriptor, PluginPermissionType};

/// Id of the platform itself. Every other plugin depends on it implicitly.
pub const BASE_PLUGIN_ID: &str = "arbor.platform";

/// Unique identifier of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn base() -> Self {
        Self(BASE_PLUGIN_ID.to_string())
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_PLUGIN_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Vendor block of a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginVendor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

/// Where a descriptor stands in the boot pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// Found on disk, not yet filtered.
    Discovered,
    /// Survived filtering and is part of the published plugin set.
    Loaded,
    /// Turned off by the user or by a failed dependency check.
    Disabled,
    /// Rejected by the platform version validator.
    Incompatible,
}

/// A fully interpreted plugin descriptor.
///
/// Dependency lists are ordered and duplicate-free; every non-platform
/// plugin carries an implicit dependency on [`BASE_PLUGIN_ID`]. The classpath
/// item list is computed from disk at most once per descriptor, while the
/// enabled-set filtering over it happens on every query.
#[derive(Debug)]
pub struct PluginDescriptor {
    id: PluginId,
    name: String,
    version: Option<String>,
    platform_version: Option<String>,
    category: Option<String>,
    description: Option<String>,
    vendor: PluginVendor,
    dependencies: Vec<PluginId>,
    optional_dependencies: BTreeSet<PluginId>,
    incompatible_with: BTreeSet<PluginId>,
    permissions: HashMap<PluginPermissionType, PluginPermissionDescriptor>,
    tags: Vec<String>,
    experimental: bool,
    actions: Vec<Element>,
    path: PathBuf,
    light_icon_bytes: Vec<u8>,
    dark_icon_bytes: Vec<u8>,
    pre_installed: bool,
    enabled: bool,
    deleted: bool,
    status: PluginStatus,
    class_path_items: OnceLock<Vec<ClassPathItem>>,
}

impl PluginDescriptor {
    pub fn from_bean(bean: PluginBean, path: PathBuf, pre_installed: bool) -> Self {
        let mut dependencies: Vec<PluginId> = Vec::new();
        let mut optional_dependencies = BTreeSet::new();
        for dependency in bean.dependencies {
            // first occurrence wins on duplicate <depends>
            if dependencies.contains(&dependency.id) {
                continue;
            }
            if dependency.optional {
                optional_dependencies.insert(dependency.id.clone());
            }
            dependencies.push(dependency.id);
        }
        if !bean.id.is_base() && !dependencies.iter().any(PluginId::is_base) {
            dependencies.push(PluginId::base());
        }

        Self {
            id: bean.id,
            name: bean.name,
            version: bean.version,
            platform_version: bean.platform_version,
            category: bean.category,
            description: bean.description,
            vendor: bean.vendor,
            dependencies,
            optional_dependencies,
            incompatible_with: bean.incompatible_with.into_iter().collect(),
            permissions: bean.permissions,
            tags: bean.tags,
            experimental: bean.experimental,
            actions: bean.actions,
            path,
            light_icon_bytes: Vec::new(),
            dark_icon_bytes: Vec::new(),
            pre_installed,
            enabled: true,
            deleted: false,
            status: PluginStatus::Discovered,
            class_path_items: OnceLock::new(),
        }
    }

    pub fn builder(id: impl Into<PluginId>) -> PluginDescriptorBuilder {
        PluginDescriptorBuilder::new(id)
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn platform_version(&self) -> Option<&str> {
        self.platform_version.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn vendor(&self) -> &PluginVendor {
        &self.vendor
    }

    /// All dependencies in declaration order, the implicit platform
    /// dependency last when it was synthesized.
    pub fn dependencies(&self) -> &[PluginId] {
        &self.dependencies
    }

    /// Subset of [`dependencies`](Self::dependencies) marked optional.
    pub fn optional_dependencies(&self) -> &BTreeSet<PluginId> {
        &self.optional_dependencies
    }

    pub fn is_optional_dependency(&self, id: &PluginId) -> bool {
        self.optional_dependencies.contains(id)
    }

    pub fn incompatible_with(&self) -> &BTreeSet<PluginId> {
        &self.incompatible_with
    }

    pub fn permission(&self, permission_type: PluginPermissionType) -> Option<&PluginPermissionDescriptor> {
        self.permissions.get(&permission_type)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_experimental(&self) -> bool {
        self.experimental
    }

    pub fn actions(&self) -> &[Element] {
        &self.actions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn light_icon_bytes(&self) -> &[u8] {
        &self.light_icon_bytes
    }

    pub fn dark_icon_bytes(&self) -> &[u8] {
        &self.dark_icon_bytes
    }

    pub(crate) fn set_icons(&mut self, light: Vec<u8>, dark: Vec<u8>) {
        self.light_icon_bytes = light;
        self.dark_icon_bytes = dark;
    }

    pub fn is_pre_installed(&self) -> bool {
        self.pre_installed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    pub fn status(&self) -> PluginStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: PluginStatus) {
        self.status = status;
    }

    pub fn is_loaded(&self) -> bool {
        self.status == PluginStatus::Loaded
    }

    /// Classpath items of this plugin. The disk scan runs at most once; the
    /// result is cached for the descriptor's lifetime.
    pub fn class_path_items(&self) -> &[ClassPathItem] {
        self.class_path_items
            .get_or_init(|| classpath::collect_class_path_items(&self.path))
    }

    /// Archives visible under the given enabled-plugin set. Filtering runs
    /// on every call over the cached item list.
    pub fn get_class_path(&self, enabled: &HashSet<PluginId>) -> Vec<PathBuf> {
        self.class_path_items()
            .iter()
            .filter(|item| item.accept(enabled))
            .map(|item| item.path().to_path_buf())
            .collect()
    }
}

/// Test- and host-facing builder for descriptors that do not come from disk.
#[derive(Debug)]
pub struct PluginDescriptorBuilder {
    id: PluginId,
    name: Option<String>,
    version: Option<String>,
    platform_version: Option<String>,
    dependencies: Vec<PluginId>,
    optional_dependencies: BTreeSet<PluginId>,
    incompatible_with: BTreeSet<PluginId>,
    path: PathBuf,
    pre_installed: bool,
}

impl PluginDescriptorBuilder {
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            version: None,
            platform_version: None,
            dependencies: Vec::new(),
            optional_dependencies: BTreeSet::new(),
            incompatible_with: BTreeSet::new(),
            path: PathBuf::new(),
            pre_installed: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn platform_version(mut self, platform_version: impl Into<String>) -> Self {
        self.platform_version = Some(platform_version.into());
        self
    }

    pub fn depends(mut self, id: impl Into<PluginId>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn depends_optionally(mut self, id: impl Into<PluginId>) -> Self {
        let id = id.into();
        self.optional_dependencies.insert(id.clone());
        self.dependencies.push(id);
        self
    }

    pub fn incompatible_with(mut self, id: impl Into<PluginId>) -> Self {
        self.incompatible_with.insert(id.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn pre_installed(mut self, pre_installed: bool) -> Self {
        self.pre_installed = pre_installed;
        self
    }

    pub fn build(self) -> PluginDescriptor {
        let mut dependencies = self.dependencies;
        if !self.id.is_base() && !dependencies.iter().any(PluginId::is_base) {
            dependencies.push(PluginId::base());
        }
        let name = self.name.unwrap_or_else(|| self.id.as_str().to_string());
        PluginDescriptor {
            id: self.id,
            name,
            version: self.version,
            platform_version: self.platform_version,
            category: None,
            description: None,
            vendor: PluginVendor::default(),
            dependencies,
            optional_dependencies: self.optional_dependencies,
            incompatible_with: self.incompatible_with,
            permissions: HashMap::new(),
            tags: Vec::new(),
            experimental: false,
            actions: Vec::new(),
            path: self.path,
            light_icon_bytes: Vec::new(),
            dark_icon_bytes: Vec::new(),
            pre_installed: self.pre_installed,
            enabled: true,
            deleted: false,
            status: PluginStatus::Discovered,
            class_path_items: OnceLock::new(),
        }
    }
}
