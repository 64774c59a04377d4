//! Per-jar visibility filtering for plugin classpaths.
//!
//! A plugin ships its runtime under `lib/` as jars and zips. Each archive
//! may carry a `<archive-name>.requires` sidecar listing groups of plugin
//! ids; the archive is put on the classpath only when at least one group is
//! fully enabled. Archives without a sidecar are always visible.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::plugin_system::descriptor::PluginId;
use crate::utils::xml;

const REQUIRES_SUFFIX: &str = ".requires";
const PLUGINS_ELEMENT: &str = "plugins";
const PLUGIN_ELEMENT: &str = "plugin";

/// One `<plugins>` group from a requires sidecar. The group is satisfied
/// only when every listed plugin is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPathPluginSet {
    ids: Vec<PluginId>,
}

impl ClassPathPluginSet {
    pub fn new(ids: Vec<PluginId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[PluginId] {
        &self.ids
    }

    pub fn accept(&self, enabled: &HashSet<PluginId>) -> bool {
        self.ids.iter().all(|id| enabled.contains(id))
    }
}

/// One archive under a plugin's `lib/` together with its visibility groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPathItem {
    path: PathBuf,
    plugin_sets: Vec<ClassPathPluginSet>,
}

impl ClassPathItem {
    pub fn new(path: PathBuf, plugin_sets: Vec<ClassPathPluginSet>) -> Self {
        Self { path, plugin_sets }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn plugin_sets(&self) -> &[ClassPathPluginSet] {
        &self.plugin_sets
    }

    /// An archive without groups is unconditionally visible; otherwise one
    /// satisfied group is enough.
    pub fn accept(&self, enabled: &HashSet<PluginId>) -> bool {
        self.plugin_sets.is_empty() || self.plugin_sets.iter().any(|set| set.accept(enabled))
    }
}

/// Lists `lib/*.jar` and `lib/*.zip` under a plugin root, sorted by file
/// name for a stable classpath, each paired with its sidecar groups. A
/// missing `lib/` directory yields an empty classpath.
pub(crate) fn collect_class_path_items(plugin_path: &Path) -> Vec<ClassPathItem> {
    let lib_dir = plugin_path.join("lib");
    let entries = match fs::read_dir(&lib_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut archives: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_archive(path))
        .collect();
    archives.sort();
    archives
        .into_iter()
        .map(|archive| {
            let plugin_sets = load_plugin_sets(&archive);
            ClassPathItem::new(archive, plugin_sets)
        })
        .collect()
}

pub(crate) fn is_archive(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|extension| extension.to_str()),
        Some("jar") | Some("zip")
    )
}

/// Reads `<archive>.requires` next to the archive. A missing sidecar means
/// no restrictions; a malformed one is logged and treated as absent so the
/// archive stays visible rather than silently disappearing.
fn load_plugin_sets(archive: &Path) -> Vec<ClassPathPluginSet> {
    let Some(file_name) = archive.file_name().and_then(|name| name.to_str()) else {
        return Vec::new();
    };
    let sidecar = archive.with_file_name(format!("{file_name}{REQUIRES_SUFFIX}"));
    let bytes = match fs::read(&sidecar) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    match parse_requires(&bytes) {
        Ok(plugin_sets) => plugin_sets,
        Err(error) => {
            log::warn!("malformed requires sidecar '{}': {error}", sidecar.display());
            Vec::new()
        }
    }
}

/// Parses sidecar content. The canonical form is a `<requires>` root with
/// one or more `<plugins>` groups; a bare `<plugins>` root is accepted as a
/// single group.
pub(crate) fn parse_requires(bytes: &[u8]) -> Result<Vec<ClassPathPluginSet>, xml::ParseError> {
    let root = xml::parse_bytes(bytes)?;
    let mut plugin_sets = Vec::new();
    if root.name == PLUGINS_ELEMENT {
        plugin_sets.push(parse_plugin_set(&root));
    } else {
        for group in xml::child_elements(&root).filter(|child| child.name == PLUGINS_ELEMENT) {
            plugin_sets.push(parse_plugin_set(group));
        }
    }
    Ok(plugin_sets)
}

fn parse_plugin_set(group: &xmltree::Element) -> ClassPathPluginSet {
    let ids = xml::child_elements(group)
        .filter(|child| child.name == PLUGIN_ELEMENT)
        .filter_map(xml::text_of)
        .map(PluginId::new)
        .collect();
    ClassPathPluginSet::new(ids)
}
