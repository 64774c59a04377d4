//! Plugin descriptor discovery and the boot pipeline.
//!
//! Discovery scans each configured plugin directory; every child directory
//! is one plugin root. The descriptor is located at `META-INF/plugin.xml`
//! inside the root, or embedded under the same entry name in a jar under
//! `lib/`. A `<jar-name>.jar.marker` sidecar pins the descriptor jar so
//! large plugins do not pay a full archive scan.
//!
//! The pipeline then filters the discovered set (user-disabled, platform
//! incompatibilities, broken hard dependencies), computes a deterministic
//! dependency-sorted load order and publishes the result into a
//! [`PluginRegistry`].

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use zip::ZipArchive;

use crate::plugin_system::bean::PluginBean;
use crate::plugin_system::descriptor::{PluginDescriptor, PluginId, PluginStatus};
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::validator::{self, PluginVersionValidator};
use crate::plugin_system::version;
use crate::progress::ProgressIndicator;

const DESCRIPTOR_ENTRY: &str = "META-INF/plugin.xml";
const LIGHT_ICON_ENTRY: &str = "META-INF/pluginIcon.svg";
const DARK_ICON_ENTRY: &str = "META-INF/pluginIcon_dark.svg";
const META_INF_DIR: &str = "META-INF";
const LIB_DIR: &str = "lib";
const JAR_MARKER_SUFFIX: &str = ".jar.marker";

#[derive(Debug, Default)]
struct IconBytes {
    light: Vec<u8>,
    dark: Vec<u8>,
}

/// Loads the descriptor of a single plugin root. Returns `None` when the
/// path holds no plugin; the cause is logged, never propagated, so one
/// broken plugin cannot take discovery down.
pub fn load_descriptor(plugin_path: &Path, pre_installed: bool) -> Option<PluginDescriptor> {
    if !plugin_path.is_dir() {
        return None;
    }

    let meta_inf_descriptor = plugin_path.join(META_INF_DIR).join("plugin.xml");
    let (descriptor_bytes, icons) = if meta_inf_descriptor.is_file() {
        let bytes = match std::fs::read(&meta_inf_descriptor) {
            Ok(bytes) => bytes,
            Err(error) => {
                log::error!(
                    "cannot read descriptor '{}': {error}",
                    meta_inf_descriptor.display()
                );
                return None;
            }
        };
        (bytes, read_directory_icons(&plugin_path.join(META_INF_DIR)))
    } else {
        find_descriptor_in_lib(plugin_path)?
    };

    match PluginBean::parse(&descriptor_bytes, plugin_path) {
        Ok(bean) => {
            let mut descriptor =
                PluginDescriptor::from_bean(bean, plugin_path.to_path_buf(), pre_installed);
            descriptor.set_icons(icons.light, icons.dark);
            Some(descriptor)
        }
        Err(error) => {
            log::error!("cannot load plugin from '{}': {error}", plugin_path.display());
            None
        }
    }
}

fn read_directory_icons(meta_inf: &Path) -> IconBytes {
    IconBytes {
        light: std::fs::read(meta_inf.join("pluginIcon.svg")).unwrap_or_default(),
        dark: std::fs::read(meta_inf.join("pluginIcon_dark.svg")).unwrap_or_default(),
    }
}

fn find_descriptor_in_lib(plugin_path: &Path) -> Option<(Vec<u8>, IconBytes)> {
    let lib_dir = plugin_path.join(LIB_DIR);
    let mut entries: Vec<PathBuf> = std::fs::read_dir(&lib_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    let marked: Vec<PathBuf> = entries
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            name.ends_with(JAR_MARKER_SUFFIX)
                .then(|| path.with_file_name(name.trim_end_matches(".marker")))
        })
        .collect();
    match marked.as_slice() {
        [jar] => return read_descriptor_from_jar(jar),
        [] => {}
        _ => log::warn!(
            "multiple descriptor jar markers under '{}', scanning all archives",
            lib_dir.display()
        ),
    }

    entries
        .iter()
        .filter(|path| super::classpath::is_archive(path))
        .find_map(|jar| read_descriptor_from_jar(jar))
}

/// Reads `META-INF/plugin.xml` and the icons out of one archive. A corrupt
/// archive is logged and reported as descriptor-less so a scan can continue
/// with the remaining jars.
fn read_descriptor_from_jar(jar: &Path) -> Option<(Vec<u8>, IconBytes)> {
    let file = match File::open(jar) {
        Ok(file) => file,
        Err(error) => {
            log::error!("cannot open archive '{}': {error}", jar.display());
            return None;
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(error) => {
            log::error!("corrupt archive '{}': {error}", jar.display());
            return None;
        }
    };
    let descriptor_bytes = read_zip_entry(&mut archive, DESCRIPTOR_ENTRY)?;
    let icons = IconBytes {
        light: read_zip_entry(&mut archive, LIGHT_ICON_ENTRY).unwrap_or_default(),
        dark: read_zip_entry(&mut archive, DARK_ICON_ENTRY).unwrap_or_default(),
    };
    Some((descriptor_bytes, icons))
}

fn read_zip_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut entry = archive.by_name(name).ok()?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    if let Err(error) = entry.read_to_end(&mut bytes) {
        log::error!("cannot read archive entry '{name}': {error}");
        return None;
    }
    Some(bytes)
}

/// Discovers plugin descriptors across configured plugin directories.
#[derive(Debug, Default)]
pub struct PluginLoader {
    pre_installed_dirs: Vec<PathBuf>,
    plugin_dirs: Vec<PathBuf>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory holding plugins shipped with the platform.
    pub fn add_pre_installed_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.pre_installed_dirs.push(dir.into());
        self
    }

    /// Registers a directory holding user-installed plugins.
    pub fn add_plugin_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.plugin_dirs.push(dir.into());
        self
    }

    /// Scans every configured directory, one descriptor per child directory.
    /// When the same plugin id shows up more than once the higher version
    /// wins, so a user-installed update shadows the bundled copy.
    pub async fn load_all(&self, progress: Option<&dyn ProgressIndicator>) -> Vec<PluginDescriptor> {
        let total = self.count_plugin_roots().await.max(1);
        let mut seen = 0usize;
        let mut result: Vec<PluginDescriptor> = Vec::new();

        for (dirs, pre_installed) in [(&self.pre_installed_dirs, true), (&self.plugin_dirs, false)] {
            for dir in dirs {
                let mut read_dir = match fs::read_dir(dir).await {
                    Ok(read_dir) => read_dir,
                    Err(error) => {
                        log::info!("plugin path '{}' is not readable: {error}", dir.display());
                        continue;
                    }
                };
                loop {
                    let entry = match read_dir.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(error) => {
                            log::warn!("error while scanning '{}': {error}", dir.display());
                            break;
                        }
                    };
                    seen += 1;
                    let Some(descriptor) = load_descriptor(&entry.path(), pre_installed) else {
                        continue;
                    };
                    if let Some(progress) = progress {
                        progress.set_text(descriptor.name());
                        progress.set_fraction(seen as f64 / total as f64);
                    }
                    merge_descriptor(&mut result, descriptor);
                }
            }
        }
        result
    }

    async fn count_plugin_roots(&self) -> usize {
        let mut count = 0usize;
        for dir in self.pre_installed_dirs.iter().chain(&self.plugin_dirs) {
            let Ok(mut read_dir) = fs::read_dir(dir).await else {
                continue;
            };
            while let Ok(Some(_)) = read_dir.next_entry().await {
                count += 1;
            }
        }
        count
    }
}

fn merge_descriptor(result: &mut Vec<PluginDescriptor>, descriptor: PluginDescriptor) {
    let Some(existing) = result.iter_mut().find(|known| known.id() == descriptor.id()) else {
        result.push(descriptor);
        return;
    };
    if version::compare_version_numbers(existing.version(), descriptor.version()).is_lt() {
        log::info!(
            "plugin '{}' version {} shadows version {}",
            descriptor.id(),
            descriptor.version().unwrap_or("<none>"),
            existing.version().unwrap_or("<none>")
        );
        *existing = descriptor;
    }
}

/// Problems and side effects collected while turning discovered descriptors
/// into the published plugin set.
#[derive(Debug, Default)]
pub struct PluginsInitializeInfo {
    problems: Vec<String>,
    disabled_ids: Vec<PluginId>,
}

impl PluginsInitializeInfo {
    /// Human-readable problems for the host to surface after startup.
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// Plugins disabled by the pipeline, not counting user-disabled ones.
    pub fn disabled_plugin_ids(&self) -> &[PluginId] {
        &self.disabled_ids
    }

    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }
}

/// Runs the full boot pipeline over discovered descriptors and publishes
/// the outcome into `registry`.
pub fn initialize_plugins(
    mut descriptors: Vec<PluginDescriptor>,
    disabled: &HashSet<PluginId>,
    version_validator: &dyn PluginVersionValidator,
    registry: &PluginRegistry,
) -> PluginsInitializeInfo {
    let mut info = PluginsInitializeInfo::default();

    let mut incompatible_names = Vec::new();
    for descriptor in &mut descriptors {
        if disabled.contains(descriptor.id()) {
            descriptor.set_enabled(false);
            descriptor.set_status(PluginStatus::Disabled);
        } else if validator::is_incompatible(descriptor, version_validator) {
            incompatible_names.push(descriptor.name().to_string());
            descriptor.set_enabled(false);
            descriptor.set_status(PluginStatus::Incompatible);
        }
    }
    if !incompatible_names.is_empty() {
        incompatible_names.sort();
        info.problems.push(format!(
            "plugins incompatible with this platform build: {}",
            incompatible_names.join(", ")
        ));
    }

    filter_broken_plugins(&mut descriptors, &mut info);

    let enabled_ids: Vec<PluginId> = descriptors
        .iter()
        .filter(|descriptor| descriptor.is_enabled())
        .map(|descriptor| descriptor.id().clone())
        .collect();
    let order = match dependency_sort(&descriptors, &enabled_ids) {
        Ok(order) => order,
        Err(cycle) => {
            info.problems.push(format!(
                "plugins must not have cyclic dependencies: {}",
                cycle
                    .iter()
                    .map(PluginId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            let mut fallback = enabled_ids.clone();
            fallback.sort();
            fallback
        }
    };

    let mut load_order = HashMap::new();
    for (index, id) in order.iter().enumerate() {
        load_order.insert(id.clone(), index);
    }
    registry.set_plugin_load_order(load_order);

    for descriptor in &mut descriptors {
        if descriptor.is_enabled() {
            descriptor.set_status(PluginStatus::Loaded);
        }
    }
    registry.initialize(descriptors.into_iter().map(Arc::new).collect());
    log_plugins(registry);
    info
}

/// Disables every enabled plugin whose hard dependency closure reaches an
/// id with no enabled descriptor. The membership snapshot is taken before
/// the pass, so plugins disabled here do not cascade within the same boot;
/// their dependents get their turn at the next one.
fn filter_broken_plugins(descriptors: &mut [PluginDescriptor], info: &mut PluginsInitializeInfo) {
    let enabled_index: HashMap<PluginId, usize> = descriptors
        .iter()
        .enumerate()
        .filter(|(_, descriptor)| descriptor.is_enabled())
        .map(|(index, descriptor)| (descriptor.id().clone(), index))
        .collect();

    let mut broken: Vec<(usize, PluginId)> = Vec::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
        if !descriptor.is_enabled() {
            continue;
        }
        let mut missing: Option<PluginId> = None;
        let satisfied = validator::check_dependants(
            descriptor,
            &|id| enabled_index.get(id).map(|&position| &descriptors[position]),
            &mut |id| {
                if enabled_index.contains_key(id) {
                    true
                } else {
                    missing = Some(id.clone());
                    false
                }
            },
        );
        if !satisfied {
            if let Some(missing) = missing {
                broken.push((index, missing));
            }
        }
    }

    for (index, missing) in broken {
        let descriptor = &mut descriptors[index];
        descriptor.set_enabled(false);
        descriptor.set_status(PluginStatus::Disabled);
        info.problems.push(format!(
            "plugin '{}' requires plugin '{missing}' which is missing or disabled",
            descriptor.name()
        ));
        info.disabled_ids.push(descriptor.id().clone());
    }
}

/// Kahn's algorithm over the hard dependency edges of the enabled set.
/// Dependencies come before dependents; among the ready candidates the
/// lexicographically smallest id goes first, making the order deterministic
/// across runs. On a cycle the unplaceable ids are returned sorted.
fn dependency_sort(
    descriptors: &[PluginDescriptor],
    enabled_ids: &[PluginId],
) -> Result<Vec<PluginId>, Vec<PluginId>> {
    let enabled: HashSet<&PluginId> = enabled_ids.iter().collect();
    let mut dependents: HashMap<&PluginId, Vec<&PluginId>> = HashMap::new();
    let mut in_degree: HashMap<&PluginId, usize> =
        enabled_ids.iter().map(|id| (id, 0usize)).collect();

    for descriptor in descriptors {
        if !enabled.contains(descriptor.id()) {
            continue;
        }
        for dependency in descriptor.dependencies() {
            if dependency == descriptor.id() || !enabled.contains(dependency) {
                continue;
            }
            dependents.entry(dependency).or_default().push(descriptor.id());
            if let Some(degree) = in_degree.get_mut(descriptor.id()) {
                *degree += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<&PluginId>> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| Reverse(id))
        .collect();
    let mut order = Vec::with_capacity(enabled_ids.len());

    while let Some(Reverse(id)) = ready.pop() {
        order.push(id.clone());
        for &dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
    }

    if order.len() == enabled_ids.len() {
        Ok(order)
    } else {
        let mut cycle: Vec<PluginId> = in_degree
            .into_iter()
            .filter(|&(_, degree)| degree > 0)
            .map(|(id, _)| id.clone())
            .collect();
        cycle.sort();
        Err(cycle)
    }
}

fn log_plugins(registry: &PluginRegistry) {
    let mut pre_installed = Vec::new();
    let mut custom = Vec::new();
    let mut disabled = Vec::new();
    for descriptor in registry.plugins() {
        let name = descriptor.name().to_string();
        if !descriptor.is_enabled() {
            disabled.push(name);
        } else if descriptor.is_pre_installed() {
            pre_installed.push(name);
        } else {
            custom.push(name);
        }
    }
    pre_installed.sort();
    custom.sort();
    disabled.sort();
    log::info!("loaded pre-installed plugins: {}", pre_installed.join(", "));
    if !custom.is_empty() {
        log::info!("loaded custom plugins: {}", custom.join(", "));
    }
    if !disabled.is_empty() {
        log::info!("disabled plugins: {}", disabled.join(", "));
    }
}
