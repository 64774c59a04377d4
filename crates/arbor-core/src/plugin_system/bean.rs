//! Raw `plugin.xml` parsing.
//!
//! [`PluginBean`] is the untyped, file-shaped form of a descriptor. It keeps
//! whatever the XML said; interpretation (implicit dependencies, status,
//! classpath) happens when it is turned into a
//! [`PluginDescriptor`](crate::plugin_system::descriptor::PluginDescriptor).

use std::collections::HashMap;
use std::path::Path;

use xmltree::Element;

use crate::plugin_system::descriptor::{PluginId, PluginVendor};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::permissions::{PluginPermissionDescriptor, PluginPermissionType};
use crate::utils::xml;

const PERMISSION_TYPE_ATTR: &str = "type";

/// One `<depends>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDependencyBean {
    pub id: PluginId,
    pub optional: bool,
}

/// Parsed but uninterpreted contents of a `plugin.xml`.
#[derive(Debug, Clone)]
pub struct PluginBean {
    pub id: PluginId,
    pub name: String,
    pub version: Option<String>,
    pub platform_version: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub vendor: PluginVendor,
    pub dependencies: Vec<PluginDependencyBean>,
    pub incompatible_with: Vec<PluginId>,
    pub permissions: HashMap<PluginPermissionType, PluginPermissionDescriptor>,
    pub tags: Vec<String>,
    pub experimental: bool,
    /// `<actions>` blocks carried verbatim for the action system to consume.
    pub actions: Vec<Element>,
}

impl PluginBean {
    pub fn parse(bytes: &[u8], source: &Path) -> Result<PluginBean, PluginSystemError> {
        let root = xml::parse_bytes(bytes).map_err(|error| PluginSystemError::DescriptorParse {
            path: source.to_path_buf(),
            message: format!("invalid descriptor XML: {error}"),
            source: Some(Box::new(error)),
        })?;
        Self::from_element(&root, source)
    }

    pub fn from_element(root: &Element, source: &Path) -> Result<PluginBean, PluginSystemError> {
        let name = xml::child_text(root, "name");
        // <id> falls back to <name>; a descriptor with neither is rejected
        let id = match xml::child_text(root, "id").or_else(|| name.clone()) {
            Some(id) => id,
            None => {
                return Err(PluginSystemError::DescriptorParse {
                    path: source.to_path_buf(),
                    message: "descriptor declares neither <id> nor <name>".to_string(),
                    source: None,
                });
            }
        };
        let name = name.unwrap_or_else(|| id.clone());

        let mut bean = PluginBean {
            id: PluginId::new(id),
            name,
            version: xml::child_text(root, "version"),
            platform_version: xml::child_text(root, "platformVersion"),
            category: xml::child_text(root, "category"),
            description: xml::child_text(root, "description"),
            vendor: PluginVendor::default(),
            dependencies: Vec::new(),
            incompatible_with: Vec::new(),
            permissions: HashMap::new(),
            tags: Vec::new(),
            experimental: false,
            actions: Vec::new(),
        };

        if let Some(vendor) = root.get_child("vendor") {
            bean.vendor = PluginVendor {
                name: xml::text_of(vendor),
                email: xml::attr(vendor, "email").map(str::to_string),
                url: xml::attr(vendor, "url").map(str::to_string),
            };
        }

        for child in xml::child_elements(root) {
            match child.name.as_str() {
                "depends" => {
                    if let Some(id) = xml::text_of(child) {
                        bean.dependencies.push(PluginDependencyBean {
                            id: PluginId::new(id),
                            optional: xml::bool_attr(child, "optional"),
                        });
                    }
                }
                "incompatible-with" => {
                    if let Some(id) = xml::text_of(child) {
                        bean.incompatible_with.push(PluginId::new(id));
                    }
                }
                "tags" => {
                    for tag in xml::child_elements(child) {
                        if let Some(tag) = xml::text_of(tag) {
                            bean.tags.push(tag);
                        }
                    }
                }
                "experimental" => {
                    bean.experimental = xml::text_of(child).as_deref() == Some("true");
                }
                "permissions" => parse_permissions(child, source, &mut bean.permissions),
                "actions" => bean.actions.push(child.clone()),
                _ => {}
            }
        }

        Ok(bean)
    }
}

/// Permission requests with a type this build does not know are dropped,
/// never failed on: a newer descriptor must stay loadable.
fn parse_permissions(
    block: &Element,
    source: &Path,
    permissions: &mut HashMap<PluginPermissionType, PluginPermissionDescriptor>,
) {
    for permission in xml::child_elements(block).filter(|child| child.name == "permission") {
        let Some(raw_type) = xml::attr(permission, PERMISSION_TYPE_ATTR) else {
            log::warn!(
                "permission without type attribute in '{}'",
                source.display()
            );
            continue;
        };
        let permission_type = match raw_type.parse::<PluginPermissionType>() {
            Ok(permission_type) => permission_type,
            Err(_) => {
                log::warn!(
                    "dropping unknown permission type '{raw_type}' in '{}'",
                    source.display()
                );
                continue;
            }
        };
        let descriptor = permissions
            .entry(permission_type)
            .or_insert_with(|| PluginPermissionDescriptor::new(permission_type));
        for option in xml::child_elements(permission).filter(|child| child.name == "allow-option") {
            if let Some(scope) = xml::text_of(option) {
                descriptor.add_scope(scope);
            }
        }
    }
}
