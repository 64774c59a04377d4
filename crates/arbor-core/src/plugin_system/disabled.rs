//! Persisted set of user-disabled plugin ids.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::plugin_system::descriptor::PluginId;
use crate::plugin_system::error::PluginSystemError;

/// The disabled-plugin list, stored as a small JSON file in the host's
/// configuration directory. A missing file is the empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledPlugins {
    #[serde(default)]
    ids: BTreeSet<String>,
}

impl DisabledPlugins {
    pub async fn load(path: &Path) -> Result<Self, PluginSystemError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(PluginSystemError::Io {
                    source: error,
                    operation: "read".to_string(),
                    path: path.to_path_buf(),
                });
            }
        };
        serde_json::from_str(&content).map_err(|error| PluginSystemError::DisabledList {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), PluginSystemError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|error| PluginSystemError::DisabledList {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?;
        fs::write(path, content).await.map_err(|error| PluginSystemError::Io {
            source: error,
            operation: "write".to_string(),
            path: path.to_path_buf(),
        })
    }

    pub fn is_disabled(&self, id: &PluginId) -> bool {
        self.ids.contains(id.as_str())
    }

    /// Returns whether the set changed.
    pub fn disable(&mut self, id: &PluginId) -> bool {
        self.ids.insert(id.as_str().to_string())
    }

    /// Returns whether the set changed.
    pub fn enable(&mut self, id: &PluginId) -> bool {
        self.ids.remove(id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id_set(&self) -> HashSet<PluginId> {
        self.ids.iter().map(|id| PluginId::new(id.clone())).collect()
    }
}
