//! Crate-wide error type aggregating the subsystem errors.

use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::module_roots::error::ModuleRootError;
use crate::plugin_system::error::PluginSystemError;
use crate::progress::Canceled;

/// Top-level error for hosts that drive both subsystems through one result
/// type. Subsystem APIs return their own error enums; this aggregates them.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("module root error: {0}")]
    ModuleRoot(#[from] ModuleRootError),

    #[error(transparent)]
    Canceled(#[from] Canceled),

    #[error("I/O error during '{operation}' on '{}': {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        operation: String,
        path: PathBuf,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            source,
            operation: operation.into(),
            path: path.into(),
        }
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Other(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Other(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
