use std::path::PathBuf;

use thiserror::Error;

/// Errors specific to plugin descriptor loading and validation.
#[derive(Debug, Error)]
pub enum PluginSystemError {
    #[error("failed to parse plugin descriptor at '{}': {message}", path.display())]
    DescriptorParse {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    #[error("I/O error during '{operation}' on '{}': {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        operation: String,
        path: PathBuf,
    },

    #[error("failed to process disabled plugin list at '{}': {message}", path.display())]
    DisabledList { path: PathBuf, message: String },
}
