use thiserror::Error;

use crate::progress::Canceled;

/// Errors raised while loading or manipulating module root layers.
#[derive(Debug, Error)]
pub enum ModuleRootError {
    #[error(transparent)]
    Canceled(#[from] Canceled),
}
