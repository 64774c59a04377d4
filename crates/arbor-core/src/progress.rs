//! Cooperative progress reporting and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Raised when a long-running operation observes a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation was canceled")]
pub struct Canceled;

/// Sink for progress updates from long-running operations. Implementations
/// decide how (and whether) to surface text and fractions; cancellation is
/// polled by the operation itself at safe points.
pub trait ProgressIndicator {
    fn is_canceled(&self) -> bool;

    fn check_canceled(&self) -> Result<(), Canceled> {
        if self.is_canceled() { Err(Canceled) } else { Ok(()) }
    }

    fn set_text(&self, _text: &str) {}

    fn set_fraction(&self, _fraction: f64) {}
}

/// Indicator that reports nothing and is never canceled.
#[derive(Debug, Default)]
pub struct EmptyProgressIndicator;

impl ProgressIndicator for EmptyProgressIndicator {
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Shareable cancellation flag, usable as a minimal progress indicator.
#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl ProgressIndicator for CancellationFlag {
    fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
