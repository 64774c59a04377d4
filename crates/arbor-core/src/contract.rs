//! Caller-contract enforcement.
//!
//! Contract violations (use after dispose, writes to a committed layer,
//! invalid rearrangements, double registry initialization) are programming
//! errors, not runtime conditions: they panic in development builds and are
//! logged loudly in release builds, where the offending operation becomes a
//! no-op.

/// Reports a broken caller contract. Fatal under `debug_assertions`.
pub(crate) fn violation(message: &str) {
    if cfg!(debug_assertions) {
        panic!("contract violation: {message}");
    }
    log::error!("contract violation: {message}");
}

/// Checks a caller contract, reporting a violation when it does not hold.
/// Returns the condition so release builds can skip the guarded operation.
pub(crate) fn require(condition: bool, message: &str) -> bool {
    if !condition {
        violation(message);
    }
    condition
}
