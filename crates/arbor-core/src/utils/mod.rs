//! Shared helpers used across subsystems.

pub mod xml;
