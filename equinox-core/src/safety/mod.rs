//! Limit and fault checks, evaluated once per control poll

pub mod monitor;

pub use monitor::{Pointing, SafetyMonitor, SafetyStatus};
