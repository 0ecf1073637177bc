//! Configuration loading
//!
//! The mount description comes from a TOML file: the copy embedded at
//! build time, or an override stored in flash.

pub mod loader;

pub use loader::{load_mount_config, ConfigLoadError};
