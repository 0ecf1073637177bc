//! Configuration types
//!
//! Static mount description ([`MountConfig`]), parsed from TOML at boot,
//! and runtime settings ([`MountSettings`]) persisted as postcard binary.

pub mod parse;
pub mod settings;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use settings::{MountSettings, ParkPosition, PecRecord};
pub use types::*;
