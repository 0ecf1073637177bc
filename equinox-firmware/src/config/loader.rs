//! Mount configuration loading
//!
//! Looks for a TOML override in flash first and falls back to the
//! `mount.toml` embedded at build time. Whatever is chosen must pass
//! `MountConfig::validate`; a bad override never stops the mount from
//! booting on the embedded file.

use core::str;
use defmt::*;

use equinox_core::config::{parse_config, ConfigError, MountConfig, ParseError};
use equinox_hal_rp2040::flash::{FlashError, StorageKey};
use equinox_hal_rp2040::FlashStorageTrait;

/// Embedded default configuration (compiled into firmware)
/// Edit mount.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../mount.toml");

/// Maximum TOML config size stored in flash
const MAX_TOML_SIZE: usize = 2048;

/// Configuration loading errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigLoadError {
    /// Flash operation failed
    Flash(FlashError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML parsing failed
    Parse(ParseError),
    /// Parsed but rejected by validation
    Invalid(ConfigError),
}

impl From<FlashError> for ConfigLoadError {
    fn from(e: FlashError) -> Self {
        ConfigLoadError::Flash(e)
    }
}

/// Load the mount configuration
///
/// Flash override, then the embedded file, then compiled defaults.
pub async fn load_mount_config<S: FlashStorageTrait>(storage: &mut S) -> MountConfig {
    match load_override(storage).await {
        Ok(config) => {
            info!("Loaded mount configuration from flash");
            log_config_summary(&config);
            return config;
        }
        Err(ConfigLoadError::Flash(FlashError::NotFound)) => {
            debug!("No configuration override in flash");
        }
        Err(e) => {
            warn!("Ignoring configuration override: {:?}", e);
        }
    }

    match parse_and_validate(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Using embedded mount.toml");
            log_config_summary(&config);
            config
        }
        Err(e) => {
            // build.rs validates the file, so this is a parser/validator mismatch
            error!("Embedded mount.toml rejected: {:?}", e);
            error!("Using compiled defaults");
            MountConfig::default()
        }
    }
}

async fn load_override<S: FlashStorageTrait>(
    storage: &mut S,
) -> Result<MountConfig, ConfigLoadError> {
    let mut buffer = [0u8; MAX_TOML_SIZE];
    let len = storage
        .read(StorageKey::MountConfigToml, &mut buffer)
        .await?;

    debug!("Read {} bytes of TOML from flash", len);

    let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigLoadError::InvalidUtf8)?;
    parse_and_validate(toml_str)
}

fn parse_and_validate(input: &str) -> Result<MountConfig, ConfigLoadError> {
    let config = parse_config(input).map_err(ConfigLoadError::Parse)?;
    config.validate().map_err(ConfigLoadError::Invalid)?;
    Ok(config)
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &MountConfig) {
    info!(
        "Mount: {:?}, tick {} hw ticks, {} ticks/s",
        config.kind,
        config.tick_period,
        config.ticks_per_second()
    );
    info!(
        "Axis 1: {} steps/deg, backlash {}; axis 2: {} steps/deg, backlash {}",
        config.axis1.steps_per_degree,
        config.axis1.backlash_steps,
        config.axis2.steps_per_degree,
        config.axis2.backlash_steps
    );
    info!(
        "PEC: {} slots over {} steps, index sensor {}",
        config.pec.slots,
        config.pec.steps_per_worm_rotation,
        config.pec.has_index_sensor
    );
}
