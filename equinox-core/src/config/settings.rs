//! Persisted runtime settings
//!
//! Values the operator changes at runtime (site, sync offsets, clock
//! calibration, park position, policies) and the recorded PEC table.
//! Both records carry a magic, a version and a CRC32 so stale or corrupt
//! flash contents fall back to compiled defaults.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use heapless::Vec;

use super::types::{MountConfig, SiteConfig, MAX_PEC_SLOTS};
use crate::motion::RateCompensationMode;
use crate::state::{MeridianFlipPolicy, PierSide, PreferredPierSide};

/// Magic number to identify valid settings ("EQNX")
pub const SETTINGS_MAGIC: u32 = 0x4551_4E58;

/// Current settings version
pub const SETTINGS_VERSION: u8 = 1;

/// Magic number to identify a valid PEC table ("PECT")
pub const PEC_MAGIC: u32 = 0x5045_4354;

/// Current PEC table version
pub const PEC_VERSION: u8 = 1;

/// Saved park position
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParkPosition {
    /// Axis angles in degrees
    pub axis_deg: [f64; 2],
    pub pier_side: PierSide,
}

/// Runtime settings stored in flash
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MountSettings {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    pub site: SiteConfig,
    /// Axis angle (degrees) at step position zero, moved by syncs
    pub index_deg: [f64; 2],
    /// Sidereal interval offset from nominal, in hardware ticks
    pub sidereal_interval_delta: i32,
    pub park: Option<ParkPosition>,
    /// The mount was parked when the settings were saved
    pub parked: bool,
    pub meridian_flip: MeridianFlipPolicy,
    pub preferred_pier_side: PreferredPierSide,
    pub rate_compensation: RateCompensationMode,
    pub pause_at_home: bool,
    pub auto_meridian_flip: bool,
    /// CRC32 checksum (calculated over magic..auto_meridian_flip)
    pub crc: u32,
}

impl MountSettings {
    /// Compiled defaults taken from the static configuration
    pub fn from_config(config: &MountConfig) -> Self {
        let mut settings = Self {
            magic: SETTINGS_MAGIC,
            version: SETTINGS_VERSION,
            site: config.site,
            index_deg: config.home_deg,
            sidereal_interval_delta: 0,
            park: None,
            parked: false,
            meridian_flip: config.meridian_flip,
            preferred_pier_side: config.preferred_pier_side,
            rate_compensation: config.rate_compensation,
            pause_at_home: config.pause_at_home,
            auto_meridian_flip: config.auto_meridian_flip,
            crc: 0,
        };
        settings.update_crc();
        settings
    }

    /// Check if the data is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == SETTINGS_MAGIC && self.version == SETTINGS_VERSION
    }

    /// Calculate CRC32 for the data (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;

        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.site.latitude_deg.to_le_bytes());
        crc = crc32_update(crc, &self.site.longitude_deg.to_le_bytes());
        for index in &self.index_deg {
            crc = crc32_update(crc, &index.to_le_bytes());
        }
        crc = crc32_update(crc, &self.sidereal_interval_delta.to_le_bytes());
        match &self.park {
            Some(park) => {
                crc = crc32_update(crc, &[1]);
                for deg in &park.axis_deg {
                    crc = crc32_update(crc, &deg.to_le_bytes());
                }
                crc = crc32_update(crc, &[park.pier_side as u8]);
            }
            None => crc = crc32_update(crc, &[0]),
        }
        crc = crc32_update(
            crc,
            &[
                self.parked as u8,
                self.meridian_flip as u8,
                self.preferred_pier_side as u8,
                self.rate_compensation as u8,
                self.pause_at_home as u8,
                self.auto_meridian_flip as u8,
            ],
        );

        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// Recorded PEC table stored in flash
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PecRecord {
    pub magic: u32,
    pub version: u8,
    /// Correction per slot in steps
    pub slots: Vec<i8, MAX_PEC_SLOTS>,
    pub crc: u32,
}

impl Default for PecRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl PecRecord {
    /// Create an empty record
    pub const fn new() -> Self {
        Self {
            magic: PEC_MAGIC,
            version: PEC_VERSION,
            slots: Vec::new(),
            crc: 0,
        }
    }

    /// Build a record from table contents, truncating to the slot limit
    pub fn from_slots(values: &[i8]) -> Self {
        let mut record = Self::new();
        let len = values.len().min(MAX_PEC_SLOTS);
        // Cannot fail: len is bounded by capacity
        let _ = record.slots.extend_from_slice(&values[..len]);
        record.update_crc();
        record
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PEC_MAGIC && self.version == PEC_VERSION
    }

    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &(self.slots.len() as u16).to_le_bytes());
        for value in &self.slots {
            crc = crc32_update(crc, &[*value as u8]);
        }
        !crc
    }

    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
