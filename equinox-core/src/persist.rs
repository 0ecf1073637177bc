//! Settings and PEC table persistence
//!
//! Records are postcard-encoded and carry their own magic, version and
//! CRC32. Anything missing, unreadable or stale is reported and replaced
//! by compiled defaults; persistence never stops the mount from starting.

use equinox_hal::{FlashError, FlashStorage, StorageKey};

use crate::config::{MountConfig, MountSettings, PecRecord, MAX_PEC_SLOTS};

/// Upper bound on an encoded [`MountSettings`]
const MAX_SETTINGS_SIZE: usize = 256;

/// Upper bound on an encoded [`PecRecord`] (one byte per slot plus header)
const MAX_PEC_SIZE: usize = MAX_PEC_SLOTS + 32;

/// Persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Flash operation failed
    Flash(FlashError),
    /// Stored bytes do not decode
    Deserialize,
    /// Record does not fit the encode buffer
    Serialize,
    /// CRC check failed
    CrcMismatch,
    /// Invalid magic or version
    InvalidFormat,
    /// PEC table does not match the configured slot count
    SlotMismatch,
}

impl From<FlashError> for PersistError {
    fn from(e: FlashError) -> Self {
        PersistError::Flash(e)
    }
}

/// Load runtime settings, falling back to the defaults of `config`
pub async fn load_settings<S: FlashStorage>(storage: &mut S, config: &MountConfig) -> MountSettings {
    match read_settings(storage).await {
        Ok(settings) => {
            info!(
                "loaded settings: interval delta {}, parked {}",
                settings.sidereal_interval_delta,
                settings.parked
            );
            settings
        }
        Err(PersistError::Flash(FlashError::NotFound)) => {
            debug!("no settings in flash, using defaults");
            MountSettings::from_config(config)
        }
        Err(e) => {
            warn!("failed to load settings: {}, using defaults", e);
            MountSettings::from_config(config)
        }
    }
}

async fn read_settings<S: FlashStorage>(storage: &mut S) -> Result<MountSettings, PersistError> {
    let mut buffer = [0u8; MAX_SETTINGS_SIZE];
    let len = storage.read(StorageKey::MountSettings, &mut buffer).await?;

    let settings: MountSettings =
        postcard::from_bytes(&buffer[..len]).map_err(|_| PersistError::Deserialize)?;
    if !settings.is_valid() {
        return Err(PersistError::InvalidFormat);
    }
    if !settings.verify_crc() {
        return Err(PersistError::CrcMismatch);
    }
    Ok(settings)
}

/// Save runtime settings
///
/// Updates the CRC before saving.
pub async fn save_settings<S: FlashStorage>(
    storage: &mut S,
    settings: &mut MountSettings,
) -> Result<(), PersistError> {
    settings.update_crc();

    let mut buffer = [0u8; MAX_SETTINGS_SIZE];
    let bytes = postcard::to_slice(settings, &mut buffer).map_err(|_| PersistError::Serialize)?;
    storage.write(StorageKey::MountSettings, bytes).await?;

    debug!("saved {} bytes of settings", bytes.len());
    Ok(())
}

/// Load the PEC table recorded for a worm with `slots` buffer slots
///
/// A table recorded with a different slot count is discarded.
pub async fn load_pec_table<S: FlashStorage>(storage: &mut S, slots: u16) -> Option<PecRecord> {
    match read_pec_table(storage, slots).await {
        Ok(record) => {
            info!("loaded PEC table, {} slots", record.slots.len());
            Some(record)
        }
        Err(PersistError::Flash(FlashError::NotFound)) => {
            debug!("no PEC table in flash");
            None
        }
        Err(e) => {
            warn!("failed to load PEC table: {}", e);
            None
        }
    }
}

async fn read_pec_table<S: FlashStorage>(storage: &mut S, slots: u16) -> Result<PecRecord, PersistError> {
    let mut buffer = [0u8; MAX_PEC_SIZE];
    let len = storage.read(StorageKey::PecTable, &mut buffer).await?;

    let record: PecRecord =
        postcard::from_bytes(&buffer[..len]).map_err(|_| PersistError::Deserialize)?;
    if !record.is_valid() {
        return Err(PersistError::InvalidFormat);
    }
    if !record.verify_crc() {
        return Err(PersistError::CrcMismatch);
    }
    if record.slots.len() != slots as usize {
        return Err(PersistError::SlotMismatch);
    }
    Ok(record)
}

/// Save a PEC table
///
/// An empty record is written as-is so a cleared table stays cleared
/// after a restart.
pub async fn save_pec_table<S: FlashStorage>(
    storage: &mut S,
    record: &mut PecRecord,
) -> Result<(), PersistError> {
    record.update_crc();

    let mut buffer = [0u8; MAX_PEC_SIZE];
    let bytes = postcard::to_slice(record, &mut buffer).map_err(|_| PersistError::Serialize)?;
    storage.write(StorageKey::PecTable, bytes).await?;

    debug!("saved PEC table, {} slots", record.slots.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParkPosition;
    use crate::state::PierSide;
    use embassy_futures::block_on;
    use std::collections::BTreeMap;
    use std::vec::Vec;

    #[derive(Default)]
    struct MemoryStorage {
        records: BTreeMap<u8, Vec<u8>>,
    }

    impl FlashStorage for MemoryStorage {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            let data = self.records.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
            let out = buffer
                .get_mut(..data.len())
                .ok_or(FlashError::BufferTooSmall)?;
            out.copy_from_slice(data);
            Ok(data.len())
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            self.records.insert(key.as_u8(), data.to_vec());
            Ok(())
        }

        async fn exists(&mut self, key: StorageKey) -> bool {
            self.records.contains_key(&key.as_u8())
        }
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let config = MountConfig::default();
        let mut storage = MemoryStorage::default();
        let settings = block_on(load_settings(&mut storage, &config));
        assert_eq!(settings, MountSettings::from_config(&config));
    }

    #[test]
    fn test_settings_survive_restart() {
        let config = MountConfig::default();
        let mut storage = MemoryStorage::default();

        let mut settings = MountSettings::from_config(&config);
        settings.sidereal_interval_delta = -340;
        settings.index_deg = [91.5, 88.25];
        settings.parked = true;
        settings.park = Some(ParkPosition {
            axis_deg: [90.0, 0.0],
            pier_side: PierSide::East,
        });
        block_on(save_settings(&mut storage, &mut settings)).unwrap();
        assert!(block_on(storage.exists(StorageKey::MountSettings)));

        let loaded = block_on(load_settings(&mut storage, &config));
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let config = MountConfig::default();
        let mut storage = MemoryStorage::default();
        let mut settings = MountSettings::from_config(&config);
        settings.sidereal_interval_delta = 55;
        block_on(save_settings(&mut storage, &mut settings)).unwrap();

        // Flip a bit in the stored magic
        let stored = storage
            .records
            .get_mut(&StorageKey::MountSettings.as_u8())
            .unwrap();
        stored[0] ^= 0x01;

        assert!(block_on(read_settings(&mut storage)).is_err());
        let loaded = block_on(load_settings(&mut storage, &config));
        assert_eq!(loaded, MountSettings::from_config(&config));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let config = MountConfig::default();
        let mut storage = MemoryStorage::default();
        let mut settings = MountSettings::from_config(&config);
        settings.version = 0;
        settings.update_crc();

        let mut buffer = [0u8; MAX_SETTINGS_SIZE];
        let bytes = postcard::to_slice(&settings, &mut buffer).unwrap();
        block_on(storage.write(StorageKey::MountSettings, bytes)).unwrap();

        assert_eq!(
            block_on(read_settings(&mut storage)),
            Err(PersistError::InvalidFormat)
        );
    }

    #[test]
    fn test_pec_table_round_trip() {
        let mut storage = MemoryStorage::default();
        assert_eq!(block_on(load_pec_table(&mut storage, 4)), None);

        let mut record = PecRecord::from_slots(&[3, -1, 0, 7]);
        block_on(save_pec_table(&mut storage, &mut record)).unwrap();

        assert_eq!(block_on(load_pec_table(&mut storage, 4)), Some(record));
        assert_eq!(
            block_on(read_pec_table(&mut storage, 8)),
            Err(PersistError::SlotMismatch)
        );
    }

    #[test]
    fn test_full_pec_table_fits() {
        let mut storage = MemoryStorage::default();
        let values = [-128i8; MAX_PEC_SLOTS];
        let mut record = PecRecord::from_slots(&values);
        block_on(save_pec_table(&mut storage, &mut record)).unwrap();

        let loaded = block_on(load_pec_table(&mut storage, MAX_PEC_SLOTS as u16)).unwrap();
        assert_eq!(loaded.slots.len(), MAX_PEC_SLOTS);
    }
}
