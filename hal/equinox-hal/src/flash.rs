//! Flash storage abstractions
//!
//! A small key-value store for the records the mount keeps across power
//! cycles. Implementations own wear leveling; callers own validation of
//! what they read back.

/// Storage keys for persisted mount data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Runtime settings: site, sync offsets, clock calibration, park (postcard)
    MountSettings = 0,
    /// Mount configuration as TOML text, overriding the built-in file
    MountConfigToml = 1,
    /// Recorded periodic error correction table (postcard)
    PecTable = 2,
}

impl StorageKey {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::MountSettings),
            1 => Some(StorageKey::MountConfigToml),
            2 => Some(StorageKey::PecTable),
            _ => None,
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Wear-leveled key-value storage
///
/// A write replaces the previous value of its key. A read of a key that
/// was never written fails with [`FlashError::NotFound`].
pub trait FlashStorage {
    /// Read a value into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Write a value by key
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Check if a key exists in storage
    fn exists(&mut self, key: StorageKey) -> impl core::future::Future<Output = bool>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        match buffer.first_mut() {
            Some(byte) => {
                *byte = self.as_u8();
                Ok(1)
            }
            None => Err(sequential_storage::map::SerializationError::BufferTooSmall),
        }
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        let byte = buffer
            .first()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        match StorageKey::from_u8(*byte) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
