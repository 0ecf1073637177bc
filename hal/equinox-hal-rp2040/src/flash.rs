//! Flash storage driver for RP2040
//!
//! Wear-leveled key-value storage in the last 64KB of flash, on top of
//! sequential-storage. Implements `equinox_hal::FlashStorage`.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use equinox_hal::flash::{FlashError, StorageKey};

/// 2MB QSPI flash on the reference board
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
/// Settings partition at the end of flash
pub const STORAGE_PARTITION_SIZE: usize = 64 * 1024;
pub const STORAGE_PARTITION_START: usize = FLASH_SIZE - STORAGE_PARTITION_SIZE;

pub const FLASH_ERASE_SIZE: usize = ERASE_SIZE;

pub const STORAGE_RANGE: core::ops::Range<u32> =
    (STORAGE_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Largest item stored, key and framing included (a full PEC table)
const ITEM_BUFFER_SIZE: usize = 2048;

const _: () = assert!(STORAGE_PARTITION_SIZE % FLASH_ERASE_SIZE == 0);

/// RP2040 flash storage
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }
}

impl equinox_hal::FlashStorage for Rp2040FlashStorage<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut item_buffer = [0u8; ITEM_BUFFER_SIZE];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut item_buffer,
            &key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let out = buffer
                    .get_mut(..data.len())
                    .ok_or(FlashError::BufferTooSmall)?;
                out.copy_from_slice(data);
                Ok(data.len())
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(_) => Err(FlashError::Storage),
        }
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let mut item_buffer = [0u8; ITEM_BUFFER_SIZE];

        map::store_item(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut item_buffer,
            &key,
            &data,
        )
        .await
        .map_err(|e| match e {
            sequential_storage::Error::FullStorage => FlashError::Full,
            sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
            sequential_storage::Error::Storage { .. } => FlashError::Flash,
            _ => FlashError::Storage,
        })
    }

    async fn exists(&mut self, key: StorageKey) -> bool {
        let mut item_buffer = [0u8; ITEM_BUFFER_SIZE];

        matches!(
            map::fetch_item::<StorageKey, &[u8], _>(
                &mut self.flash,
                STORAGE_RANGE,
                &mut NoCache::new(),
                &mut item_buffer,
                &key,
            )
            .await,
            Ok(Some(_))
        )
    }
}
