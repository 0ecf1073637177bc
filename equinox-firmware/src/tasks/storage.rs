//! Persistence task
//!
//! Writes settings and PEC tables handed over by the control task. Flash
//! erases are slow, so the control task never waits on them.

use defmt::*;
use embassy_futures::select::{select, Either};

use equinox_core::persist;
use equinox_hal_rp2040::flash::Rp2040FlashStorage;

use crate::channels::{SAVE_PEC, SAVE_SETTINGS};

/// Storage task
#[embassy_executor::task]
pub async fn storage_task(mut storage: Rp2040FlashStorage<'static>) {
    info!("Storage task started");

    loop {
        match select(SAVE_SETTINGS.wait(), SAVE_PEC.wait()).await {
            Either::First(mut settings) => {
                match persist::save_settings(&mut storage, &mut settings).await {
                    Ok(()) => debug!("Settings saved"),
                    Err(e) => error!("Failed to save settings: {:?}", e),
                }
            }
            Either::Second(mut record) => {
                match persist::save_pec_table(&mut storage, &mut record).await {
                    Ok(()) => info!("PEC table saved, {} slots", record.slots.len()),
                    Err(e) => error!("Failed to save PEC table: {:?}", e),
                }
            }
        }
    }
}
