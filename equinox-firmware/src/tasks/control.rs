//! Control task
//!
//! Owns the [`Mount`]: polls it at the control rate, feeds it PPS and ST4
//! events as they arrive, reads the limit switch and hands changed
//! settings and PEC tables to the storage task.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use equinox_core::mount::Mount;
use equinox_core::state::{ErrorCode, ParkState, PecState, TrackingState};

use crate::channels::{ControlEvent, CONTROL_EVENTS, SAVE_PEC, SAVE_SETTINGS};

/// Control poll interval in milliseconds
pub const CONTROL_INTERVAL_MS: u64 = 20;

/// Inputs sampled by the control task
pub struct ControlInputs {
    /// Axis limit switch chain, active low
    pub limit_switch: Option<Input<'static>>,
}

/// State last reported, for logging transitions only
#[derive(PartialEq)]
struct Reported {
    error: ErrorCode,
    tracking: TrackingState,
    park: ParkState,
    pec: PecState,
    slewing: bool,
    pps_synced: bool,
}

/// Control task
#[embassy_executor::task]
pub async fn control_task(mut mount: Mount<'static>, inputs: ControlInputs) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_INTERVAL_MS));
    let mut reported: Option<Reported> = None;

    loop {
        match select(ticker.next(), CONTROL_EVENTS.receive()).await {
            Either::First(()) => {
                if let Some(pin) = &inputs.limit_switch {
                    mount.set_limit_sense(pin.is_low());
                }
                mount.poll();
                hand_off_records(&mut mount);
                log_transitions(&mount, &mut reported);
            }
            Either::Second(event) => handle_event(&mut mount, event),
        }
    }
}

fn handle_event(mount: &mut Mount<'static>, event: ControlEvent) {
    let result = match event {
        ControlEvent::PpsPulse(micros) => mount.pps_pulse(micros),
        ControlEvent::PpsLost => mount.pps_lost(),
        ControlEvent::Guide { dir, active: true } => mount.st4_guide(dir),
        ControlEvent::Guide { dir, active: false } => mount.stop_guide(Some(dir)),
    };
    if let Err(e) = result {
        debug!("{:?} rejected: {:?}", event, e);
    }
}

/// Pass dirty records to the storage task without waiting for the write
fn hand_off_records(mount: &mut Mount<'static>) {
    if let Some(settings) = mount.take_dirty_settings() {
        SAVE_SETTINGS.signal(settings);
    }
    if let Some(record) = mount.take_dirty_pec() {
        SAVE_PEC.signal(record);
    }
}

fn log_transitions(mount: &Mount<'static>, reported: &mut Option<Reported>) {
    let status = mount.status();
    let now = Reported {
        error: status.last_error,
        tracking: status.tracking,
        park: status.park,
        pec: status.pec,
        slewing: status.slewing,
        pps_synced: status.pps_synced,
    };

    if reported.as_ref() == Some(&now) {
        return;
    }

    if now.error != ErrorCode::None
        && reported.as_ref().map(|r| r.error) != Some(now.error)
    {
        warn!("Mount error: {:?}", now.error);
    }
    info!(
        "Tracking {:?}, park {:?}, PEC {:?}, slewing {}, PPS {}",
        now.tracking, now.park, now.pec, now.slewing, now.pps_synced
    );
    *reported = Some(now);
}
