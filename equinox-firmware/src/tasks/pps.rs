//! GPS pulse-per-second input
//!
//! Timestamps rising edges and reports the interval between consecutive
//! edges to the control task, which feeds the sidereal clock. The clock
//! itself rejects intervals outside its acceptance band.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration, Instant};

use crate::channels::{ControlEvent, CONTROL_EVENTS};

/// No edge for this long means the receiver lost its fix
const PPS_TIMEOUT: Duration = Duration::from_millis(2_500);

/// PPS task
#[embassy_executor::task]
pub async fn pps_task(mut pin: Input<'static>) {
    info!("PPS task started");

    let mut last_edge: Option<Instant> = None;

    loop {
        match with_timeout(PPS_TIMEOUT, pin.wait_for_rising_edge()).await {
            Ok(()) => {
                let now = Instant::now();
                if let Some(last) = last_edge {
                    let micros = (now - last).as_micros().min(u32::MAX as u64) as u32;
                    trace!("PPS interval {} us", micros);
                    if CONTROL_EVENTS.try_send(ControlEvent::PpsPulse(micros)).is_err() {
                        warn!("Control channel full, PPS sample dropped");
                    }
                } else {
                    info!("PPS signal acquired");
                }
                last_edge = Some(now);
            }
            Err(_) => {
                if last_edge.take().is_some() {
                    warn!("PPS signal lost");
                    // Losing the signal must reach the clock, so wait for room
                    CONTROL_EVENTS.send(ControlEvent::PpsLost).await;
                }
            }
        }
    }
}
