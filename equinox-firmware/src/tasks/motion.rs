//! High-rate motion task
//!
//! Runs the motion loop once per configured tick period. This is the only
//! task that touches the step pins or writes axis positions.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use equinox_core::mount::{MotionLoop, TickInputs};
use equinox_core::time::HW_TICKS_PER_SECOND;
use equinox_hal_rp2040::stepper::GpioStepper;

/// Motion loop over the board's two axis drivers
pub type BoardMotionLoop = MotionLoop<'static, GpioStepper<'static>>;

/// Hardware owned by the motion task
pub struct MotionHardware {
    /// Worm index sensor, active low
    pub index_sensor: Option<Input<'static>>,
}

/// Length of one motion tick
pub fn tick_duration(tick_period: u32) -> Duration {
    let micros = tick_period as u64 * 1_000_000 / HW_TICKS_PER_SECOND as u64;
    Duration::from_micros(micros.max(1))
}

/// Motion task
///
/// A late tick is run as soon as possible rather than skipped, so the
/// sidereal clock never loses time, it only jitters.
#[embassy_executor::task]
pub async fn motion_task(mut motion: BoardMotionLoop, hw: MotionHardware, period: Duration) {
    info!("Motion task started, tick {} us", period.as_micros());

    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;

        let inputs = TickInputs {
            index_sensor: hw.index_sensor.as_ref().is_some_and(|pin| pin.is_low()),
        };
        motion.tick(inputs);
    }
}
