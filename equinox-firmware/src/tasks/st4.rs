//! ST4 autoguider port
//!
//! Four opto-isolated inputs, active low. Each change of a line is
//! forwarded to the control task as a guide start or stop.

use defmt::*;
use embassy_futures::select::select4;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Timer};

use equinox_core::guide::GuideDirection;

use crate::channels::{ControlEvent, CONTROL_EVENTS};

/// Contact settling time after an edge
const DEBOUNCE: Duration = Duration::from_millis(2);

/// ST4 input lines
pub struct St4Pins {
    pub north: Input<'static>,
    pub south: Input<'static>,
    pub east: Input<'static>,
    pub west: Input<'static>,
}

impl St4Pins {
    /// Asserted state of each line, in [`DIRECTIONS`] order
    fn levels(&self) -> [bool; 4] {
        [
            self.north.is_low(),
            self.south.is_low(),
            self.east.is_low(),
            self.west.is_low(),
        ]
    }
}

const DIRECTIONS: [GuideDirection; 4] = [
    GuideDirection::North,
    GuideDirection::South,
    GuideDirection::East,
    GuideDirection::West,
];

/// ST4 task
#[embassy_executor::task]
pub async fn st4_task(mut pins: St4Pins) {
    info!("ST4 task started");

    let mut last = [false; 4];

    loop {
        select4(
            pins.north.wait_for_any_edge(),
            pins.south.wait_for_any_edge(),
            pins.east.wait_for_any_edge(),
            pins.west.wait_for_any_edge(),
        )
        .await;
        Timer::after(DEBOUNCE).await;

        let levels = pins.levels();
        for ((dir, active), was) in DIRECTIONS.iter().zip(levels).zip(last) {
            if active != was {
                debug!("ST4 {:?} {}", dir, if active { "on" } else { "off" });
                CONTROL_EVENTS
                    .send(ControlEvent::Guide { dir: *dir, active })
                    .await;
            }
        }
        last = levels;
    }
}
