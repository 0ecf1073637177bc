//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! The motion task is not on this list: it talks to the control task only
//! through the lock-free command queue and telemetry in `equinox_core::shared`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use equinox_core::config::{MountSettings, PecRecord};
use equinox_core::guide::GuideDirection;

/// Channel capacity for control events
const CONTROL_CHANNEL_SIZE: usize = 8;

/// Inputs the control task reacts to between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// Interval between two PPS edges, in microseconds
    PpsPulse(u32),
    /// No PPS edge for longer than the timeout
    PpsLost,
    /// ST4 guide line asserted or released
    Guide {
        dir: GuideDirection,
        active: bool,
    },
}

/// Events for the control task (PPS and ST4 inputs)
pub static CONTROL_EVENTS: Channel<CriticalSectionRawMutex, ControlEvent, CONTROL_CHANNEL_SIZE> =
    Channel::new();

/// Latest settings waiting to be written (a newer record replaces an older one)
pub static SAVE_SETTINGS: Signal<CriticalSectionRawMutex, MountSettings> = Signal::new();

/// Latest PEC table waiting to be written
pub static SAVE_PEC: Signal<CriticalSectionRawMutex, PecRecord> = Signal::new();
