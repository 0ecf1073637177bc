//! Board-agnostic motion core for the telescope mount firmware
//!
//! This crate contains all mount logic that does not depend on specific
//! hardware implementations:
//!
//! - Sidereal clock with PPS discipline
//! - Per-axis step generation (rate superposition, ramps, backlash)
//! - Guiding overlay and periodic error correction
//! - Goto, park and meridian-flip coordination
//! - Safety limits, status snapshots and persisted settings
//!
//! Two execution contexts share state through [`shared`]: the high-rate
//! [`mount::MotionLoop`] owns every axis and is the only writer of step
//! positions, while the control-rate [`mount::Mount`] owns the state
//! machines and talks to the loop through a bounded command queue.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod goto;
pub mod guide;
pub mod motion;
pub mod mount;
pub mod pec;
#[cfg(feature = "serde")]
pub mod persist;
pub mod safety;
pub mod shared;
pub mod state;
pub mod status;
pub mod time;
pub mod traits;

/// Mount axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Right ascension / hour angle (or azimuth on alt-az mounts)
    Primary,
    /// Declination (or altitude on alt-az mounts)
    Secondary,
}

impl Axis {
    /// Both axes, primary first
    pub const ALL: [Axis; 2] = [Axis::Primary, Axis::Secondary];

    /// Array index for per-axis storage
    pub const fn index(self) -> usize {
        match self {
            Axis::Primary => 0,
            Axis::Secondary => 1,
        }
    }
}
