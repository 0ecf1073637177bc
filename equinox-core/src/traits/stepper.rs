//! Stepper driver trait
//!
//! This trait abstracts the step/dir interface of the axis drivers
//! (TMC2209 in legacy mode, DRV8825, A4988, etc.). The motion core only
//! emits pulses and levels; timing is owned by the caller's tick.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Increasing step count
    Forward,
    /// Decreasing step count
    Reverse,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Direction of travel needed to cover a signed distance
    pub fn of(delta: i64) -> Option<Self> {
        match delta {
            d if d > 0 => Some(Direction::Forward),
            d if d < 0 => Some(Direction::Reverse),
            _ => None,
        }
    }

    /// +1 or -1
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Trait for step/dir stepper drivers
///
/// Implementations translate these calls into pin levels. `step` must
/// produce exactly one pulse and must not block beyond the pulse width.
pub trait StepperDriver {
    /// Set the direction pin level for the following pulses
    fn set_direction(&mut self, dir: Direction);

    /// Emit a single step pulse
    fn step(&mut self);

    /// Enable or disable the driver outputs
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn enable(&mut self, enabled: bool);

    /// Check if the driver outputs are enabled
    fn is_enabled(&self) -> bool;

    /// Select the microstep mode by driver-specific code
    fn set_microstep_code(&mut self, code: u8);

    /// Check the driver fault/diag input
    fn is_faulted(&self) -> bool;
}
