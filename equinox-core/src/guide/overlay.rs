//! Guide overlay
//!
//! A continuous guide adds a signed rate to one axis until stopped. A
//! pulse guide instead carries a fixed amount of motion, measured in
//! sidereal-rate ticks, and stops itself once that amount is used up.
//! Each axis carries at most one action; a new one replaces the old.

use crate::traits::Direction;
use crate::Axis;

/// Guide action on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuideAction {
    Idle,
    /// Open-ended rate in multiples of sidereal
    Continuous { dir: Direction, rate_x: f64 },
    /// Fixed amount of motion still to apply, in rate × ticks
    Pulse {
        dir: Direction,
        rate_x: f64,
        remaining: f64,
    },
}

/// Guide state for both axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideOverlay {
    actions: [GuideAction; 2],
}

impl Default for GuideOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl GuideOverlay {
    pub const fn new() -> Self {
        Self {
            actions: [GuideAction::Idle; 2],
        }
    }

    pub fn action(&self, axis: Axis) -> GuideAction {
        self.actions[axis.index()]
    }

    /// Guide continuously until [`Self::stop_guide`]
    pub fn start_guide(&mut self, axis: Axis, dir: Direction, rate_x: f64) {
        self.actions[axis.index()] = GuideAction::Continuous {
            dir,
            rate_x: libm::fabs(rate_x),
        };
    }

    /// Guide at `rate_x` for `duration_ticks` motion-loop ticks
    pub fn start_pulse_guide(&mut self, axis: Axis, dir: Direction, rate_x: f64, duration_ticks: u32) {
        let rate_x = libm::fabs(rate_x);
        self.actions[axis.index()] = if duration_ticks == 0 || rate_x == 0.0 {
            GuideAction::Idle
        } else {
            GuideAction::Pulse {
                dir,
                rate_x,
                remaining: rate_x * duration_ticks as f64,
            }
        };
    }

    pub fn stop_guide(&mut self, axis: Axis) {
        self.actions[axis.index()] = GuideAction::Idle;
    }

    pub fn stop_all(&mut self) {
        self.actions = [GuideAction::Idle; 2];
    }

    pub fn is_guiding(&self, axis: Axis) -> bool {
        self.actions[axis.index()] != GuideAction::Idle
    }

    pub fn any_guiding(&self) -> bool {
        Axis::ALL.iter().any(|&axis| self.is_guiding(axis))
    }

    /// Guide rate terms for this tick, in multiples of sidereal
    ///
    /// Pulse guides consume their remaining amount; the last tick of a
    /// pulse is scaled down so the total is exact.
    pub fn tick(&mut self) -> [f64; 2] {
        let mut terms = [0.0; 2];
        for (action, term) in self.actions.iter_mut().zip(terms.iter_mut()) {
            match *action {
                GuideAction::Idle => {}
                GuideAction::Continuous { dir, rate_x } => {
                    *term = dir.sign() as f64 * rate_x;
                }
                GuideAction::Pulse {
                    dir,
                    rate_x,
                    remaining,
                } => {
                    let used = rate_x.min(remaining);
                    *term = dir.sign() as f64 * used;
                    let left = remaining - used;
                    *action = if left <= 0.0 {
                        GuideAction::Idle
                    } else {
                        GuideAction::Pulse {
                            dir,
                            rate_x,
                            remaining: left,
                        }
                    };
                }
            }
        }
        terms
    }
}
