//! Per-axis step generation
//!
//! One controller owns one stepper driver. Every motion-loop tick it
//! integrates the summed rate terms into a Q32.32 target and emits at
//! most one pulse toward it. A goto replaces the rate integration with
//! the ramped slew toward an absolute target.
//!
//! Positions are always counted in tracking microsteps. During a goto
//! the driver may be switched to a coarser microstep code, in which case
//! each pulse moves `goto_step_multiplier` microsteps. The switch only
//! happens on a multiple of the multiplier so the count stays exact.
//!
//! Backlash is modelled as a gap of `backlash_steps`. A reversal first
//! pulses through the part of the gap already taken up, without moving
//! the counted position, before any productive step is taken.

use super::fixed::Fixed;
use super::planner::{MotionState, RampPlanner};
use super::rates::{RateKind, RateTerms};
use crate::config::AxisConfig;
use crate::state::AxisError;
use crate::traits::{Direction, StepperDriver};
use crate::Axis;

/// What is driving the axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisMode {
    /// Only guide corrections move the axis
    Idle,
    /// All enabled rate terms are integrated
    Tracking,
    /// Slewing to an absolute target
    Goto,
}

#[derive(Debug, Clone, Copy)]
struct Slew {
    start: i32,
    id: u8,
}

/// Step generator for one axis
pub struct AxisMotionController<D: StepperDriver> {
    axis: Axis,
    driver: D,
    position: i32,
    target: Fixed,
    tracking: bool,
    slew: Option<Slew>,
    last_slew_id: u8,
    rates: RateTerms,
    enabled: bool,
    fault: bool,
    /// Direction the drive train is loaded in
    direction: Direction,
    backlash_steps: u16,
    /// Backlash steps still to take up after the last reversal
    backlash_remaining: u16,
    reverse: bool,
    tracking_code: u8,
    goto_code: Option<u8>,
    goto_multiplier: u16,
    /// Microsteps moved by one pulse at the active code
    step_size: u16,
    pulse_phase: Fixed,
    planner: RampPlanner,
}

impl<D: StepperDriver> AxisMotionController<D> {
    /// Create a controller from validated configuration
    ///
    /// The axis starts disabled, idle and at position zero, with the drive
    /// train loaded forward.
    pub fn new(axis: Axis, mut driver: D, cfg: &AxisConfig, ticks_per_second: f64) -> Self {
        driver.set_microstep_code(cfg.microstep_code);
        driver.set_direction(Direction::Forward.apply_reverse(cfg.reverse));
        driver.enable(false);

        let max_speed = cfg.max_slew_steps_per_s() / ticks_per_second;

        Self {
            axis,
            driver,
            position: 0,
            target: Fixed::ZERO,
            tracking: false,
            slew: None,
            last_slew_id: 0,
            rates: RateTerms::default(),
            enabled: false,
            fault: false,
            direction: Direction::Forward,
            backlash_steps: cfg.backlash_steps,
            backlash_remaining: 0,
            reverse: cfg.reverse,
            tracking_code: cfg.microstep_code,
            goto_code: cfg.microstep_code_goto,
            goto_multiplier: cfg.effective_goto_multiplier().max(1),
            step_size: 1,
            pulse_phase: Fixed::ZERO,
            planner: RampPlanner::new(max_speed, cfg.ramp_steps()),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn mode(&self) -> AxisMode {
        if self.slew.is_some() {
            AxisMode::Goto
        } else if self.tracking {
            AxisMode::Tracking
        } else {
            AxisMode::Idle
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn target(&self) -> Fixed {
        self.target
    }

    pub fn is_slewing(&self) -> bool {
        self.slew.is_some()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Id of the most recently completed slew
    pub fn last_slew_id(&self) -> u8 {
        self.last_slew_id
    }

    pub fn in_backlash(&self) -> bool {
        self.backlash_remaining > 0
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_faulted(&self) -> bool {
        self.fault
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Microsteps per pulse at the active microstep code
    pub fn step_size(&self) -> u16 {
        self.step_size
    }

    pub fn rates(&self) -> &RateTerms {
        &self.rates
    }

    /// Ramp phase of the active slew
    pub fn motion_state(&self) -> MotionState {
        match self.slew {
            Some(slew) => {
                let (traveled, to_go) = self.slew_progress(slew);
                self.planner.phase(traveled, to_go)
            }
            None => MotionState::Stopped,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Replace the value of one rate term
    pub fn set_rate(&mut self, kind: RateKind, value: f64) {
        self.rates.set(kind, value);
    }

    pub fn set_tracking_rate(&mut self, value: f64) {
        self.set_rate(RateKind::Tracking, value);
    }

    pub fn set_compensation_rate(&mut self, value: f64) {
        self.set_rate(RateKind::Compensation, value);
    }

    pub fn set_guide_rate(&mut self, value: f64) {
        self.set_rate(RateKind::Guide, value);
    }

    pub fn set_pec_rate(&mut self, value: f64) {
        self.set_rate(RateKind::Pec, value);
    }

    pub fn set_term_enabled(&mut self, kind: RateKind, enabled: bool) {
        self.rates.enable(kind, enabled);
    }

    /// Integrate all rate terms (tracking) or guide only (idle)
    pub fn set_tracking(&mut self, tracking: bool) {
        self.tracking = tracking;
    }

    /// Power the driver outputs
    ///
    /// Disabling during a slew aborts it.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled && self.slew.is_some() {
            self.abort();
        }
        self.enabled = enabled;
        self.driver.enable(enabled);
        self.target = Fixed::from_int(self.position);
    }

    /// Clear a latched fault once the driver no longer reports one
    pub fn clear_fault(&mut self) -> bool {
        if self.driver.is_faulted() {
            return false;
        }
        if self.fault {
            info!("axis {} fault cleared", self.axis.index());
        }
        self.fault = false;
        true
    }

    /// Begin a slew to an absolute position in microsteps
    pub fn set_target(&mut self, steps: i32, slew_id: u8) -> Result<(), AxisError> {
        if self.fault {
            return Err(AxisError::Fault);
        }
        if !self.enabled {
            return Err(AxisError::Disabled);
        }

        self.target = Fixed::from_int(steps);
        self.slew = Some(Slew {
            start: self.position,
            id: slew_id,
        });
        self.pulse_phase = Fixed::ZERO;
        debug!(
            "axis {} slew {} from {} to {}",
            self.axis.index(),
            slew_id,
            self.position,
            steps
        );
        Ok(())
    }

    /// Stop any slew immediately and fall back to tracking or idle
    ///
    /// Pulses already emitted are not undone; the target snaps to the
    /// current position.
    pub fn abort(&mut self) {
        if let Some(slew) = self.slew.take() {
            debug!("axis {} slew {} aborted", self.axis.index(), slew.id);
        }
        self.target = Fixed::from_int(self.position);
        self.pulse_phase = Fixed::ZERO;
        self.use_tracking_code();
    }

    /// Run one motion-loop tick
    ///
    /// `sidereal_steps` is the distance one sidereal-rate tick covers.
    pub fn tick(&mut self, sidereal_steps: f64) {
        if !self.fault && self.driver.is_faulted() {
            error!("axis {} driver fault", self.axis.index());
            self.fault = true;
            self.abort();
        }
        if self.fault || !self.enabled {
            return;
        }

        match self.slew {
            Some(slew) => self.tick_goto(slew, sidereal_steps),
            None => self.tick_rate(sidereal_steps),
        }
    }

    fn tick_rate(&mut self, sidereal_steps: f64) {
        let rate = if self.tracking {
            self.rates.tracking_sum()
        } else {
            self.rates.idle_sum()
        };

        let delta = Fixed::from_f64(rate * sidereal_steps).clamp_abs(Fixed::ONE);
        self.target += delta;

        let goal = self.target.floor();
        if goal != self.position {
            let dir = if goal > self.position {
                Direction::Forward
            } else {
                Direction::Reverse
            };
            self.pulse(dir);
        }
    }

    fn tick_goto(&mut self, slew: Slew, sidereal_steps: f64) {
        // The sky keeps turning while the slew is in progress
        let drift = self.rates.get(RateKind::Tracking);
        if self.tracking && drift.enabled {
            self.target += Fixed::from_f64(drift.value * sidereal_steps).clamp_abs(Fixed::ONE);
        }

        let remaining = self.target.floor() as i64 - self.position as i64;
        let dir = match Direction::of(remaining) {
            Some(dir) => dir,
            None => {
                // Leftover backlash from an abort stays for the next move
                self.finish_slew(slew);
                return;
            }
        };
        let distance = remaining.unsigned_abs();

        self.select_step_size(dir, distance);

        let (traveled, to_go) = self.slew_progress(slew);
        let speed = self.planner.speed(traveled, to_go) / self.step_size as f64;
        self.pulse_phase += Fixed::from_f64(speed.min(1.0));
        if self.pulse_phase >= Fixed::ONE {
            self.pulse_phase -= Fixed::ONE;
            self.pulse(dir);
        }
    }

    fn slew_progress(&self, slew: Slew) -> (u32, u32) {
        let traveled = (self.position as i64 - slew.start as i64).unsigned_abs();
        let to_go = (self.target.floor() as i64 - self.position as i64).unsigned_abs();
        (
            traveled.min(u32::MAX as u64) as u32,
            to_go.min(u32::MAX as u64) as u32,
        )
    }

    fn select_step_size(&mut self, dir: Direction, distance: u64) {
        let m = self.goto_multiplier;
        if self.step_size == 1 {
            let Some(code) = self.goto_code else {
                return;
            };
            let aligned = self.position.rem_euclid(m as i32) == 0;
            if m > 1
                && aligned
                && dir == self.direction
                && self.backlash_remaining == 0
                && distance >= 2 * m as u64
            {
                self.driver.set_microstep_code(code);
                self.step_size = m;
            }
        } else if distance < m as u64 || dir != self.direction {
            self.use_tracking_code();
        }
    }

    fn use_tracking_code(&mut self) {
        if self.step_size != 1 {
            self.driver.set_microstep_code(self.tracking_code);
            self.step_size = 1;
        }
    }

    fn finish_slew(&mut self, slew: Slew) {
        self.slew = None;
        self.last_slew_id = slew.id;
        self.pulse_phase = Fixed::ZERO;
        self.use_tracking_code();
        debug!("axis {} slew {} complete at {}", self.axis.index(), slew.id, self.position);
    }

    /// Emit one pulse in `dir`, taking up backlash first on a reversal
    fn pulse(&mut self, dir: Direction) {
        if dir != self.direction {
            self.direction = dir;
            self.driver.set_direction(dir.apply_reverse(self.reverse));
            // The part of the gap already crossed must be crossed again
            self.backlash_remaining = self.backlash_steps - self.backlash_remaining;
        }

        self.driver.step();
        if self.backlash_remaining > 0 {
            self.backlash_remaining -= 1;
        } else {
            self.position = self
                .position
                .wrapping_add(dir.sign() * self.step_size as i32);
        }
    }
}

impl Direction {
    /// Pin level for this direction on a reversed axis
    fn apply_reverse(self, reverse: bool) -> Direction {
        if reverse {
            self.opposite()
        } else {
            self
        }
    }
}
