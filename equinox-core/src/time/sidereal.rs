//! Sidereal clock with PPS discipline
//!
//! The clock counts hardware ticks into a local sidereal time counter and
//! derives the per-axis sidereal step rate from the calibrated interval.
//! When a GPS pulse-per-second reference is present, the measured local
//! length of one second scales both.

use crate::Axis;

/// Hardware timer ticks per solar second (16 MHz)
pub const HW_TICKS_PER_SECOND: u32 = 16_000_000;

/// Nominal hardware ticks per sidereal second
pub const NOMINAL_SIDEREAL_INTERVAL: u32 = 15_956_313;

/// LST counter resolution (0.01 sidereal second)
pub const LST_TICKS_PER_SIDEREAL_SECOND: u32 = 100;

/// Nominal PPS pulse interval in local microseconds
pub const NOMINAL_PPS_MICROS: u32 = 1_000_000;

/// PPS samples further than this fraction from nominal are discarded
pub const PPS_ACCEPT_BAND: f64 = 0.5;

/// Smoothed PPS ratio is held within this fraction of 1.0
pub const PPS_RATIO_LIMIT: f64 = 0.1;

/// Exponential smoothing length for PPS samples
pub const PPS_SMOOTHING: f64 = 20.0;

/// Sidereal degrees per sidereal second (15 arcsec)
const DEGREES_PER_SIDEREAL_SECOND: f64 = 1.0 / 240.0;

/// Local sidereal time counter in 0.01 s units
///
/// The counter wraps at `u32::MAX` (about 497 days). Use
/// [`SiderealTick::since`] for differences so the wrap is transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SiderealTick(u32);

impl SiderealTick {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Advance by `ticks`, wrapping at the counter limit
    pub const fn wrapping_add(self, ticks: u32) -> Self {
        Self(self.0.wrapping_add(ticks))
    }

    /// Ticks elapsed since `earlier`, correct across one wrap
    pub const fn since(self, earlier: SiderealTick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

/// Sidereal clock
#[derive(Debug, Clone)]
pub struct SiderealClock {
    lst: SiderealTick,
    /// Calibrated hardware ticks per sidereal second
    master_interval: u32,
    /// Pending hardware ticks scaled by the LST resolution
    phase: u64,
    /// Sub-tick remainder while PPS-disciplined
    carry: f64,
    /// Smoothed measured length of one second in local microseconds
    pps_avg_micros: f64,
    pps_synced: bool,
    steps_per_degree: [f64; 2],
    /// Sidereal step rate per axis in steps per hardware tick
    sidereal_rate: [f64; 2],
}

impl SiderealClock {
    /// Create a free-running clock at the nominal interval
    pub fn new(steps_per_degree: [f64; 2]) -> Self {
        let mut clock = Self {
            lst: SiderealTick::default(),
            master_interval: NOMINAL_SIDEREAL_INTERVAL,
            phase: 0,
            carry: 0.0,
            pps_avg_micros: NOMINAL_PPS_MICROS as f64,
            pps_synced: false,
            steps_per_degree,
            sidereal_rate: [0.0; 2],
        };
        clock.update_rates();
        clock
    }

    /// Current local sidereal time counter
    pub fn lst(&self) -> SiderealTick {
        self.lst
    }

    /// Overwrite the LST counter (time set from the command layer)
    pub fn set_lst(&mut self, lst: SiderealTick) {
        self.lst = lst;
        self.phase = 0;
        self.carry = 0.0;
    }

    /// Calibrated hardware ticks per sidereal second
    pub fn interval(&self) -> u32 {
        self.master_interval
    }

    /// Calibration offset from the nominal interval
    pub fn interval_delta(&self) -> i32 {
        (self.master_interval as i64 - NOMINAL_SIDEREAL_INTERVAL as i64) as i32
    }

    /// Set the interval as an offset from nominal
    ///
    /// The interval never drops below one tick.
    pub fn set_interval(&mut self, delta: i32) {
        let interval = (NOMINAL_SIDEREAL_INTERVAL as i64 + delta as i64).clamp(1, u32::MAX as i64);
        self.master_interval = interval as u32;
        self.phase %= self.master_interval as u64;
        self.update_rates();
    }

    /// Nudge the interval relative to its current value
    pub fn adjust_interval(&mut self, by: i32) {
        let delta = self.interval_delta().saturating_add(by);
        self.set_interval(delta);
    }

    /// True while a PPS reference is disciplining the clock
    pub fn is_disciplined(&self) -> bool {
        self.pps_synced
    }

    /// Measured local length of one second relative to nominal
    pub fn pps_ratio(&self) -> f64 {
        if self.pps_synced {
            self.pps_avg_micros / NOMINAL_PPS_MICROS as f64
        } else {
            1.0
        }
    }

    /// Hardware ticks per sidereal second after PPS correction
    pub fn effective_interval(&self) -> f64 {
        self.master_interval as f64 * self.pps_ratio()
    }

    /// Feed one PPS pulse interval measured in local microseconds
    ///
    /// Returns `false` when the sample is outside ±50% of nominal and was
    /// discarded. The smoothed ratio itself is held within ±10% of 1.0.
    pub fn calibrate(&mut self, pulse_interval_micros: u32) -> bool {
        let nominal = NOMINAL_PPS_MICROS as f64;
        let sample = pulse_interval_micros as f64;
        let low = nominal * (1.0 - PPS_ACCEPT_BAND);
        let high = nominal * (1.0 + PPS_ACCEPT_BAND);

        if sample < low || sample > high {
            warn!("PPS sample {} us discarded", pulse_interval_micros);
            return false;
        }

        if !self.pps_synced {
            debug!("PPS discipline acquired");
        }

        self.pps_avg_micros += (sample - self.pps_avg_micros) / PPS_SMOOTHING;
        self.pps_avg_micros = self.pps_avg_micros.clamp(
            nominal * (1.0 - PPS_RATIO_LIMIT),
            nominal * (1.0 + PPS_RATIO_LIMIT),
        );
        self.pps_synced = true;
        self.update_rates();
        true
    }

    /// Drop PPS discipline and return to free-running
    pub fn desync(&mut self) {
        if self.pps_synced {
            info!("PPS discipline lost, free-running");
        }
        self.pps_synced = false;
        self.pps_avg_micros = NOMINAL_PPS_MICROS as f64;
        self.carry = 0.0;
        self.update_rates();
    }

    /// Advance by `elapsed_ticks` hardware ticks
    pub fn advance(&mut self, elapsed_ticks: u32) {
        let scaled = if self.pps_synced {
            let exact = elapsed_ticks as f64 * LST_TICKS_PER_SIDEREAL_SECOND as f64
                / self.pps_ratio()
                + self.carry;
            let whole = libm::floor(exact);
            self.carry = exact - whole;
            whole as u64
        } else {
            elapsed_ticks as u64 * LST_TICKS_PER_SIDEREAL_SECOND as u64
        };

        let interval = self.master_interval as u64;
        self.phase += scaled;
        let whole = self.phase / interval;
        self.phase %= interval;
        // Truncation is the intended wrap of the counter
        self.lst = self.lst.wrapping_add(whole as u32);

        self.update_rates();
    }

    /// Sidereal step rate for an axis in steps per hardware tick
    pub fn sidereal_rate(&self, axis: Axis) -> f64 {
        self.sidereal_rate[axis.index()]
    }

    /// Sidereal steps covered in one control period of `tick_period` ticks
    pub fn steps_per_period(&self, axis: Axis, tick_period: u32) -> f64 {
        self.sidereal_rate(axis) * tick_period as f64
    }

    fn update_rates(&mut self) {
        let interval = self.effective_interval();
        for (rate, spd) in self.sidereal_rate.iter_mut().zip(self.steps_per_degree) {
            *rate = spd * DEGREES_PER_SIDEREAL_SECOND / interval;
        }
    }
}
