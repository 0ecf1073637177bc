//! Configuration type definitions
//!
//! These types describe the mount hardware and its limits. The
//! configuration is resolved once at startup (embedded TOML, see
//! [`super::parse`]) and validated with [`MountConfig::validate`] before
//! any axis is built from it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::goto::MountKind;
use crate::guide::GuideRate;
use crate::motion::{PointingModel, RateCompensationMode, TrackingRate};
use crate::state::{MeridianFlipPolicy, PreferredPierSide};
use crate::time::HW_TICKS_PER_SECOND;
use crate::Axis;

/// Maximum number of PEC slots per worm rotation
pub const MAX_PEC_SLOTS: usize = 1024;

/// Largest goto microstep multiplier
pub const MAX_GOTO_STEP_MULTIPLIER: u16 = 256;

/// Per-axis drive configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisConfig {
    /// Steps per degree at the tracking microstep setting
    pub steps_per_degree: f64,
    /// Mechanical slack taken up on every direction reversal (steps)
    pub backlash_steps: u16,
    /// Driver microstep code used while tracking
    pub microstep_code: u8,
    /// Coarser driver microstep code used during gotos
    pub microstep_code_goto: Option<u8>,
    /// Tracking microsteps per goto microstep (power of two)
    pub goto_step_multiplier: u16,
    /// Maximum slew speed in degrees per second
    pub max_slew_deg_per_s: f64,
    /// Distance over which a slew reaches full speed, in degrees
    pub accel_distance_deg: f64,
    /// Invert the direction pin
    pub reverse: bool,
    /// Lower travel limit in axis degrees
    pub min_deg: f64,
    /// Upper travel limit in axis degrees
    pub max_deg: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            steps_per_degree: 12_800.0,
            backlash_steps: 40,
            microstep_code: 5,
            microstep_code_goto: Some(2),
            goto_step_multiplier: 8,
            max_slew_deg_per_s: 4.0,
            accel_distance_deg: 2.0,
            reverse: false,
            min_deg: -270.0,
            max_deg: 270.0,
        }
    }
}

impl AxisConfig {
    /// Maximum slew speed in tracking microsteps per second
    pub fn max_slew_steps_per_s(&self) -> f64 {
        self.max_slew_deg_per_s * self.steps_per_degree
    }

    /// Ramp length in tracking microsteps
    pub fn ramp_steps(&self) -> f64 {
        self.accel_distance_deg * self.steps_per_degree
    }

    /// Goto microstep multiplier actually in effect
    pub fn effective_goto_multiplier(&self) -> u16 {
        if self.microstep_code_goto.is_some() {
            self.goto_step_multiplier
        } else {
            1
        }
    }
}

/// Altitude and meridian limits
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimitsConfig {
    /// Lowest altitude a goto may target or tracking may reach
    pub min_altitude_deg: f64,
    /// Highest altitude a goto may target or tracking may reach
    pub max_altitude_deg: f64,
    /// How far east of the meridian an east-side GEM may point
    pub past_meridian_east_deg: f64,
    /// How far west of the meridian a west-side GEM may track
    pub past_meridian_west_deg: f64,
    /// Largest hour angle magnitude on the primary axis
    pub under_pole_deg: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_altitude_deg: -10.0,
            max_altitude_deg: 90.0,
            past_meridian_east_deg: 15.0,
            past_meridian_west_deg: 15.0,
            under_pole_deg: 180.0,
        }
    }
}

/// Periodic error correction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PecConfig {
    /// Primary axis steps in one worm rotation
    pub steps_per_worm_rotation: u32,
    /// Buffer slots per rotation (must divide the rotation evenly)
    pub slots: u16,
    /// A worm index sensor is fitted
    pub has_index_sensor: bool,
    /// Arm playback as soon as a recording completes
    pub play_after_record: bool,
}

impl Default for PecConfig {
    fn default() -> Self {
        Self {
            // 144-tooth worm wheel at 12800 steps/degree
            steps_per_worm_rotation: 32_000,
            slots: 640,
            has_index_sensor: true,
            play_after_record: false,
        }
    }
}

impl PecConfig {
    /// Steps covered by one buffer slot
    pub fn steps_per_slot(&self) -> u32 {
        self.steps_per_worm_rotation / (self.slots.max(1) as u32)
    }
}

/// Guiding defaults
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GuideConfig {
    /// Rate used by manual guide commands
    pub rate: GuideRate,
    /// Rate used by ST4 / pulse-guide commands
    pub pulse_rate: GuideRate,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            rate: GuideRate::X20,
            pulse_rate: GuideRate::X1,
        }
    }
}

/// Observing site
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SiteConfig {
    /// Geographic latitude, north positive
    pub latitude_deg: f64,
    /// Geographic longitude, east positive
    pub longitude_deg: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude_deg: 45.0,
            longitude_deg: 0.0,
        }
    }
}

/// Complete mount configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MountConfig {
    pub kind: MountKind,
    pub axis1: AxisConfig,
    pub axis2: AxisConfig,
    pub limits: LimitsConfig,
    pub pec: PecConfig,
    pub guide: GuideConfig,
    pub site: SiteConfig,
    /// Hardware ticks per motion-loop tick
    pub tick_period: u32,
    /// Axis angles (degrees) at the home position
    pub home_deg: [f64; 2],
    /// Distance from target at which a slew counts as arrived (steps)
    pub slew_tolerance_steps: u16,
    pub meridian_flip: MeridianFlipPolicy,
    pub preferred_pier_side: PreferredPierSide,
    /// Hold at home during a meridian flip until released
    pub pause_at_home: bool,
    /// Flip automatically when tracking reaches the meridian limit
    pub auto_meridian_flip: bool,
    pub rate_compensation: RateCompensationMode,
    /// Polar misalignment used by the full compensation modes
    pub pointing: PointingModel,
    pub tracking_rate: TrackingRate,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            kind: MountKind::GermanEquatorial,
            axis1: AxisConfig::default(),
            axis2: AxisConfig::default(),
            limits: LimitsConfig::default(),
            pec: PecConfig::default(),
            guide: GuideConfig::default(),
            site: SiteConfig::default(),
            // 100 us
            tick_period: 1_600,
            home_deg: [90.0, 90.0],
            slew_tolerance_steps: 2,
            meridian_flip: MeridianFlipPolicy::Always,
            preferred_pier_side: PreferredPierSide::Best,
            pause_at_home: false,
            auto_meridian_flip: false,
            rate_compensation: RateCompensationMode::None,
            pointing: PointingModel::default(),
            tracking_rate: TrackingRate::Sidereal,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Steps per degree must be positive and finite
    InvalidStepsPerDegree(Axis),
    /// Goto multiplier must be a power of two up to 256
    InvalidGotoMultiplier(Axis),
    /// Goto multiplier above one needs a goto microstep code
    MissingGotoCode(Axis),
    /// Slew speed or ramp distance is not positive
    InvalidSlew(Axis),
    /// Maximum slew needs more than one pulse per tick
    SlewTooFast(Axis),
    /// Axis travel limits are reversed or outside ±360°
    InvalidTravel(Axis),
    /// Tick period must be non-zero
    InvalidTickPeriod,
    /// PEC slot count is zero, too large, or does not divide the rotation
    InvalidPecSlots,
    /// Minimum altitude is not below the maximum
    InvalidAltitudeLimits,
    /// Meridian or under-pole limits outside 0..=180°
    InvalidMeridianLimits,
    /// Latitude outside ±90°
    InvalidLatitude,
}

impl MountConfig {
    /// Drive configuration for an axis
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Primary => &self.axis1,
            Axis::Secondary => &self.axis2,
        }
    }

    /// Motion-loop ticks per solar second
    pub fn ticks_per_second(&self) -> f64 {
        HW_TICKS_PER_SECOND as f64 / self.tick_period.max(1) as f64
    }

    /// Steps per degree for both axes
    pub fn steps_per_degree(&self) -> [f64; 2] {
        [self.axis1.steps_per_degree, self.axis2.steps_per_degree]
    }

    /// True if both axis angles lie within their travel limits
    pub fn within_travel(&self, axes_deg: [f64; 2]) -> bool {
        [&self.axis1, &self.axis2]
            .iter()
            .zip(axes_deg)
            .all(|(axis, deg)| deg >= axis.min_deg && deg <= axis.max_deg)
    }

    /// Check the configuration once before use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period == 0 {
            return Err(ConfigError::InvalidTickPeriod);
        }

        for axis in Axis::ALL {
            self.validate_axis(axis)?;
        }

        let slots = self.pec.slots as u32;
        if slots == 0
            || slots as usize > MAX_PEC_SLOTS
            || self.pec.steps_per_worm_rotation == 0
            || self.pec.steps_per_worm_rotation % slots != 0
        {
            return Err(ConfigError::InvalidPecSlots);
        }

        let limits = &self.limits;
        if !(limits.min_altitude_deg < limits.max_altitude_deg) {
            return Err(ConfigError::InvalidAltitudeLimits);
        }
        let in_half_turn = |v: f64| (0.0..=180.0).contains(&v);
        if !in_half_turn(limits.past_meridian_east_deg)
            || !in_half_turn(limits.past_meridian_west_deg)
            || !in_half_turn(limits.under_pole_deg)
        {
            return Err(ConfigError::InvalidMeridianLimits);
        }

        if !(-90.0..=90.0).contains(&self.site.latitude_deg) {
            return Err(ConfigError::InvalidLatitude);
        }

        Ok(())
    }

    fn validate_axis(&self, axis: Axis) -> Result<(), ConfigError> {
        let cfg = self.axis(axis);

        if !(cfg.steps_per_degree.is_finite() && cfg.steps_per_degree > 0.0) {
            return Err(ConfigError::InvalidStepsPerDegree(axis));
        }

        let m = cfg.goto_step_multiplier;
        if m == 0 || m > MAX_GOTO_STEP_MULTIPLIER || !m.is_power_of_two() {
            return Err(ConfigError::InvalidGotoMultiplier(axis));
        }
        if m > 1 && cfg.microstep_code_goto.is_none() {
            return Err(ConfigError::MissingGotoCode(axis));
        }

        if !(cfg.max_slew_deg_per_s > 0.0 && cfg.accel_distance_deg > 0.0) {
            return Err(ConfigError::InvalidSlew(axis));
        }

        let pulses_per_tick = cfg.max_slew_steps_per_s()
            / cfg.effective_goto_multiplier() as f64
            / self.ticks_per_second();
        if pulses_per_tick > 1.0 {
            return Err(ConfigError::SlewTooFast(axis));
        }

        if !(cfg.min_deg < cfg.max_deg && cfg.min_deg >= -360.0 && cfg.max_deg <= 360.0) {
            return Err(ConfigError::InvalidTravel(axis));
        }

        Ok(())
    }
}
