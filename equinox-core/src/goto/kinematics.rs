//! Mount kinematics
//!
//! Maps sky positions (hour angle, declination) to axis angles and back
//! for each supported mount geometry, and answers the questions the goto
//! coordinator and the safety monitor ask about a position: which pier
//! side it naturally belongs to, whether the primary axis may reach it,
//! and how fast each axis must turn to follow it.
//!
//! Angles are in degrees throughout. Azimuth is measured from north
//! through east.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::state::PierSide;

/// Hour-angle step for numeric tracking rates
const RATE_STEP_DEG: f64 = 0.25;

/// Supported mount geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MountKind {
    /// German equatorial: needs meridian flips
    #[default]
    GermanEquatorial,
    /// Equatorial fork: no pier side
    Fork,
    /// Alt-azimuth: primary is azimuth, secondary is altitude
    AltAzimuth,
}

/// Wrap an angle into `(-180, 180]`
pub fn wrap_180(deg: f64) -> f64 {
    let wrapped = deg - 360.0 * libm::floor((deg + 180.0) / 360.0);
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Altitude and azimuth of an equatorial position
pub fn equatorial_to_horizon(ha_deg: f64, dec_deg: f64, latitude_deg: f64) -> (f64, f64) {
    let (sin_h, cos_h) = libm::sincos(ha_deg.to_radians());
    let (sin_d, cos_d) = libm::sincos(dec_deg.to_radians());
    let (sin_p, cos_p) = libm::sincos(latitude_deg.to_radians());

    let sin_alt = (sin_p * sin_d + cos_p * cos_d * cos_h).clamp(-1.0, 1.0);
    let alt = libm::asin(sin_alt);
    let az = libm::atan2(-cos_d * sin_h, sin_d * cos_p - cos_d * cos_h * sin_p);

    (alt.to_degrees(), wrap_180(az.to_degrees()))
}

/// Hour angle and declination of a horizon position
pub fn horizon_to_equatorial(alt_deg: f64, az_deg: f64, latitude_deg: f64) -> (f64, f64) {
    let (sin_a, cos_a) = libm::sincos(alt_deg.to_radians());
    let (sin_z, cos_z) = libm::sincos(az_deg.to_radians());
    let (sin_p, cos_p) = libm::sincos(latitude_deg.to_radians());

    let sin_d = (sin_p * sin_a + cos_p * cos_a * cos_z).clamp(-1.0, 1.0);
    let dec = libm::asin(sin_d);
    let ha = libm::atan2(-cos_a * sin_z, sin_a * cos_p - cos_a * cos_z * sin_p);

    (wrap_180(ha.to_degrees()), dec.to_degrees())
}

impl MountKind {
    /// True for mounts that change pier side at the meridian
    pub fn has_pier_sides(self) -> bool {
        self == MountKind::GermanEquatorial
    }

    pub fn is_equatorial(self) -> bool {
        self != MountKind::AltAzimuth
    }

    /// Pier side a GEM uses for an hour angle when nothing else decides
    ///
    /// Objects west of the meridian are observed from the east side.
    pub fn natural_side(self, ha_deg: f64) -> PierSide {
        if !self.has_pier_sides() {
            PierSide::None
        } else if wrap_180(ha_deg) >= 0.0 {
            PierSide::East
        } else {
            PierSide::West
        }
    }

    /// Axis angles for a sky position on a pier side
    pub fn to_axes(self, ha_deg: f64, dec_deg: f64, side: PierSide, latitude_deg: f64) -> [f64; 2] {
        match self {
            MountKind::GermanEquatorial if side == PierSide::West => {
                [wrap_180(ha_deg) + 180.0, 180.0 - dec_deg]
            }
            MountKind::GermanEquatorial | MountKind::Fork => [wrap_180(ha_deg), dec_deg],
            MountKind::AltAzimuth => {
                let (alt, az) = equatorial_to_horizon(ha_deg, dec_deg, latitude_deg);
                [az, alt]
            }
        }
    }

    /// Sky position (hour angle, declination) of axis angles
    pub fn from_axes(self, axes: [f64; 2], side: PierSide, latitude_deg: f64) -> (f64, f64) {
        match self {
            MountKind::GermanEquatorial if side == PierSide::West => {
                (wrap_180(axes[0] - 180.0), 180.0 - axes[1])
            }
            MountKind::GermanEquatorial | MountKind::Fork => (wrap_180(axes[0]), axes[1]),
            MountKind::AltAzimuth => horizon_to_equatorial(axes[1], axes[0], latitude_deg),
        }
    }

    /// Pier side implied by the secondary axis angle
    ///
    /// A GEM axis2 beyond the pole (above 90°) is on the west side.
    pub fn side_of_axes(self, axes: [f64; 2]) -> PierSide {
        if !self.has_pier_sides() {
            PierSide::None
        } else if axes[1] > 90.0 {
            PierSide::West
        } else {
            PierSide::East
        }
    }

    /// Whether the primary axis may point at `ha_deg` from `side`
    pub fn reachable(self, ha_deg: f64, side: PierSide, limits: &LimitsConfig) -> bool {
        let ha = wrap_180(ha_deg);
        match (self, side) {
            (MountKind::GermanEquatorial, PierSide::East) => {
                ha >= -limits.past_meridian_east_deg && ha <= limits.under_pole_deg
            }
            (MountKind::GermanEquatorial, PierSide::West) => {
                ha >= -limits.under_pole_deg && ha <= limits.past_meridian_west_deg
            }
            (MountKind::GermanEquatorial, PierSide::None) => false,
            (MountKind::Fork, _) => libm::fabs(ha) <= limits.under_pole_deg,
            (MountKind::AltAzimuth, _) => true,
        }
    }

    /// Hour-angle limit crossed while tracking on `side`, if any
    ///
    /// Only the meridian side matters here; the under-pole limit is
    /// checked separately.
    pub fn past_meridian(self, ha_deg: f64, side: PierSide, limits: &LimitsConfig) -> bool {
        let ha = wrap_180(ha_deg);
        match (self, side) {
            (MountKind::GermanEquatorial, PierSide::West) => ha > limits.past_meridian_west_deg,
            (MountKind::GermanEquatorial, PierSide::East) => ha < -limits.past_meridian_east_deg,
            _ => false,
        }
    }

    /// Axis rates in multiples of sidereal needed to follow a star
    pub fn tracking_rates(self, ha_deg: f64, dec_deg: f64, side: PierSide, latitude_deg: f64) -> [f64; 2] {
        if self.is_equatorial() {
            // Hour angle and axis1 increase together on both sides
            return [1.0, 0.0];
        }
        self.axis_derivative(ha_deg, dec_deg, side, latitude_deg, [RATE_STEP_DEG, 0.0])
    }

    /// Map an hour-angle/declination rate correction onto the axes
    ///
    /// `correction` is `[ha, dec]` in multiples of sidereal, as returned by
    /// the rate compensation. The result is `[axis1, axis2]` in the same
    /// unit, at the given sky position.
    pub fn axis_rate_correction(
        self,
        correction: [f64; 2],
        ha_deg: f64,
        dec_deg: f64,
        side: PierSide,
        latitude_deg: f64,
    ) -> [f64; 2] {
        match self {
            // Axis2 runs against declination on the west side
            MountKind::GermanEquatorial if side == PierSide::West => [correction[0], -correction[1]],
            MountKind::GermanEquatorial | MountKind::Fork => correction,
            MountKind::AltAzimuth => {
                let by_ha =
                    self.axis_derivative(ha_deg, dec_deg, side, latitude_deg, [RATE_STEP_DEG, 0.0]);
                let by_dec =
                    self.axis_derivative(ha_deg, dec_deg, side, latitude_deg, [0.0, RATE_STEP_DEG]);
                [
                    correction[0] * by_ha[0] + correction[1] * by_dec[0],
                    correction[0] * by_ha[1] + correction[1] * by_dec[1],
                ]
            }
        }
    }

    /// Central difference of the axis angles along `step` (`[ha, dec]`)
    fn axis_derivative(
        self,
        ha_deg: f64,
        dec_deg: f64,
        side: PierSide,
        latitude_deg: f64,
        step: [f64; 2],
    ) -> [f64; 2] {
        let before = self.to_axes(ha_deg - step[0], dec_deg - step[1], side, latitude_deg);
        let after = self.to_axes(ha_deg + step[0], dec_deg + step[1], side, latitude_deg);
        let span = 2.0 * (step[0] + step[1]);
        [
            wrap_180(after[0] - before[0]) / span,
            (after[1] - before[1]) / span,
        ]
    }
}
