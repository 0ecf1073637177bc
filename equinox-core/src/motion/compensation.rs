//! Tracking-rate compensation
//!
//! Refraction lifts a star's apparent altitude by an amount that changes
//! as it crosses the sky, so tracking at the exact sidereal rate lets it
//! drift. The compensation term is the difference between how fast the
//! apparent position moves and how fast the true position moves, taken by
//! central difference over a short hour-angle step.
//!
//! Refraction uses Saemundsson's formula,
//! `R = 1.02 / tan(h + 10.3 / (h + 5.11))` arcminutes for true altitude
//! `h` in degrees, assuming 10 °C and 1010 hPa. The "full" modes add a
//! polar-misalignment pointing model (ME: pole elevation error, MA: pole
//! azimuth error) on top of refraction.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::goto::kinematics::{equatorial_to_horizon, horizon_to_equatorial, wrap_180};

/// Half-width of the hour-angle difference step (1 minute of time)
const DIFF_STEP_DEG: f64 = 0.25;

/// No compensation closer than this to the pole
const POLE_CUTOFF_DEG: f64 = 89.5;

/// No refraction below this true altitude
const HORIZON_CUTOFF_DEG: f64 = -1.0;

/// Selectable compensation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RateCompensationMode {
    #[default]
    None,
    /// Refraction, primary axis only
    RefractionRa,
    /// Refraction, both axes
    RefractionBoth,
    /// Refraction and pointing model, primary axis only
    FullRa,
    /// Refraction and pointing model, both axes
    FullBoth,
}

impl RateCompensationMode {
    pub fn is_enabled(self) -> bool {
        self != RateCompensationMode::None
    }

    pub fn both_axes(self) -> bool {
        matches!(
            self,
            RateCompensationMode::RefractionBoth | RateCompensationMode::FullBoth
        )
    }

    fn uses_model(self) -> bool {
        matches!(
            self,
            RateCompensationMode::FullRa | RateCompensationMode::FullBoth
        )
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Polar-axis misalignment in arcseconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointingModel {
    /// ME: polar axis elevated above the pole (positive = too high)
    pub polar_altitude_arcsec: f64,
    /// MA: polar axis east of the pole
    pub polar_azimuth_arcsec: f64,
}

/// Refraction in degrees for a true altitude in degrees
pub fn refraction_deg(true_alt_deg: f64) -> f64 {
    if true_alt_deg < HORIZON_CUTOFF_DEG {
        return 0.0;
    }
    let arg = (true_alt_deg + 10.3 / (true_alt_deg + 5.11)).to_radians();
    let arcmin = 1.02 / libm::tan(arg);
    arcmin.max(0.0) / 60.0
}

/// Apparent (hour angle, declination) the mount must point at to see a
/// star at true `(ha_deg, dec_deg)`
fn apparent(
    mode: RateCompensationMode,
    ha_deg: f64,
    dec_deg: f64,
    latitude_deg: f64,
    model: &PointingModel,
) -> (f64, f64) {
    let (alt, az) = equatorial_to_horizon(ha_deg, dec_deg, latitude_deg);
    let (mut ha, mut dec) = horizon_to_equatorial(alt + refraction_deg(alt), az, latitude_deg);

    if mode.uses_model() {
        let me = model.polar_altitude_arcsec / 3600.0;
        let ma = model.polar_azimuth_arcsec / 3600.0;
        let (sin_h, cos_h) = libm::sincos(ha_deg.to_radians());
        let tan_d = libm::tan(dec_deg.to_radians());
        ha += (me * sin_h - ma * cos_h) * tan_d;
        dec += me * cos_h + ma * sin_h;
    }

    (ha, dec)
}

/// Additive compensation rates `[primary, secondary]` in multiples of
/// sidereal for a star at true `(ha_deg, dec_deg)`
///
/// Mode `None` always returns zero, as do positions near the pole or
/// below the horizon where the model is meaningless.
pub fn compensation_rates(
    mode: RateCompensationMode,
    ha_deg: f64,
    dec_deg: f64,
    latitude_deg: f64,
    model: &PointingModel,
) -> [f64; 2] {
    if !mode.is_enabled() || libm::fabs(dec_deg) > POLE_CUTOFF_DEG {
        return [0.0; 2];
    }
    let (alt, _) = equatorial_to_horizon(ha_deg, dec_deg, latitude_deg);
    if alt < HORIZON_CUTOFF_DEG {
        return [0.0; 2];
    }

    let (ha0, dec0) = apparent(mode, ha_deg - DIFF_STEP_DEG, dec_deg, latitude_deg, model);
    let (ha1, dec1) = apparent(mode, ha_deg + DIFF_STEP_DEG, dec_deg, latitude_deg, model);
    let span = 2.0 * DIFF_STEP_DEG;

    // One sidereal x moves the hour angle one degree per degree of HA
    let primary = wrap_180(ha1 - ha0) / span - 1.0;
    let secondary = if mode.both_axes() {
        (dec1 - dec0) / span
    } else {
        0.0
    };

    [primary, secondary]
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAT: f64 = 45.0;

    #[test]
    fn test_none_is_zero() {
        let rates = compensation_rates(
            RateCompensationMode::None,
            -60.0,
            10.0,
            LAT,
            &PointingModel::default(),
        );
        assert_eq!(rates, [0.0, 0.0]);
    }

    #[test]
    fn test_refraction_magnitude() {
        // About half a degree at the horizon, about 1 arcmin at 45°
        assert!((refraction_deg(0.0) - 0.48).abs() < 0.02);
        assert!((refraction_deg(45.0) * 60.0 - 1.0).abs() < 0.05);
        assert!(refraction_deg(90.0) < 1e-4);
        assert_eq!(refraction_deg(-5.0), 0.0);
    }

    #[test]
    fn test_refraction_slows_ra_in_the_east() {
        let rates = compensation_rates(
            RateCompensationMode::RefractionRa,
            -60.0,
            0.0,
            LAT,
            &PointingModel::default(),
        );
        assert!(rates[0] < 0.0);
        assert!(rates[0] > -0.01);
        assert_eq!(rates[1], 0.0);
    }

    #[test]
    fn test_both_axes_drives_declination() {
        let rates = compensation_rates(
            RateCompensationMode::RefractionBoth,
            -60.0,
            0.0,
            LAT,
            &PointingModel::default(),
        );
        assert!(rates[1] != 0.0);
        // Refraction is symmetric about the meridian
        let west = compensation_rates(
            RateCompensationMode::RefractionBoth,
            60.0,
            0.0,
            LAT,
            &PointingModel::default(),
        );
        assert!((rates[0] - west[0]).abs() < 1e-6);
        assert!((rates[1] + west[1]).abs() < 1e-6);
    }

    #[test]
    fn test_no_compensation_near_pole_or_below_horizon() {
        let model = PointingModel::default();
        assert_eq!(
            compensation_rates(RateCompensationMode::FullBoth, 0.0, 89.9, LAT, &model),
            [0.0, 0.0]
        );
        assert_eq!(
            compensation_rates(RateCompensationMode::FullBoth, 0.0, -70.0, LAT, &model),
            [0.0, 0.0]
        );
    }

    #[test]
    fn test_full_mode_adds_pointing_model() {
        let model = PointingModel {
            polar_altitude_arcsec: 600.0,
            polar_azimuth_arcsec: 0.0,
        };
        let refraction =
            compensation_rates(RateCompensationMode::RefractionBoth, -30.0, 40.0, LAT, &model);
        let full = compensation_rates(RateCompensationMode::FullBoth, -30.0, 40.0, LAT, &model);
        assert!((full[1] - refraction[1]).abs() > 1e-5);
    }
}
