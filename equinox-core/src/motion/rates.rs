//! Additive rate terms
//!
//! Every contribution to an axis' motion is a signed rate in multiples of
//! the sidereal rate. The axis controller sums the enabled terms once per
//! tick and converts the sum to steps with the clock's sidereal step rate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named rate contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RateKind {
    /// Base tracking rate (sidereal, solar, lunar, King)
    Tracking,
    /// Refraction or pointing-model correction
    Compensation,
    /// Manual or autoguider correction
    Guide,
    /// Periodic error correction playback
    Pec,
}

impl RateKind {
    pub const ALL: [RateKind; 4] = [
        RateKind::Tracking,
        RateKind::Compensation,
        RateKind::Guide,
        RateKind::Pec,
    ];

    const fn index(self) -> usize {
        match self {
            RateKind::Tracking => 0,
            RateKind::Compensation => 1,
            RateKind::Guide => 2,
            RateKind::Pec => 3,
        }
    }
}

/// One rate contribution
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateTerm {
    /// Signed rate in multiples of sidereal
    pub value: f64,
    pub enabled: bool,
}

impl RateTerm {
    pub const OFF: Self = Self {
        value: 0.0,
        enabled: false,
    };

    /// An enabled term at `value`
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            enabled: true,
        }
    }

    fn contribution(&self) -> f64 {
        if self.enabled {
            self.value
        } else {
            0.0
        }
    }
}

impl Default for RateTerm {
    fn default() -> Self {
        Self::OFF
    }
}

/// The set of rate terms driving one axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateTerms {
    terms: [RateTerm; 4],
}

impl RateTerms {
    pub fn get(&self, kind: RateKind) -> RateTerm {
        self.terms[kind.index()]
    }

    /// Replace a term's value, keeping its enabled flag
    pub fn set(&mut self, kind: RateKind, value: f64) {
        self.terms[kind.index()].value = value;
    }

    pub fn enable(&mut self, kind: RateKind, enabled: bool) {
        self.terms[kind.index()].enabled = enabled;
    }

    /// Summed rate while tracking: every enabled term
    pub fn tracking_sum(&self) -> f64 {
        self.terms.iter().map(RateTerm::contribution).sum()
    }

    /// Summed rate while idle: guiding still moves the axis
    pub fn idle_sum(&self) -> f64 {
        self.get(RateKind::Guide).contribution()
    }
}

/// Base tracking rate preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingRate {
    #[default]
    Sidereal,
    Solar,
    Lunar,
    /// Sidereal corrected for mean refraction near the pole
    King,
}

impl TrackingRate {
    /// Rate in multiples of sidereal
    pub fn multiplier(self) -> f64 {
        match self {
            TrackingRate::Sidereal => 1.0,
            TrackingRate::Solar => 0.997_270,
            TrackingRate::Lunar => 0.963_595,
            TrackingRate::King => 0.999_720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_skips_disabled_terms() {
        let mut terms = RateTerms::default();
        terms.set(RateKind::Tracking, 1.0);
        terms.enable(RateKind::Tracking, true);
        terms.set(RateKind::Guide, 0.5);
        assert_eq!(terms.tracking_sum(), 1.0);

        terms.enable(RateKind::Guide, true);
        assert_eq!(terms.tracking_sum(), 1.5);
    }

    #[test]
    fn test_idle_sum_is_guide_only() {
        let mut terms = RateTerms::default();
        for kind in RateKind::ALL {
            terms.set(kind, 1.0);
            terms.enable(kind, true);
        }
        assert_eq!(terms.tracking_sum(), 4.0);
        assert_eq!(terms.idle_sum(), 1.0);
    }

    #[test]
    fn test_set_keeps_enable_flag() {
        let mut terms = RateTerms::default();
        terms.enable(RateKind::Pec, true);
        terms.set(RateKind::Pec, -0.25);
        assert_eq!(terms.get(RateKind::Pec), RateTerm::new(-0.25));
    }

    #[test]
    fn test_tracking_presets() {
        assert_eq!(TrackingRate::default().multiplier(), 1.0);
        assert!(TrackingRate::Solar.multiplier() < 1.0);
        assert!(TrackingRate::Lunar.multiplier() < TrackingRate::Solar.multiplier());
    }
}
