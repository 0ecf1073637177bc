//! Safety monitor implementation
//!
//! Watches driver faults, the limit switch, and the pointing limits. The
//! control context feeds it each poll and acts on the first violation.

use crate::config::{LimitsConfig, MountConfig};
use crate::goto::MountKind;
use crate::state::{ErrorCode, PierSide};

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Safety condition violated
    Fault(ErrorCode),
}

/// Where the mount is pointing, as seen by the control context
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pointing {
    pub ha_deg: f64,
    pub dec_deg: f64,
    pub alt_deg: f64,
    pub axes_deg: [f64; 2],
    pub side: PierSide,
}

/// Safety monitor for fault detection
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    kind: MountKind,
    limits: LimitsConfig,
    travel: [(f64, f64); 2],
    motor_fault: bool,
    limit_sense: bool,
    pointing: Option<Pointing>,
}

impl SafetyMonitor {
    pub fn new(config: &MountConfig) -> Self {
        Self {
            kind: config.kind,
            limits: config.limits.clone(),
            travel: [
                (config.axis1.min_deg, config.axis1.max_deg),
                (config.axis2.min_deg, config.axis2.max_deg),
            ],
            motor_fault: false,
            limit_sense: false,
            pointing: None,
        }
    }

    /// Update the latched driver fault of either axis
    pub fn update_motor_fault(&mut self, faulted: bool) {
        self.motor_fault = faulted;
    }

    /// Update the limit switch input
    pub fn update_limit_sense(&mut self, tripped: bool) {
        self.limit_sense = tripped;
    }

    pub fn update_pointing(&mut self, pointing: Pointing) {
        self.pointing = Some(pointing);
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Check all safety conditions
    ///
    /// Returns the first fault detected. Pointing limits are only checked
    /// when `check_pointing` is set, so a parked mount below the horizon
    /// is not an error.
    pub fn check(&self, check_pointing: bool) -> SafetyStatus {
        if self.motor_fault {
            return SafetyStatus::Fault(ErrorCode::MotorFault);
        }

        if self.limit_sense {
            return SafetyStatus::Fault(ErrorCode::LimitSense);
        }

        match self.pointing {
            Some(pointing) if check_pointing => self.check_pointing(&pointing),
            _ => SafetyStatus::Ok,
        }
    }

    fn check_pointing(&self, p: &Pointing) -> SafetyStatus {
        if p.alt_deg < self.limits.min_altitude_deg {
            return SafetyStatus::Fault(ErrorCode::AltitudeMin);
        }
        if p.alt_deg > self.limits.max_altitude_deg {
            return SafetyStatus::Fault(ErrorCode::AltitudeMax);
        }

        let outside = |value: f64, (min, max): (f64, f64)| value < min || value > max;

        if self.kind.is_equatorial() && outside(p.axes_deg[1], self.travel[1]) {
            return SafetyStatus::Fault(ErrorCode::DecLimit);
        }
        if self.kind == MountKind::AltAzimuth && outside(p.axes_deg[0], self.travel[0]) {
            return SafetyStatus::Fault(ErrorCode::AzimuthLimit);
        }

        if self.kind.is_equatorial() {
            let under_pole = match (self.kind, p.side) {
                (MountKind::GermanEquatorial, PierSide::East) => p.ha_deg > self.limits.under_pole_deg,
                (MountKind::GermanEquatorial, PierSide::West) => p.ha_deg < -self.limits.under_pole_deg,
                _ => libm::fabs(p.ha_deg) > self.limits.under_pole_deg,
            };
            if under_pole || outside(p.axes_deg[0], self.travel[0]) {
                return SafetyStatus::Fault(ErrorCode::UnderPole);
            }
        }

        if self.kind.past_meridian(p.ha_deg, p.side, &self.limits) {
            return SafetyStatus::Fault(ErrorCode::Meridian);
        }

        SafetyStatus::Ok
    }
}
