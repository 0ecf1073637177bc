//! Externally observable mount status
//!
//! A [`StatusSnapshot`] is assembled by the control context from its own
//! state machines and one consistent telemetry read. It owns no truth of
//! its own and is replaced wholesale on every poll, so readers never see
//! a mix of old and new state.

use crate::goto::MountKind;
use crate::motion::{RateCompensationMode, TrackingRate};
use crate::state::{
    ErrorCode, GotoError, MeridianFlipPolicy, ParkState, PecState, PierSide, PreferredPierSide,
    TrackingState,
};
use crate::Axis;

/// Complete status as seen by the command layer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub kind: MountKind,
    pub tracking: TrackingState,
    pub park: ParkState,
    pub pec: PecState,
    /// Sticky error, until cleared or superseded
    pub last_error: ErrorCode,
    /// Reason the most recent goto was rejected (display only)
    pub last_goto_error: Option<GotoError>,
    pub axis_fault: [bool; 2],
    pub pier_side: PierSide,
    pub aligning: bool,
    pub guiding: bool,
    pub at_home: bool,
    pub waiting_home: bool,
    pub slewing: bool,
    pub in_backlash: [bool; 2],
    pub enabled: bool,
    pub pps_synced: bool,
    /// LST counter in 0.01 sidereal seconds
    pub lst: u32,
    /// Axis positions in microsteps
    pub positions: [i32; 2],
    /// Axis angles in degrees
    pub axes_deg: [f64; 2],
    pub ha_deg: f64,
    pub dec_deg: f64,
    pub alt_deg: f64,
    pub meridian_flip: MeridianFlipPolicy,
    pub preferred_pier_side: PreferredPierSide,
    pub rate_compensation: RateCompensationMode,
    pub tracking_rate: TrackingRate,
    pub pec_table_valid: bool,
}

impl StatusSnapshot {
    pub fn axis_fault(&self, axis: Axis) -> bool {
        self.axis_fault[axis.index()]
    }

    /// True when nothing is moving the axes except tracking
    pub fn is_idle(&self) -> bool {
        !self.slewing && !self.guiding && self.park != ParkState::Parking
    }

    /// Compact flag string in the style of the LX200 extended status
    ///
    /// Each character present marks one condition: `n` not tracking,
    /// `N` not slewing, `p`/`P`/`I`/`F` park state, `H` at home,
    /// `h` waiting at home, `G` guiding, `E`/`W` pier side, then the
    /// PEC state character and the numeric last-error code.
    pub fn flags(&self) -> heapless::String<16> {
        let mut out = heapless::String::new();
        let mut push = |c: char| {
            let _ = out.push(c);
        };
        if self.tracking != TrackingState::Sidereal {
            push('n');
        }
        if !self.slewing {
            push('N');
        }
        push(match self.park {
            ParkState::NotParked => 'p',
            ParkState::Parked => 'P',
            ParkState::Parking => 'I',
            ParkState::ParkFailed => 'F',
            ParkState::Unknown => '?',
        });
        if self.at_home {
            push('H');
        }
        if self.waiting_home {
            push('h');
        }
        if self.guiding {
            push('G');
        }
        match self.pier_side {
            PierSide::East => push('E'),
            PierSide::West => push('W'),
            PierSide::None => {}
        }
        push(self.pec.status_char());
        let code = self.last_error.as_code();
        if code >= 10 {
            push('1');
        }
        push(char::from(b'0' + code % 10));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let status = StatusSnapshot::default();
        assert!(status.is_idle());
        assert!(!status.axis_fault(Axis::Primary));
        assert_eq!(status.flags().as_str(), "nNpI0");
    }

    #[test]
    fn test_flags() {
        let status = StatusSnapshot {
            tracking: TrackingState::Sidereal,
            park: ParkState::ParkFailed,
            guiding: true,
            pier_side: PierSide::West,
            pec: PecState::Playing,
            last_error: ErrorCode::AltitudeMax,
            ..Default::default()
        };
        assert_eq!(status.flags().as_str(), "NFGWP12");
        assert!(!status.is_idle());
    }
}
