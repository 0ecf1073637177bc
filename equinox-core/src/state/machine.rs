//! Mount state machines
//!
//! Tracking, park and PEC states are each a small explicit machine. The
//! control context is the only writer of tracking and park state; PEC
//! state is advanced by the motion loop because index-sensor edges are
//! only observed there.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::events::{ParkEvent, PecEvent};

/// Tracking state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackingState {
    /// Axes hold position
    #[default]
    None,
    /// Primary axis follows the sky at the selected tracking rate
    Sidereal,
    /// A goto, park or home slew is in progress
    Slewing,
}

/// Park state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParkState {
    #[default]
    NotParked,
    Parking,
    Parked,
    /// A fault interrupted the park slew; cleared only by an explicit reset
    ParkFailed,
    Unknown,
}

impl ParkState {
    /// Process an event and return the next park state
    pub fn transition(self, event: ParkEvent) -> Self {
        use ParkState::*;

        match (self, event) {
            (NotParked | Unknown, ParkEvent::Begin) => Parking,
            (Parking, ParkEvent::Arrived) => Parked,
            (Parking, ParkEvent::Fault) => ParkFailed,
            (Parking, ParkEvent::Aborted) => NotParked,
            (Parked | Unknown, ParkEvent::Unpark) => NotParked,
            (ParkFailed, ParkEvent::Reset) => NotParked,

            _ => self,
        }
    }

    /// True once the mount is parked (or failed while parking)
    pub fn blocks_motion(&self) -> bool {
        matches!(self, ParkState::Parked | ParkState::ParkFailed)
    }
}

/// Periodic error correction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PecState {
    #[default]
    Ignore = 0,
    ReadyToPlay = 1,
    Playing = 2,
    ReadyToRecord = 3,
    Recording = 4,
}

impl PecState {
    /// Process an event and return the next PEC state
    pub fn transition(self, event: PecEvent) -> Self {
        use PecState::*;

        match (self, event) {
            (Ignore | ReadyToPlay, PecEvent::ArmRecord) => ReadyToRecord,
            (Ignore, PecEvent::ArmPlay) => ReadyToPlay,

            (ReadyToRecord, PecEvent::IndexSensed) => Recording,
            (Recording, PecEvent::RecordComplete { then_play: false }) => Ignore,
            (Recording, PecEvent::RecordComplete { then_play: true }) => ReadyToPlay,
            (ReadyToRecord | Recording, PecEvent::RecordAbandoned) => Ignore,

            (ReadyToPlay, PecEvent::IndexSensed) => Playing,
            (Playing, PecEvent::Suspend) => ReadyToPlay,

            (_, PecEvent::Stop) => Ignore,

            _ => self,
        }
    }

    /// Decode the telemetry representation
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PecState::ReadyToPlay,
            2 => PecState::Playing,
            3 => PecState::ReadyToRecord,
            4 => PecState::Recording,
            _ => PecState::Ignore,
        }
    }

    /// Single-character status code (`I`, `p`, `P`, `r`, `R`)
    pub fn status_char(&self) -> char {
        match self {
            PecState::Ignore => 'I',
            PecState::ReadyToPlay => 'p',
            PecState::Playing => 'P',
            PecState::ReadyToRecord => 'r',
            PecState::Recording => 'R',
        }
    }
}

/// When a German equatorial mount may cross the meridian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeridianFlipPolicy {
    Never,
    /// Only while an alignment is in progress
    IfAligned,
    #[default]
    Always,
}

impl MeridianFlipPolicy {
    /// Whether a pier-side change is allowed right now
    pub fn permits_flip(&self, aligning: bool) -> bool {
        match self {
            MeridianFlipPolicy::Never => false,
            MeridianFlipPolicy::IfAligned => aligning,
            MeridianFlipPolicy::Always => true,
        }
    }
}

/// Side of the pier the optical tube is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PierSide {
    /// Unknown, at home, or a mount without pier sides
    #[default]
    None,
    East,
    West,
}

impl PierSide {
    /// The other side (None stays None)
    pub fn opposite(self) -> Self {
        match self {
            PierSide::East => PierSide::West,
            PierSide::West => PierSide::East,
            PierSide::None => PierSide::None,
        }
    }
}

/// Pier side preference for gotos that are reachable from either side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PreferredPierSide {
    #[default]
    Best,
    East,
    West,
}
