//! Error taxonomies
//!
//! [`ErrorCode`] is a sticky status condition: it stays set until cleared
//! or superseded. [`GotoError`] is a synchronous rejection reason and is
//! never stored by the state machines.

/// Sticky mount error condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    #[default]
    None,
    /// A stepper driver reported a fault
    MotorFault,
    /// Tracked below the minimum altitude
    AltitudeMin,
    /// A limit switch opened
    LimitSense,
    /// Declination axis travel limit
    DecLimit,
    /// Azimuth axis travel limit
    AzimuthLimit,
    /// Primary axis passed the under-pole limit
    UnderPole,
    /// Tracked past the meridian limit
    Meridian,
    /// Sync target outside limits or refused in the current state
    Sync,
    /// Park failed
    Park,
    /// Goto ended off target after a sync
    GotoSync,
    Unspecified,
    /// Tracked above the maximum altitude
    AltitudeMax,
}

impl ErrorCode {
    /// Numeric code used by the command protocol
    pub fn as_code(self) -> u8 {
        match self {
            ErrorCode::None => 0,
            ErrorCode::MotorFault => 1,
            ErrorCode::AltitudeMin => 2,
            ErrorCode::LimitSense => 3,
            ErrorCode::DecLimit => 4,
            ErrorCode::AzimuthLimit => 5,
            ErrorCode::UnderPole => 6,
            ErrorCode::Meridian => 7,
            ErrorCode::Sync => 8,
            ErrorCode::Park => 9,
            ErrorCode::GotoSync => 10,
            ErrorCode::Unspecified => 11,
            ErrorCode::AltitudeMax => 12,
        }
    }

    /// True for any condition other than `None`
    pub fn is_error(&self) -> bool {
        *self != ErrorCode::None
    }
}

/// Reason a goto or park request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GotoError {
    BelowHorizon,
    AboveOverhead,
    /// Axes are disabled
    Standby,
    Parked,
    /// A goto is already in progress
    AlreadyInMotion,
    OutsideLimits,
    HardwareFault,
    /// Guiding or another motion is in progress
    InMotion,
    Unspecified,
}

impl GotoError {
    /// Numeric code used by the command protocol
    pub fn as_code(self) -> u8 {
        match self {
            GotoError::BelowHorizon => 1,
            GotoError::AboveOverhead => 2,
            GotoError::Standby => 3,
            GotoError::Parked => 4,
            GotoError::AlreadyInMotion => 5,
            GotoError::OutsideLimits => 6,
            GotoError::HardwareFault => 7,
            GotoError::InMotion => 8,
            GotoError::Unspecified => 9,
        }
    }
}

/// Result of a command-layer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Rejected for a goto-class reason
    Goto(GotoError),
    /// Rejected with a status-class error
    Status(ErrorCode),
    /// Not valid in the current state
    InvalidState,
    /// The motion command queue is full; retry on the next control cycle
    QueueFull,
}

impl From<GotoError> for CommandError {
    fn from(e: GotoError) -> Self {
        CommandError::Goto(e)
    }
}

impl From<ErrorCode> for CommandError {
    fn from(e: ErrorCode) -> Self {
        CommandError::Status(e)
    }
}

/// Per-axis step generation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisError {
    /// The axis has a latched driver fault
    Fault,
    /// The axis driver is disabled
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            ErrorCode::None,
            ErrorCode::MotorFault,
            ErrorCode::AltitudeMin,
            ErrorCode::LimitSense,
            ErrorCode::DecLimit,
            ErrorCode::AzimuthLimit,
            ErrorCode::UnderPole,
            ErrorCode::Meridian,
            ErrorCode::Sync,
            ErrorCode::Park,
            ErrorCode::GotoSync,
            ErrorCode::Unspecified,
            ErrorCode::AltitudeMax,
        ];
        for (i, code) in codes.iter().enumerate() {
            assert_eq!(code.as_code() as usize, i);
        }
        assert!(!ErrorCode::None.is_error());
        assert!(ErrorCode::MotorFault.is_error());
    }

    #[test]
    fn test_goto_error_codes() {
        assert_eq!(GotoError::BelowHorizon.as_code(), 1);
        assert_eq!(GotoError::Parked.as_code(), 4);
        assert_eq!(GotoError::Unspecified.as_code(), 9);
    }

    #[test]
    fn test_command_error_from() {
        let e: CommandError = GotoError::Parked.into();
        assert_eq!(e, CommandError::Goto(GotoError::Parked));
        let e: CommandError = ErrorCode::Sync.into();
        assert_eq!(e, CommandError::Status(ErrorCode::Sync));
    }
}
