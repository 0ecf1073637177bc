//! Events that drive the park and PEC state machines

/// Events in the park sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParkEvent {
    /// A park slew was accepted
    Begin,
    /// Both axes reached the park position
    Arrived,
    /// An axis faulted during the park slew
    Fault,
    /// The park slew was aborted
    Aborted,
    /// Unpark requested
    Unpark,
    /// Operator cleared a failed park
    Reset,
}

/// Events in the PEC sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PecEvent {
    ArmRecord,
    ArmPlay,
    /// Rising edge of the worm index sensor
    IndexSensed,
    /// A full worm rotation was recorded
    RecordComplete { then_play: bool },
    /// No complete rotation within the step budget
    RecordAbandoned,
    /// Tracking stopped while playing
    Suspend,
    Stop,
}
