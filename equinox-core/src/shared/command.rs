//! Commands from the control context to the motion loop

use heapless::spsc::{Consumer, Producer, Queue};

use crate::motion::RateKind;
use crate::traits::Direction;
use crate::Axis;

/// Queue capacity (one slot is kept free by the ring buffer)
pub const COMMAND_QUEUE_LEN: usize = 16;

pub type CommandQueue = Queue<MotionCommand, COMMAND_QUEUE_LEN>;
pub type CommandProducer<'a> = Producer<'a, MotionCommand, COMMAND_QUEUE_LEN>;
pub type CommandConsumer<'a> = Consumer<'a, MotionCommand, COMMAND_QUEUE_LEN>;

/// Request applied by the motion loop at the start of its next tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionCommand {
    /// Slew one axis to an absolute position in microsteps
    SetTarget { axis: Axis, steps: i32, slew_id: u8 },
    /// Stop all slews at once
    Abort,
    /// Integrate all rate terms (true) or only guiding (false)
    SetTracking(bool),
    SetRate { axis: Axis, kind: RateKind, value: f64 },
    EnableRate { axis: Axis, kind: RateKind, enabled: bool },
    EnableAxes(bool),
    Guide { axis: Axis, dir: Direction, rate_x: f64 },
    PulseGuide {
        axis: Axis,
        dir: Direction,
        rate_x: f64,
        ticks: u32,
    },
    /// Stop guiding one axis, or both with `None`
    StopGuide(Option<Axis>),
    PecArmRecord,
    PecArmPlay,
    PecStop,
    PecClear,
    /// Measured PPS interval in local microseconds
    PpsPulse(u32),
    PpsLost,
    /// Sidereal interval as an offset from nominal
    SetInterval(i32),
    AdjustInterval(i32),
    ClearFault(Axis),
}
