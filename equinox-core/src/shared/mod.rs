//! Cross-context plumbing
//!
//! The control context talks to the motion loop only through a bounded
//! single-producer queue of [`MotionCommand`]s, and reads it back only
//! through the seqlock-published [`MotionTelemetry`].

pub mod command;
pub mod telemetry;

pub use command::{
    CommandConsumer, CommandProducer, CommandQueue, MotionCommand, COMMAND_QUEUE_LEN,
};
pub use telemetry::{AxisTelemetry, MotionTelemetry, TelemetrySnapshot};
