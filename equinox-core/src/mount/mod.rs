//! The two execution contexts of the mount
//!
//! [`MotionLoop`] runs at the motion tick and drives the axes;
//! [`Mount`] runs at the control rate and decides what they should do.

pub mod control;
pub mod step_loop;

pub use control::Mount;
pub use step_loop::{MotionLoop, TickInputs};
