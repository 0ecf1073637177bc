//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod control;
pub mod motion;
pub mod pps;
pub mod st4;
pub mod storage;

pub use control::{control_task, ControlInputs};
pub use motion::{motion_task, MotionHardware};
pub use pps::pps_task;
pub use st4::{st4_task, St4Pins};
pub use storage::storage_task;
