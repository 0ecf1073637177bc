//! Mount state machines and error taxonomies
//!
//! The machines are explicit, finite, and deterministic.

pub mod errors;
pub mod events;
pub mod machine;

pub use errors::{AxisError, CommandError, ErrorCode, GotoError};
pub use events::{ParkEvent, PecEvent};
pub use machine::{
    MeridianFlipPolicy, ParkState, PecState, PierSide, PreferredPierSide, TrackingState,
};
