//! Motion generation
//!
//! Fixed-point step accumulation, additive rate terms, the slew ramp and
//! the per-axis step generator that combines them.

pub mod axis;
pub mod compensation;
pub mod fixed;
pub mod planner;
pub mod rates;

pub use axis::{AxisMode, AxisMotionController};
pub use compensation::{compensation_rates, PointingModel, RateCompensationMode};
pub use fixed::Fixed;
pub use planner::{MotionState, RampPlanner};
pub use rates::{RateKind, RateTerm, RateTerms, TrackingRate};
