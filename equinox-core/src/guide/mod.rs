//! Guiding
//!
//! Manual and autoguider corrections layered on top of tracking as the
//! guide rate term.

pub mod overlay;
pub mod rate;

pub use overlay::{GuideAction, GuideOverlay};
pub use rate::{GuideDirection, GuideRate};
