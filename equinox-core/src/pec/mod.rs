//! Periodic error correction
//!
//! The correction table lives in a [`PecBuffer`] shared between the
//! motion loop, which records and plays it, and the control context,
//! which saves and restores it. The [`PecEngine`] runs inside the motion
//! loop.

pub mod buffer;
pub mod engine;

pub use buffer::PecBuffer;
pub use engine::PecEngine;
