//! Sidereal time base
//!
//! Hardware time is counted in ticks of 1/16 µs. The local sidereal time
//! counter advances in hundredths of a sidereal second.

pub mod sidereal;

pub use sidereal::{
    SiderealClock, SiderealTick, HW_TICKS_PER_SECOND, LST_TICKS_PER_SIDEREAL_SECOND,
    NOMINAL_PPS_MICROS, NOMINAL_SIDEREAL_INTERVAL,
};
