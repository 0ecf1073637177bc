//! RP2040-specific HAL for the mount firmware
//!
//! Implementations of the shared traits on RP2040 peripherals:
//!
//! - Flash storage driver (implements `equinox_hal::FlashStorage`)
//! - GPIO step/dir stepper driver (implements
//!   `equinox_core::traits::StepperDriver`)

#![no_std]

pub mod flash;
pub mod stepper;

// Re-export shared traits from equinox-hal for convenience
pub use equinox_hal::{FlashStorage as FlashStorageTrait, StorageKey};
