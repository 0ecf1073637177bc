//! Equinox Hardware Abstraction Layer
//!
//! Traits implemented by chip-specific HALs so the motion core can
//! persist settings without knowing how the board stores them.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  equinox-core / equinox-firmware       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  equinox-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ equinox-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! Step/dir drivers are abstracted by `equinox_core::traits::StepperDriver`,
//! which lives next to the code that drives it.

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
