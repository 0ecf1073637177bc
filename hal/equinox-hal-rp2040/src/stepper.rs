//! GPIO step/dir stepper driver
//!
//! Drives TMC2209 (legacy step/dir), DRV8825 or A4988 style drivers from
//! plain GPIO: one pulse per `step()`, direction and enable levels, up to
//! three microstep mode pins and an optional fault input.

use embassy_rp::gpio::{Input, Level, Output};
use equinox_core::traits::{Direction, StepperDriver};

/// Busy-wait cycles for the step pulse high time (about 2 µs at 125 MHz)
const STEP_PULSE_CYCLES: u32 = 250;

/// Electrical conventions of the driver board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverPolarity {
    /// Enable input is active low (true for every common driver)
    pub enable_inverted: bool,
    /// Fault/diag output is active low
    pub fault_active_low: bool,
}

impl Default for DriverPolarity {
    fn default() -> Self {
        Self {
            enable_inverted: true,
            fault_active_low: true,
        }
    }
}

/// Step/dir driver on RP2040 GPIO
pub struct GpioStepper<'d> {
    step_pin: Output<'d>,
    dir_pin: Output<'d>,
    enable_pin: Output<'d>,
    /// M0, M1, M2; absent pins are strapped on the board
    mode_pins: [Option<Output<'d>>; 3],
    fault_pin: Option<Input<'d>>,
    polarity: DriverPolarity,
    enabled: bool,
}

impl<'d> GpioStepper<'d> {
    /// Wrap configured pins; the driver starts disabled
    pub fn new(
        step_pin: Output<'d>,
        dir_pin: Output<'d>,
        mut enable_pin: Output<'d>,
        mode_pins: [Option<Output<'d>>; 3],
        fault_pin: Option<Input<'d>>,
        polarity: DriverPolarity,
    ) -> Self {
        enable_pin.set_level(Self::enable_level(false, polarity));
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            mode_pins,
            fault_pin,
            polarity,
            enabled: false,
        }
    }

    fn enable_level(enabled: bool, polarity: DriverPolarity) -> Level {
        match (enabled, polarity.enable_inverted) {
            (true, true) | (false, false) => Level::Low,
            (true, false) | (false, true) => Level::High,
        }
    }
}

impl StepperDriver for GpioStepper<'_> {
    fn set_direction(&mut self, dir: Direction) {
        match dir {
            Direction::Forward => self.dir_pin.set_low(),
            Direction::Reverse => self.dir_pin.set_high(),
        }
    }

    fn step(&mut self) {
        self.step_pin.set_high();
        cortex_m::asm::delay(STEP_PULSE_CYCLES);
        self.step_pin.set_low();
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.enable_pin
            .set_level(Self::enable_level(enabled, self.polarity));
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bit n of `code` drives mode pin Mn
    fn set_microstep_code(&mut self, code: u8) {
        for (bit, pin) in self.mode_pins.iter_mut().enumerate() {
            if let Some(pin) = pin {
                pin.set_level(Level::from(code & (1 << bit) != 0));
            }
        }
    }

    fn is_faulted(&self) -> bool {
        match &self.fault_pin {
            Some(pin) => pin.is_low() == self.polarity.fault_active_low,
            None => false,
        }
    }
}
