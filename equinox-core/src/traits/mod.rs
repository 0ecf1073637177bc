//! Hardware abstraction traits
//!
//! These traits define the interface between the motion core
//! and hardware-specific implementations.

pub mod stepper;

pub use stepper::{Direction, StepperDriver};

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory stepper used by the unit tests

    use super::{Direction, StepperDriver};

    #[derive(Debug, Clone)]
    pub struct MockStepper {
        pub direction: Direction,
        pub pulses: u32,
        pub forward_pulses: u32,
        pub reverse_pulses: u32,
        pub enabled: bool,
        pub microstep_code: u8,
        pub code_changes: u32,
        pub faulted: bool,
    }

    impl MockStepper {
        pub fn new() -> Self {
            Self {
                direction: Direction::Forward,
                pulses: 0,
                forward_pulses: 0,
                reverse_pulses: 0,
                enabled: false,
                microstep_code: 0,
                code_changes: 0,
                faulted: false,
            }
        }
    }

    impl StepperDriver for MockStepper {
        fn set_direction(&mut self, dir: Direction) {
            self.direction = dir;
        }

        fn step(&mut self) {
            self.pulses += 1;
            match self.direction {
                Direction::Forward => self.forward_pulses += 1,
                Direction::Reverse => self.reverse_pulses += 1,
            }
        }

        fn enable(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_microstep_code(&mut self, code: u8) {
            if code != self.microstep_code {
                self.code_changes += 1;
            }
            self.microstep_code = code;
        }

        fn is_faulted(&self) -> bool {
            self.faulted
        }
    }
}
