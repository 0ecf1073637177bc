//! Slew acceleration profile
//!
//! Speed follows a constant-acceleration law: after `n` steps from rest
//! the speed is `v = sqrt(2 a n)`, so the ramp reaches `max_speed` after
//! `max_speed² / 2a` steps. Deceleration mirrors acceleration on the
//! distance still to go, so every slew is a symmetric trapezoid (or a
//! triangle when the slew is shorter than two ramps).

/// Current motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Axis is not slewing
    Stopped,
    /// Speed is still increasing with distance traveled
    Accelerating,
    /// Cruising at the maximum speed
    AtSpeed,
    /// Speed is decreasing with the remaining distance
    Decelerating,
}

/// Square-root ramp for goto slews
///
/// Speeds are in tracking microsteps per motion-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampPlanner {
    max_speed: f64,
    ramp_steps: f64,
}

impl RampPlanner {
    /// Create a planner reaching `max_speed` after `ramp_steps`
    pub fn new(max_speed: f64, ramp_steps: f64) -> Self {
        Self {
            max_speed: max_speed.max(0.0),
            ramp_steps: ramp_steps.max(1.0),
        }
    }

    /// Create a planner from an acceleration in steps per tick²
    pub fn from_acceleration(max_speed: f64, accel: f64) -> Self {
        let ramp_steps = if accel > 0.0 {
            max_speed * max_speed / (2.0 * accel)
        } else {
            1.0
        };
        Self::new(max_speed, ramp_steps)
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Steps needed to reach full speed from rest
    pub fn ramp_steps(&self) -> f64 {
        self.ramp_steps
    }

    /// Speed for a slew that has covered `traveled` steps with `to_go` left
    ///
    /// Never returns zero while the axis still has distance to cover, so a
    /// slew always makes progress.
    pub fn speed(&self, traveled: u32, to_go: u32) -> f64 {
        let n = traveled.min(to_go) as f64 + 1.0;
        let v = self.max_speed * libm::sqrt(n / self.ramp_steps);
        v.min(self.max_speed)
    }

    /// Ramp phase at a point in the slew
    pub fn phase(&self, traveled: u32, to_go: u32) -> MotionState {
        if to_go == 0 {
            MotionState::Stopped
        } else if (to_go as f64) < self.ramp_steps && to_go <= traveled {
            MotionState::Decelerating
        } else if (traveled as f64) < self.ramp_steps {
            MotionState::Accelerating
        } else {
            MotionState::AtSpeed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_slow() {
        let planner = RampPlanner::new(1.0, 10_000.0);
        let v = planner.speed(0, 50_000);
        assert!(v > 0.0);
        assert!((v - 0.01).abs() < 1e-9);
        assert_eq!(planner.phase(0, 50_000), MotionState::Accelerating);
    }

    #[test]
    fn test_reaches_max_speed_after_ramp() {
        let planner = RampPlanner::new(0.8, 10_000.0);
        assert_eq!(planner.speed(9_999, 50_000), 0.8);
        assert_eq!(planner.speed(20_000, 20_000), 0.8);
        assert_eq!(planner.phase(20_000, 20_000), MotionState::AtSpeed);
    }

    #[test]
    fn test_deceleration_mirrors_acceleration() {
        let planner = RampPlanner::new(1.0, 400.0);
        assert_eq!(planner.speed(5_000, 99), planner.speed(99, 5_000));
        assert_eq!(planner.phase(5_000, 99), MotionState::Decelerating);
        assert_eq!(planner.phase(5_000, 0), MotionState::Stopped);
    }

    #[test]
    fn test_short_slew_is_triangular() {
        let planner = RampPlanner::new(1.0, 10_000.0);
        // Peak at the midpoint of a 200 step slew is well under max
        let peak = planner.speed(100, 100);
        assert!(peak < 0.2);
    }

    #[test]
    fn test_from_acceleration() {
        // v² / 2a = 1 / 0.002 = 500 steps
        let planner = RampPlanner::from_acceleration(1.0, 0.001);
        assert!((planner.ramp_steps() - 500.0).abs() < 1e-9);

        let degenerate = RampPlanner::from_acceleration(1.0, 0.0);
        assert_eq!(degenerate.ramp_steps(), 1.0);
        assert_eq!(degenerate.speed(0, 10), 1.0);
    }
}
