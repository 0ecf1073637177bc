//! Guide rate table and compass directions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::PierSide;
use crate::traits::Direction;
use crate::Axis;

/// Selectable guide rates, in multiples of sidereal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GuideRate {
    X0_25,
    Half,
    #[default]
    X1,
    X2,
    X4,
    X8,
    X20,
    X48,
    /// Half the maximum slew rate
    HalfMax,
    /// The maximum slew rate
    Max,
}

impl GuideRate {
    pub const ALL: [GuideRate; 10] = [
        GuideRate::X0_25,
        GuideRate::Half,
        GuideRate::X1,
        GuideRate::X2,
        GuideRate::X4,
        GuideRate::X8,
        GuideRate::X20,
        GuideRate::X48,
        GuideRate::HalfMax,
        GuideRate::Max,
    ];

    /// Rate selected by command-layer index (0..=9)
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Rate in multiples of sidereal, given the axis' maximum slew rate
    pub fn multiplier(self, max_x: f64) -> f64 {
        match self {
            GuideRate::X0_25 => 0.25,
            GuideRate::Half => 0.5,
            GuideRate::X1 => 1.0,
            GuideRate::X2 => 2.0,
            GuideRate::X4 => 4.0,
            GuideRate::X8 => 8.0,
            GuideRate::X20 => 20.0,
            GuideRate::X48 => 48.0,
            GuideRate::HalfMax => max_x / 2.0,
            GuideRate::Max => max_x,
        }
    }
}

/// Compass direction of a guide command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuideDirection {
    North,
    South,
    East,
    West,
}

impl GuideDirection {
    /// Axis and travel direction for this compass direction
    ///
    /// West speeds up the primary axis. On the west side of a GEM the
    /// secondary axis runs backwards, so north and south swap.
    pub fn resolve(self, side: PierSide) -> (Axis, Direction) {
        let flipped = side == PierSide::West;
        match self {
            GuideDirection::West => (Axis::Primary, Direction::Forward),
            GuideDirection::East => (Axis::Primary, Direction::Reverse),
            GuideDirection::North if flipped => (Axis::Secondary, Direction::Reverse),
            GuideDirection::North => (Axis::Secondary, Direction::Forward),
            GuideDirection::South if flipped => (Axis::Secondary, Direction::Forward),
            GuideDirection::South => (Axis::Secondary, Direction::Reverse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        assert_eq!(GuideRate::from_index(0), Some(GuideRate::X0_25));
        assert_eq!(GuideRate::from_index(6), Some(GuideRate::X20));
        assert_eq!(GuideRate::from_index(9), Some(GuideRate::Max));
        assert_eq!(GuideRate::from_index(10), None);
        for (i, rate) in GuideRate::ALL.iter().enumerate() {
            assert_eq!(rate.index() as usize, i);
        }
    }

    #[test]
    fn test_multiplier() {
        assert_eq!(GuideRate::X0_25.multiplier(960.0), 0.25);
        assert_eq!(GuideRate::X48.multiplier(960.0), 48.0);
        assert_eq!(GuideRate::HalfMax.multiplier(960.0), 480.0);
        assert_eq!(GuideRate::Max.multiplier(960.0), 960.0);
    }

    #[test]
    fn test_resolve_swaps_dec_on_west_side() {
        assert_eq!(
            GuideDirection::North.resolve(PierSide::East),
            (Axis::Secondary, Direction::Forward)
        );
        assert_eq!(
            GuideDirection::North.resolve(PierSide::West),
            (Axis::Secondary, Direction::Reverse)
        );
        assert_eq!(
            GuideDirection::East.resolve(PierSide::West),
            (Axis::Primary, Direction::Reverse)
        );
    }
}
