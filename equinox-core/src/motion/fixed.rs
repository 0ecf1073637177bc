//! Fixed-point step arithmetic
//!
//! Axis targets and pulse accumulators are kept in Q32.32 so sidereal
//! rates of a few steps per second can be integrated every tick without
//! losing the sub-step remainder.

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Q32.32 fixed-point step count
///
/// Bit split: the upper 32 bits are the signed whole-step count, the lower
/// 32 bits are the fraction of a step. Resolution is 2^-32 step.
///
/// Overflow semantics: `+` and `-` wrap in two's complement, matching the
/// step counter they are compared against. Conversions from `f64` saturate
/// at the representable range and map NaN to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed(i64);

impl Fixed {
    /// Zero value
    pub const ZERO: Self = Self(0);

    /// One whole step
    pub const ONE: Self = Self(1 << Self::FRAC_BITS);

    /// Fractional bits (32)
    pub const FRAC_BITS: u32 = 32;

    const SCALE: f64 = 4_294_967_296.0;

    /// Create from a whole step count
    #[inline]
    pub const fn from_int(steps: i32) -> Self {
        Self((steps as i64) << Self::FRAC_BITS)
    }

    /// Create from the raw Q32.32 representation
    #[inline]
    pub const fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    /// Raw Q32.32 representation
    #[inline]
    pub const fn to_bits(self) -> i64 {
        self.0
    }

    /// Create from a floating-point step count (saturating)
    #[inline]
    pub fn from_f64(steps: f64) -> Self {
        // `as` saturates out-of-range values and maps NaN to 0
        Self((steps * Self::SCALE) as i64)
    }

    /// Convert to floating point
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE
    }

    /// Whole steps, rounded toward negative infinity
    #[inline]
    pub const fn floor(self) -> i32 {
        (self.0 >> Self::FRAC_BITS) as i32
    }

    /// Sub-step remainder in `[0, 1)`
    #[inline]
    pub const fn frac(self) -> Self {
        Self(self.0 & ((1 << Self::FRAC_BITS) - 1))
    }

    /// Absolute value (saturating at the positive limit)
    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Saturating addition
    #[inline]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Clamp to `[-limit, limit]`
    #[inline]
    pub fn clamp_abs(self, limit: Self) -> Self {
        let limit = limit.0.saturating_abs();
        Self(self.0.clamp(-limit, limit))
    }

    /// True if the value is negative
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Fixed {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Fixed {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Fixed {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_int() {
        assert_eq!(Fixed::from_int(5).floor(), 5);
        assert_eq!(Fixed::from_int(-5).floor(), -5);
        assert_eq!(Fixed::from_int(7).frac(), Fixed::ZERO);
    }

    #[test]
    fn test_floor_negative_fraction() {
        // -0.25 floors to -1, with a remainder of 0.75
        let v = Fixed::from_f64(-0.25);
        assert_eq!(v.floor(), -1);
        assert_eq!(v.frac(), Fixed::from_f64(0.75));
    }

    #[test]
    fn test_accumulates_sub_step_rate() {
        // 0.25 step per tick crosses exactly 25 boundaries in 100 ticks
        let rate = Fixed::from_f64(0.25);
        let mut acc = Fixed::ZERO;
        let mut crossings = 0;
        let mut last = acc.floor();
        for _ in 0..100 {
            acc += rate;
            if acc.floor() != last {
                crossings += 1;
                last = acc.floor();
            }
        }
        assert_eq!(crossings, 25);
        assert_eq!(acc, Fixed::from_int(25));
    }

    #[test]
    fn test_add_wraps() {
        let max = Fixed::from_bits(i64::MAX);
        let wrapped = max + Fixed::from_bits(1);
        assert_eq!(wrapped.to_bits(), i64::MIN);
    }

    #[test]
    fn test_from_f64_saturates() {
        assert_eq!(Fixed::from_f64(1.0e30).to_bits(), i64::MAX);
        assert_eq!(Fixed::from_f64(-1.0e30).to_bits(), i64::MIN);
        assert_eq!(Fixed::from_f64(f64::NAN), Fixed::ZERO);
    }

    #[test]
    fn test_clamp_abs() {
        let limit = Fixed::ONE;
        assert_eq!(Fixed::from_int(3).clamp_abs(limit), Fixed::ONE);
        assert_eq!(Fixed::from_int(-3).clamp_abs(limit), -Fixed::ONE);
        assert_eq!(Fixed::from_f64(0.5).clamp_abs(limit), Fixed::from_f64(0.5));
    }
}
