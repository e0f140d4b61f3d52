//! `f64` implementation of [`ArithmeticBackend`].
//!
//! Only available with the `float` Cargo feature.  [`FloatingPoint`] runs
//! the same classifier and handlers as [`FixedPoint`](super::FixedPoint)
//! without integer truncation, which suits off-chain simulation where
//! bit-for-bit parity with on-chain math is not required.
//!
//! Results are still range-checked: negative, non-finite and
//! above-`MAX_UINT256` values fault instead of propagating.

use core::fmt;

use crate::domain::Rate;
use crate::error::{ArithmeticFault, FaultKind};

use super::ArithmeticBackend;

/// `2²⁵⁶ − 1` rounded to the nearest `f64`.
const MAX_UINT256_F64: f64 = 1.157_920_892_373_162e77;

/// Non-negative `f64` amount with range-checked arithmetic.
///
/// # Examples
///
/// ```
/// use bancor_settlement::math::{ArithmeticBackend, FloatingPoint};
///
/// let Ok(a) = FloatingPoint::new(10.0) else { panic!() };
/// let Ok(b) = FloatingPoint::new(4.0) else { panic!() };
/// let Ok(q) = a.checked_div(&b) else { panic!() };
/// assert!((q.get() - 2.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FloatingPoint(f64);

impl FloatingPoint {
    /// Creates a validated amount.
    ///
    /// # Errors
    ///
    /// Faults on negative, non-finite or out-of-range values.
    pub fn new(value: f64) -> Result<Self, ArithmeticFault> {
        Self::validated(value, || format!("{value}"))
    }

    /// Returns the underlying `f64`.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }

    fn validated(
        value: f64,
        expression: impl FnOnce() -> String,
    ) -> Result<Self, ArithmeticFault> {
        let kind = if !value.is_finite() {
            FaultKind::NonFinite
        } else if value < 0.0 {
            FaultKind::Negative
        } else if value > MAX_UINT256_F64 {
            FaultKind::Overflow
        } else {
            return Ok(Self(value));
        };
        Err(ArithmeticFault::new(kind, expression(), value.to_string()))
    }
}

impl fmt::Display for FloatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ArithmeticBackend for FloatingPoint {
    const NAME: &'static str = "float";

    #[inline]
    fn zero() -> Self {
        Self(0.0)
    }

    #[inline]
    fn one() -> Self {
        Self(1.0)
    }

    /// Values above 2⁵³ lose precision.
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    fn from_u128(value: u128) -> Self {
        Self(value as f64)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    // -- Checked arithmetic -------------------------------------------------

    fn checked_add(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        Self::validated(self.0 + other.0, || format!("{self} + {other}"))
    }

    fn checked_sub(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        Self::validated(self.0 - other.0, || format!("{self} - {other}"))
    }

    fn checked_mul(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        Self::validated(self.0 * other.0, || format!("{self} * {other}"))
    }

    fn checked_div(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        if other.0 == 0.0 {
            return Err(ArithmeticFault::new(
                FaultKind::DivisionByZero,
                format!("{self} / {other}"),
                "undefined",
            ));
        }
        Self::validated(self.0 / other.0, || format!("{self} / {other}"))
    }

    // -- Rates --------------------------------------------------------------

    fn mul_rate(&self, rate: Rate) -> Result<Self, ArithmeticFault> {
        Self::validated(self.0 * rate.to_f64_lossy(), || format!("{self} * {rate}"))
    }

    fn div_rate(&self, rate: Rate) -> Result<Self, ArithmeticFault> {
        if !rate.is_positive() {
            return Err(ArithmeticFault::new(
                FaultKind::DivisionByZero,
                format!("{self} / {rate}"),
                "undefined",
            ));
        }
        Self::validated(self.0 / rate.to_f64_lossy(), || format!("{self} / {rate}"))
    }

    fn rate_of(numerator: &Self, denominator: &Self) -> Result<Rate, ArithmeticFault> {
        let quotient = numerator.checked_div(denominator)?;
        Rate::from_f64(quotient.0).map_err(|_| {
            ArithmeticFault::new(
                FaultKind::Overflow,
                format!("{numerator} / {denominator}"),
                "rate outside I80F48",
            )
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Ppm;

    type F = FloatingPoint;

    fn f(v: f64) -> F {
        let Ok(x) = F::new(v) else {
            panic!("valid float");
        };
        x
    }

    #[test]
    fn new_rejects_invalid_values() {
        assert!(F::new(-1.0).is_err());
        assert!(F::new(f64::NAN).is_err());
        assert!(F::new(f64::INFINITY).is_err());
        assert!(F::new(2e77).is_err());
        assert!(F::new(0.0).is_ok());
    }

    #[test]
    fn sub_below_zero_is_negative_fault() {
        let Err(fault) = f(1.0).checked_sub(&f(2.0)) else {
            panic!("expected fault");
        };
        assert_eq!(fault.kind(), FaultKind::Negative);
    }

    #[test]
    fn mul_above_max_is_overflow_fault() {
        let Err(fault) = f(1e40).checked_mul(&f(1e40)) else {
            panic!("expected fault");
        };
        assert_eq!(fault.kind(), FaultKind::Overflow);
    }

    #[test]
    fn div_is_exact() {
        let Ok(q) = f(10.0).checked_div(&f(4.0)) else {
            panic!("expected Ok");
        };
        assert!((q.get() - 2.5).abs() < f64::EPSILON);
        assert!(f(1.0).checked_div(&F::zero()).is_err());
    }

    #[test]
    fn mul_ppm_keeps_fraction() {
        let Ok(r) = f(1_000.0).mul_ppm(Ppm::new(2_500)) else {
            panic!("expected Ok");
        };
        assert!((r.get() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rate_helpers() {
        let Ok(rate) = F::rate_of(&f(3.0), &f(2.0)) else {
            panic!("expected Ok");
        };
        let Ok(bnt) = f(100.0).mul_rate(rate) else {
            panic!("expected Ok");
        };
        assert!((bnt.get() - 150.0).abs() < 1e-9);
        let Ok(tkn) = bnt.div_rate(rate) else {
            panic!("expected Ok");
        };
        assert!((tkn.get() - 100.0).abs() < 1e-9);
        assert!(f(1.0).div_rate(Rate::ZERO).is_err());
    }
}
