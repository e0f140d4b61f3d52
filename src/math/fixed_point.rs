//! `U256` implementation of [`ArithmeticBackend`].
//!
//! [`FixedPoint`] wraps [`primitive_types::U256`] and reproduces on-chain
//! integer semantics: every result must lie in `[0, 2²⁵⁶ − 1]` and division
//! floors.  Amounts are plain integers in the token's smallest unit, so
//! truncation after each division step is observable and deterministic.
//!
//! # Precision characteristics
//!
//! | Aspect | Value |
//! |--------|-------|
//! | Range | `0 ..= 2²⁵⁶ − 1` |
//! | Division | floor |
//! | Determinism | 100 % bit-for-bit |

use core::fmt;

use fixed::types::I80F48;
use primitive_types::U256;

use crate::domain::Rate;
use crate::error::{ArithmeticFault, FaultKind};

use super::ArithmeticBackend;

/// Number of fractional bits in a [`Rate`].
const RATE_FRACTION_BITS: u32 = 48;

/// `2⁴⁸` as a `U256`.
fn rate_scale() -> U256 {
    U256::from(1_u128 << RATE_FRACTION_BITS)
}

/// Unsigned 256-bit amount with checked, flooring arithmetic.
///
/// # Examples
///
/// ```
/// use bancor_settlement::math::{ArithmeticBackend, FixedPoint};
///
/// let a = FixedPoint::from_u128(7);
/// let b = FixedPoint::from_u128(2);
/// let Ok(q) = a.checked_div(&b) else { panic!() };
/// assert_eq!(q, FixedPoint::from_u128(3));
/// assert!(b.checked_sub(&a).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPoint(U256);

impl FixedPoint {
    /// Largest representable amount, `2²⁵⁶ − 1`.
    pub const MAX: Self = Self(U256::MAX);

    /// Wraps a raw [`U256`].
    #[inline]
    #[must_use]
    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    /// Returns the underlying [`U256`].
    #[inline]
    #[must_use]
    pub const fn get(&self) -> U256 {
        self.0
    }

    fn overflow(op: &str, lhs: &Self, rhs: &Self) -> ArithmeticFault {
        ArithmeticFault::new(
            FaultKind::Overflow,
            format!("{lhs} {op} {rhs}"),
            "> MAX_UINT256",
        )
    }
}

impl From<U256> for FixedPoint {
    #[inline]
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u128> for FixedPoint {
    #[inline]
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ArithmeticBackend for FixedPoint {
    const NAME: &'static str = "fixed-point";

    #[inline]
    fn zero() -> Self {
        Self(U256::zero())
    }

    #[inline]
    fn one() -> Self {
        Self(U256::one())
    }

    #[inline]
    fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    // -- Checked arithmetic -------------------------------------------------

    fn checked_add(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| Self::overflow("+", self, other))
    }

    fn checked_sub(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        match self.0.checked_sub(other.0) {
            Some(value) => Ok(Self(value)),
            None => Err(ArithmeticFault::new(
                FaultKind::Negative,
                format!("{self} - {other}"),
                format!("-{}", other.0 - self.0),
            )),
        }
    }

    fn checked_mul(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        self.0
            .checked_mul(other.0)
            .map(Self)
            .ok_or_else(|| Self::overflow("*", self, other))
    }

    fn checked_div(&self, other: &Self) -> Result<Self, ArithmeticFault> {
        if other.0.is_zero() {
            return Err(ArithmeticFault::new(
                FaultKind::DivisionByZero,
                format!("{self} / {other}"),
                "undefined",
            ));
        }
        Ok(Self(self.0 / other.0))
    }

    // -- Rates --------------------------------------------------------------

    fn mul_rate(&self, rate: Rate) -> Result<Self, ArithmeticFault> {
        let bits = rate_bits(rate)?;
        self.mul_div(&Self(bits), &Self(rate_scale()))
    }

    fn div_rate(&self, rate: Rate) -> Result<Self, ArithmeticFault> {
        let bits = rate_bits(rate)?;
        self.mul_div(&Self(rate_scale()), &Self(bits))
    }

    fn rate_of(numerator: &Self, denominator: &Self) -> Result<Rate, ArithmeticFault> {
        let scaled = numerator.mul_div(&Self(rate_scale()), denominator)?;
        let too_large = || {
            ArithmeticFault::new(
                FaultKind::Overflow,
                format!("{numerator} / {denominator}"),
                "rate outside I80F48",
            )
        };
        if scaled.0.bits() > 127 {
            return Err(too_large());
        }
        let bits = i128::try_from(scaled.0.low_u128()).map_err(|_| too_large())?;
        Ok(Rate::new(I80F48::from_bits(bits)))
    }
}

fn rate_bits(rate: Rate) -> Result<U256, ArithmeticFault> {
    u128::try_from(rate.to_bits())
        .map(U256::from)
        .map_err(|_| {
            ArithmeticFault::new(FaultKind::Negative, format!("rate {rate}"), rate.to_string())
        })
}
