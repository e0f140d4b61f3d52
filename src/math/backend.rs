//! Arithmetic backend trait shared by the fixed-point and float engines.
//!
//! The [`ArithmeticBackend`] trait abstracts over the numeric type used for
//! token amounts so that classifiers, handlers and the protocol can be
//! generic over it.  The backend is chosen once, when a protocol is
//! constructed, and never mixed within a pool.
//!
//! | Feature | Backend | Representation |
//! |---------|---------|----------------|
//! | always | [`FixedPoint`](super::FixedPoint) | `U256`, floor division |
//! | `float` | `FloatingPoint` | IEEE 754 `f64` |

use core::fmt;

use crate::domain::{Ppm, Rate, PPM_RESOLUTION};
use crate::error::ArithmeticFault;

/// Checked arithmetic over non-negative token amounts.
///
/// # Contract
///
/// - Every primitive returns a value in `[0, MAX_UINT256]` or an
///   [`ArithmeticFault`]; nothing wraps, saturates or panics.
/// - Integer backends floor on division.
/// - Composite helpers ([`mul_div`](Self::mul_div),
///   [`mul_ppm`](Self::mul_ppm)) multiply first and divide last, in the
///   order written.
pub trait ArithmeticBackend:
    Clone + Copy + fmt::Debug + fmt::Display + PartialEq + PartialOrd
{
    /// Short backend name used in logs.
    const NAME: &'static str;

    // -- Identity constants -------------------------------------------------

    /// Returns zero.
    #[must_use]
    fn zero() -> Self;

    /// Returns one.
    #[must_use]
    fn one() -> Self;

    // -- Conversions --------------------------------------------------------

    /// Converts an integer amount.
    #[must_use]
    fn from_u128(value: u128) -> Self;

    /// Returns `true` if the value is zero.
    #[must_use]
    fn is_zero(&self) -> bool;

    // -- Checked arithmetic -------------------------------------------------

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// [`FaultKind::Overflow`](crate::error::FaultKind::Overflow) above
    /// `MAX_UINT256`.
    fn checked_add(&self, other: &Self) -> Result<Self, ArithmeticFault>;

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// [`FaultKind::Negative`](crate::error::FaultKind::Negative) if
    /// `other > self`.
    fn checked_sub(&self, other: &Self) -> Result<Self, ArithmeticFault>;

    /// Checked multiplication.
    ///
    /// # Errors
    ///
    /// [`FaultKind::Overflow`](crate::error::FaultKind::Overflow) above
    /// `MAX_UINT256`.
    fn checked_mul(&self, other: &Self) -> Result<Self, ArithmeticFault>;

    /// Checked division, flooring for integer backends.
    ///
    /// # Errors
    ///
    /// [`FaultKind::DivisionByZero`](crate::error::FaultKind::DivisionByZero)
    /// if `other` is zero.
    fn checked_div(&self, other: &Self) -> Result<Self, ArithmeticFault>;

    // -- Rates --------------------------------------------------------------

    /// Converts a TKN amount into BNT at `rate` (BNT per TKN).
    ///
    /// # Errors
    ///
    /// Propagates overflow faults.
    fn mul_rate(&self, rate: Rate) -> Result<Self, ArithmeticFault>;

    /// Converts a BNT amount into TKN at `rate` (BNT per TKN).
    ///
    /// # Errors
    ///
    /// Division by a zero rate faults.
    fn div_rate(&self, rate: Rate) -> Result<Self, ArithmeticFault>;

    /// Returns `numerator / denominator` as a [`Rate`].
    ///
    /// # Errors
    ///
    /// Faults on a zero denominator or a quotient outside `I80F48`.
    fn rate_of(numerator: &Self, denominator: &Self) -> Result<Rate, ArithmeticFault>;

    // -- Composite helpers --------------------------------------------------

    /// Computes `self · numerator / denominator`, multiplying first.
    ///
    /// # Errors
    ///
    /// Propagates faults of either step.
    fn mul_div(&self, numerator: &Self, denominator: &Self) -> Result<Self, ArithmeticFault> {
        self.checked_mul(numerator)?.checked_div(denominator)
    }

    /// Computes `self · ratio / 1_000_000`, multiplying first.
    ///
    /// # Errors
    ///
    /// Propagates faults of either step.
    fn mul_ppm(&self, ratio: Ppm) -> Result<Self, ArithmeticFault> {
        let ppm = Self::from_u128(u128::from(ratio.get()));
        let resolution = Self::from_u128(u128::from(PPM_RESOLUTION));
        self.mul_div(&ppm, &resolution)
    }

    /// Returns `max(self − other, 0)`.
    ///
    /// Only for balances that are floored by protocol rules, such as the
    /// remaining BNT funding.
    #[must_use]
    fn saturating_sub(&self, other: &Self) -> Self {
        self.checked_sub(other).unwrap_or_else(|_| Self::zero())
    }
}
