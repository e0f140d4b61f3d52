//! Deterministic BNT-per-TKN exchange rate.

use core::fmt;

use fixed::types::I80F48;

use super::Ppm;
use crate::error::AmmError;

/// Exchange rate quoted as BNT per one TKN.
///
/// Wraps an [`I80F48`] so that EMA smoothing and tolerance bands are
/// bit-for-bit deterministic regardless of the amount backend in use.
/// A constructed `Rate` is never negative.
///
/// # Examples
///
/// ```
/// use bancor_settlement::domain::Rate;
///
/// let Ok(rate) = Rate::from_ratio(3, 2) else { panic!() };
/// assert!(rate > Rate::ONE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(I80F48);

impl Rate {
    /// Zero BNT per TKN.
    pub const ZERO: Self = Self(I80F48::ZERO);

    /// One BNT per TKN.
    pub const ONE: Self = Self(I80F48::ONE);

    /// Wraps a raw [`I80F48`]; negative inputs are clamped to zero.
    #[must_use]
    pub fn new(value: I80F48) -> Self {
        if value < I80F48::ZERO {
            Self::ZERO
        } else {
            Self(value)
        }
    }

    /// Returns the underlying [`I80F48`].
    #[must_use]
    pub const fn get(&self) -> I80F48 {
        self.0
    }

    /// Returns the raw fixed-point bits (value · 2⁴⁸).
    #[must_use]
    pub const fn to_bits(&self) -> i128 {
        self.0.to_bits()
    }

    /// Builds a rate from raw fixed-point bits.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] if `bits` is negative.
    pub fn from_bits(bits: i128) -> crate::error::Result<Self> {
        if bits < 0 {
            return Err(AmmError::InvalidRate("rate bits must be non-negative"));
        }
        Ok(Self(I80F48::from_bits(bits)))
    }

    /// Builds `numerator / denominator`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] if the denominator is zero or the
    /// quotient does not fit an `I80F48`.
    pub fn from_ratio(numerator: u128, denominator: u128) -> crate::error::Result<Self> {
        if denominator == 0 {
            return Err(AmmError::InvalidRate("rate denominator is zero"));
        }
        let num = I80F48::checked_from_num(numerator)
            .ok_or(AmmError::InvalidRate("rate numerator out of range"))?;
        let den = I80F48::checked_from_num(denominator)
            .ok_or(AmmError::InvalidRate("rate denominator out of range"))?;
        num.checked_div(den)
            .map(Self)
            .ok_or(AmmError::InvalidRate("rate quotient out of range"))
    }

    /// Builds a rate from an `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] for negative, non-finite or
    /// out-of-range values.
    pub fn from_f64(value: f64) -> crate::error::Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(AmmError::InvalidRate("rate must be finite and non-negative"));
        }
        I80F48::checked_from_num(value)
            .map(Self)
            .ok_or(AmmError::InvalidRate("rate out of range"))
    }

    /// Converts to `f64`, possibly losing precision.
    #[must_use]
    pub fn to_f64_lossy(&self) -> f64 {
        self.0.to_num::<f64>()
    }

    /// Returns `true` if the rate is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > I80F48::ZERO
    }

    /// Scales the rate by a [`Ppm`] ratio.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] on overflow.
    pub fn scale(&self, ratio: Ppm) -> crate::error::Result<Self> {
        let factor = ratio.to_rate()?;
        self.0
            .checked_mul(factor.0)
            .map(Self)
            .ok_or(AmmError::InvalidRate("rate scaling overflow"))
    }

    /// Checked sum of two rates.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] on overflow.
    pub fn checked_add(&self, other: &Self) -> crate::error::Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AmmError::InvalidRate("rate addition overflow"))
    }

    /// Returns the `[self·(1 − tolerance), self·(1 + tolerance)]` band.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] on overflow.
    pub fn tolerance_band(&self, tolerance: Ppm) -> crate::error::Result<(Self, Self)> {
        let delta = self.scale(tolerance)?;
        let lower = Self::new(self.0.saturating_sub(delta.0));
        let upper = self.checked_add(&delta)?;
        Ok((lower, upper))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_negative() {
        assert_eq!(Rate::new(I80F48::from_num(-3)), Rate::ZERO);
    }

    #[test]
    fn from_ratio_half() {
        let Ok(rate) = Rate::from_ratio(1, 2) else {
            panic!("expected Ok");
        };
        assert_eq!(rate.get(), I80F48::from_num(0.5));
    }

    #[test]
    fn from_ratio_zero_denominator() {
        assert!(Rate::from_ratio(1, 0).is_err());
    }

    #[test]
    fn from_bits_rejects_negative() {
        assert!(Rate::from_bits(-1).is_err());
        let Ok(one) = Rate::from_bits(1_i128 << 48) else {
            panic!("expected Ok");
        };
        assert_eq!(one, Rate::ONE);
    }

    #[test]
    fn from_f64_rejects_nan_and_negative() {
        assert!(Rate::from_f64(f64::NAN).is_err());
        assert!(Rate::from_f64(-0.5).is_err());
        assert!(Rate::from_f64(2.5).is_ok());
    }

    #[test]
    fn scale_by_ppm() {
        let Ok(two) = Rate::from_ratio(2, 1) else {
            panic!("expected Ok");
        };
        let Ok(scaled) = two.scale(Ppm::new(500_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(scaled, Rate::ONE);
    }

    #[test]
    fn tolerance_band_one_percent() {
        let Ok((lower, upper)) = Rate::ONE.tolerance_band(Ppm::new(10_000)) else {
            panic!("expected Ok");
        };
        assert!(lower < Rate::ONE && Rate::ONE < upper);
        assert!((lower.to_f64_lossy() - 0.99).abs() < 1e-9);
        assert!((upper.to_f64_lossy() - 1.01).abs() < 1e-9);
    }
}
