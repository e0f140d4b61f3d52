//! Parts-per-million representation for protocol ratios.

use core::fmt;

use fixed::types::I80F48;

use super::Rate;
use crate::error::AmmError;

/// Resolution of a [`Ppm`] ratio: `1_000_000` ppm = 100%.
pub const PPM_RESOLUTION: u32 = 1_000_000;

/// A ratio expressed in parts per million (1 ppm = 0.0001%).
///
/// Fees, vortex rates, EMA smoothing factors and tolerance bands are all
/// stored as `Ppm`.  All `u32` values are representable, but values above
/// [`PPM_RESOLUTION`] are not meaningful ratios; use
/// [`is_valid_ratio`](Self::is_valid_ratio) to check.
///
/// # Examples
///
/// ```
/// use bancor_settlement::domain::Ppm;
///
/// let exit_fee = Ppm::new(2_500); // 0.25%
/// assert_eq!(exit_fee.complement().get(), 997_500);
/// assert!(exit_fee.is_valid_ratio());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ppm(u32);

impl Ppm {
    /// 0%.
    pub const ZERO: Self = Self(0);

    /// 100%.
    pub const ONE: Self = Self(PPM_RESOLUTION);

    /// Creates a new `Ppm` from a raw parts-per-million value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying parts-per-million value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the value lies in `0..=1_000_000`.
    #[must_use]
    pub const fn is_valid_ratio(&self) -> bool {
        self.0 <= PPM_RESOLUTION
    }

    /// Returns `1 − self`, saturating at zero for out-of-range values.
    #[must_use]
    pub const fn complement(&self) -> Self {
        Self(PPM_RESOLUTION.saturating_sub(self.0))
    }

    /// Converts the ratio to a [`Rate`].
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] if the division is not
    /// representable as an `I80F48`.
    pub fn to_rate(&self) -> crate::error::Result<Rate> {
        I80F48::from_num(self.0)
            .checked_div(I80F48::from_num(PPM_RESOLUTION))
            .map(Rate::new)
            .ok_or(AmmError::InvalidRate("ppm ratio not representable as a rate"))
    }
}

impl fmt::Display for Ppm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ppm", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_and_get() {
        assert_eq!(Ppm::new(2_500).get(), 2_500);
    }

    #[test]
    fn constants() {
        assert_eq!(Ppm::ZERO.get(), 0);
        assert_eq!(Ppm::ONE.get(), 1_000_000);
        assert_eq!(Ppm::default(), Ppm::ZERO);
    }

    #[test]
    fn valid_ratio_bounds() {
        assert!(Ppm::ZERO.is_valid_ratio());
        assert!(Ppm::ONE.is_valid_ratio());
        assert!(!Ppm::new(1_000_001).is_valid_ratio());
    }

    #[test]
    fn complement_of_fee() {
        assert_eq!(Ppm::new(10_000).complement(), Ppm::new(990_000));
        assert_eq!(Ppm::ONE.complement(), Ppm::ZERO);
        assert_eq!(Ppm::new(2_000_000).complement(), Ppm::ZERO);
    }

    #[test]
    fn to_rate_quarter() {
        let Ok(rate) = Ppm::new(250_000).to_rate() else {
            panic!("expected Ok");
        };
        assert_eq!(rate.get(), I80F48::from_num(0.25));
    }

    #[test]
    fn display() {
        assert_eq!(Ppm::new(2_500).to_string(), "2500ppm");
    }
}
