//! Spot-rate smoothing used to gate liquidity changes.
//!
//! Before exposing new trading liquidity or writing post-trade liquidity,
//! the protocol asks an [`EmaProvider`] whether the pool's spot rate still
//! lies inside the tolerance band around its moving average.  A spot rate
//! outside the band means the pool has just been pushed hard, so the
//! protocol holds back.

use crate::domain::{Rate, TokenId};

/// Contract for a per-token exponential moving average of spot rates.
///
/// # Implementors
///
/// - [`EmaTracker`](crate::ema::EmaTracker): single-factor EMA with a
///   symmetric tolerance band.
///
/// # Errors
///
/// Fallible methods return [`AmmError`](crate::error::AmmError):
///
/// - [`AmmError::UnsupportedToken`](crate::error::AmmError::UnsupportedToken)
///   if the token was never registered
/// - [`AmmError::InvalidRate`](crate::error::AmmError::InvalidRate) if the
///   smoothing step overflows
pub trait EmaProvider {
    /// Starts tracking `token` with `initial_rate` as both EMA and spot.
    ///
    /// Registering an already tracked token resets it.
    fn register(&mut self, token: &TokenId, initial_rate: Rate, block: u64);

    /// Feeds a spot observation and returns the (possibly unchanged) EMA.
    ///
    /// The average moves at most once per block; further observations in
    /// the same block only replace the recorded spot rate.
    ///
    /// # Errors
    ///
    /// See the trait-level documentation.
    fn update(&mut self, token: &TokenId, spot: Rate, block: u64) -> crate::error::Result<Rate>;

    /// Returns `true` if the last spot rate lies inside the tolerance band.
    ///
    /// Unknown tokens are never within tolerance.
    fn is_within_tolerance(&self, token: &TokenId) -> bool;

    /// Returns the current EMA of `token`.
    fn ema(&self, token: &TokenId) -> Option<Rate>;
}
