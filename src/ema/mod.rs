//! Exponential moving average of pool spot rates.

use std::collections::BTreeMap;

use crate::domain::{Ppm, Rate, TokenId};
use crate::error::AmmError;
use crate::traits::EmaProvider;

#[derive(Debug, Clone, Copy, PartialEq)]
struct EmaState {
    ema: Rate,
    spot: Rate,
    block: u64,
}

/// Single-factor EMA with a symmetric tolerance band.
///
/// `ema' = spot·α + ema·(1 − α)`, evaluated in `I80F48`, applied the first
/// time a token is observed in a later block than its last update.
///
/// # Examples
///
/// ```
/// use bancor_settlement::domain::{Ppm, Rate, TokenId};
/// use bancor_settlement::ema::EmaTracker;
/// use bancor_settlement::traits::EmaProvider;
///
/// let Ok(link) = TokenId::new("LINK") else { panic!() };
/// let mut tracker = EmaTracker::new(Ppm::new(200_000), Ppm::new(10_000));
/// tracker.register(&link, Rate::ONE, 0);
///
/// let Ok(spot) = Rate::from_ratio(2, 1) else { panic!() };
/// let Ok(ema) = tracker.update(&link, spot, 1) else { panic!() };
/// assert!((ema.to_f64_lossy() - 1.2).abs() < 1e-9);
/// assert!(!tracker.is_within_tolerance(&link));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EmaTracker {
    alpha: Ppm,
    tolerance: Ppm,
    tokens: BTreeMap<TokenId, EmaState>,
}

impl EmaTracker {
    /// Creates a tracker with smoothing factor `alpha` and band `tolerance`.
    ///
    /// Ratios above 100% are clamped.
    #[must_use]
    pub fn new(alpha: Ppm, tolerance: Ppm) -> Self {
        Self {
            alpha: alpha.min(Ppm::ONE),
            tolerance: tolerance.min(Ppm::ONE),
            tokens: BTreeMap::new(),
        }
    }

    /// Smoothing factor.
    #[must_use]
    pub const fn alpha(&self) -> Ppm {
        self.alpha
    }

    /// Tolerance band half-width.
    #[must_use]
    pub const fn tolerance(&self) -> Ppm {
        self.tolerance
    }

    /// Last spot rate recorded for `token`.
    #[must_use]
    pub fn spot(&self, token: &TokenId) -> Option<Rate> {
        self.tokens.get(token).map(|state| state.spot)
    }

    fn smooth(&self, ema: Rate, spot: Rate) -> crate::error::Result<Rate> {
        spot.scale(self.alpha)?
            .checked_add(&ema.scale(self.alpha.complement())?)
    }
}

impl EmaProvider for EmaTracker {
    fn register(&mut self, token: &TokenId, initial_rate: Rate, block: u64) {
        self.tokens.insert(
            token.clone(),
            EmaState {
                ema: initial_rate,
                spot: initial_rate,
                block,
            },
        );
    }

    fn update(&mut self, token: &TokenId, spot: Rate, block: u64) -> crate::error::Result<Rate> {
        let Some(state) = self.tokens.get(token).copied() else {
            return Err(AmmError::UnsupportedToken(token.clone()));
        };

        let next = if block > state.block {
            EmaState {
                ema: self.smooth(state.ema, spot)?,
                spot,
                block,
            }
        } else {
            EmaState { spot, ..state }
        };

        tracing::debug!(
            token = %token,
            block,
            spot = %spot,
            ema = %next.ema,
            "ema updated"
        );
        self.tokens.insert(token.clone(), next);
        Ok(next.ema)
    }

    fn is_within_tolerance(&self, token: &TokenId) -> bool {
        let Some(state) = self.tokens.get(token) else {
            return false;
        };
        match state.ema.tolerance_band(self.tolerance) {
            Ok((lower, upper)) => lower <= state.spot && state.spot <= upper,
            Err(_) => false,
        }
    }

    fn ema(&self, token: &TokenId) -> Option<Rate> {
        self.tokens.get(token).map(|state| state.ema)
    }
}
