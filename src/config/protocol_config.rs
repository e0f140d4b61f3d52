//! Protocol-wide and per-token configuration.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{FeeSchedule, Ppm, Rate, TokenId};
use crate::error::AmmError;

/// Default exit fee charged on TKN withdrawals: 0.25%.
pub const DEFAULT_EXIT_FEE: Ppm = Ppm::new(2_500);

/// Default EMA smoothing factor: 0.2.
pub const DEFAULT_EMA_ALPHA: Ppm = Ppm::new(200_000);

/// Default EMA tolerance band half-width: 1%.
pub const DEFAULT_EMA_TOLERANCE: Ppm = Ppm::new(10_000);

/// What the orchestrator does when an operation would push a pool's BNT
/// trading liquidity below the minimum threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShutdownPolicy {
    /// Reject the operation with [`AmmError::PoolShutdown`].
    #[default]
    Fail,
    /// Log a warning and commit anyway.
    WarnOnly,
}

/// Per-token parameters.
///
/// # Validation
///
/// - `pool_fee` must be below 100%.
/// - `vortex_rate` must be at most 100%.
/// - `initial_rate` (BNT per TKN) must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    fees: FeeSchedule,
    initial_rate: Rate,
}

impl TokenConfig {
    /// Creates a token configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if a ratio is out of
    /// range and [`AmmError::InvalidRate`] if `initial_rate` is zero.
    pub fn new(pool_fee: Ppm, vortex_rate: Ppm, initial_rate: Rate) -> crate::error::Result<Self> {
        let fees = FeeSchedule::new(pool_fee, vortex_rate)?;
        if !initial_rate.is_positive() {
            return Err(AmmError::InvalidRate("initial rate must be positive"));
        }
        Ok(Self { fees, initial_rate })
    }

    /// Trading fee schedule of the pool.
    #[must_use]
    pub const fn fees(&self) -> FeeSchedule {
        self.fees
    }

    /// BNT per TKN used before the pool has trading liquidity.
    #[must_use]
    pub const fn initial_rate(&self) -> Rate {
        self.initial_rate
    }
}

/// Validated protocol configuration.
///
/// Built with [`ProtocolConfig::new`] and refined through the `with_*`
/// builders; each builder re-runs [`validate`](Self::validate).
///
/// # Whitelist
///
/// The whitelist is BNT plus every token registered through
/// [`with_token`](Self::with_token).  Only whitelisted tokens can be marked
/// bootstrapped, and only bootstrapped tokens ever receive trading
/// liquidity.
///
/// # Examples
///
/// ```
/// use bancor_settlement::config::{ProtocolConfig, ShutdownPolicy, TokenConfig};
/// use bancor_settlement::domain::{Ppm, Rate, TokenId};
///
/// let Ok(link) = TokenId::new("LINK") else { panic!() };
/// let Ok(token) = TokenConfig::new(Ppm::new(10_000), Ppm::new(200_000), Rate::ONE) else {
///     panic!()
/// };
/// let Ok(config) = ProtocolConfig::new(100_000, 10_000)
///     .and_then(|c| c.with_token(link.clone(), token))
///     .and_then(|c| c.with_bootstrapped(link.clone()))
///     .and_then(|c| c.with_shutdown_policy(ShutdownPolicy::WarnOnly))
/// else {
///     panic!()
/// };
/// assert!(config.is_bootstrapped(&link));
/// assert!(config.is_whitelisted(&TokenId::bnt()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolConfig {
    funding_limit: u128,
    min_liquidity_threshold: u128,
    exit_fee: Ppm,
    ema_alpha: Ppm,
    ema_tolerance: Ppm,
    shutdown_policy: ShutdownPolicy,
    tokens: BTreeMap<TokenId, TokenConfig>,
    bootstrapped: BTreeSet<TokenId>,
}

impl ProtocolConfig {
    /// Creates a configuration with default fees, EMA settings and policy.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if the threshold is zero
    /// or exceeds the funding limit.
    pub fn new(funding_limit: u128, min_liquidity_threshold: u128) -> crate::error::Result<Self> {
        let config = Self {
            funding_limit,
            min_liquidity_threshold,
            exit_fee: DEFAULT_EXIT_FEE,
            ema_alpha: DEFAULT_EMA_ALPHA,
            ema_tolerance: DEFAULT_EMA_TOLERANCE,
            shutdown_policy: ShutdownPolicy::default(),
            tokens: BTreeMap::new(),
            bootstrapped: BTreeSet::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the exit fee charged on TKN withdrawals.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if the fee exceeds 100%.
    pub fn with_exit_fee(mut self, exit_fee: Ppm) -> crate::error::Result<Self> {
        self.exit_fee = exit_fee;
        self.validate()?;
        Ok(self)
    }

    /// Sets the EMA smoothing factor and tolerance band.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if either ratio exceeds
    /// 100% or `alpha` is zero.
    pub fn with_ema(mut self, alpha: Ppm, tolerance: Ppm) -> crate::error::Result<Self> {
        self.ema_alpha = alpha;
        self.ema_tolerance = tolerance;
        self.validate()?;
        Ok(self)
    }

    /// Sets the pool shutdown policy.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` for builder chaining.
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> crate::error::Result<Self> {
        self.shutdown_policy = policy;
        self.validate()?;
        Ok(self)
    }

    /// Whitelists `token` with its per-pool parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `token` is BNT.
    pub fn with_token(mut self, token: TokenId, config: TokenConfig) -> crate::error::Result<Self> {
        self.tokens.insert(token, config);
        self.validate()?;
        Ok(self)
    }

    /// Authorizes `token` to receive trading liquidity.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `token` is not a
    /// whitelisted pool token.
    pub fn with_bootstrapped(mut self, token: TokenId) -> crate::error::Result<Self> {
        self.bootstrapped.insert(token);
        self.validate()?;
        Ok(self)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] describing the first
    /// violated rule.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.min_liquidity_threshold == 0 {
            return Err(AmmError::InvalidConfiguration(
                "minimum liquidity threshold must be positive",
            ));
        }
        if self.min_liquidity_threshold > self.funding_limit {
            return Err(AmmError::InvalidConfiguration(
                "minimum liquidity threshold exceeds the funding limit",
            ));
        }
        if !self.exit_fee.is_valid_ratio() {
            return Err(AmmError::InvalidConfiguration("exit fee above 100%"));
        }
        if self.ema_alpha == Ppm::ZERO || !self.ema_alpha.is_valid_ratio() {
            return Err(AmmError::InvalidConfiguration(
                "ema alpha must be in (0, 100%]",
            ));
        }
        if !self.ema_tolerance.is_valid_ratio() {
            return Err(AmmError::InvalidConfiguration("ema tolerance above 100%"));
        }
        if self.tokens.keys().any(TokenId::is_bnt) {
            return Err(AmmError::InvalidConfiguration(
                "BNT cannot be registered as a pool token",
            ));
        }
        if self.bootstrapped.iter().any(|t| !self.tokens.contains_key(t)) {
            return Err(AmmError::InvalidConfiguration(
                "bootstrapped token is not whitelisted",
            ));
        }
        Ok(())
    }

    /// Total BNT the protocol may mint into pools.
    #[must_use]
    pub const fn funding_limit(&self) -> u128 {
        self.funding_limit
    }

    /// BNT trading liquidity a live pool must keep.  The DAO bootstrap
    /// seeds twice this amount.
    #[must_use]
    pub const fn min_liquidity_threshold(&self) -> u128 {
        self.min_liquidity_threshold
    }

    /// Exit fee on TKN withdrawals.
    #[must_use]
    pub const fn exit_fee(&self) -> Ppm {
        self.exit_fee
    }

    /// EMA smoothing factor.
    #[must_use]
    pub const fn ema_alpha(&self) -> Ppm {
        self.ema_alpha
    }

    /// EMA tolerance band half-width.
    #[must_use]
    pub const fn ema_tolerance(&self) -> Ppm {
        self.ema_tolerance
    }

    /// Pool shutdown policy.
    #[must_use]
    pub const fn shutdown_policy(&self) -> ShutdownPolicy {
        self.shutdown_policy
    }

    /// Returns `true` for BNT and every registered pool token.
    #[must_use]
    pub fn is_whitelisted(&self, token: &TokenId) -> bool {
        token.is_bnt() || self.tokens.contains_key(token)
    }

    /// Returns `true` if `token` may receive trading liquidity.
    #[must_use]
    pub fn is_bootstrapped(&self, token: &TokenId) -> bool {
        self.bootstrapped.contains(token)
    }

    /// Returns the parameters of a pool token.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::UnsupportedToken`] if `token` is not registered.
    pub fn token(&self, token: &TokenId) -> crate::error::Result<&TokenConfig> {
        self.tokens
            .get(token)
            .ok_or_else(|| AmmError::UnsupportedToken(token.clone()))
    }

    /// Iterates over registered pool tokens in symbol order.
    pub fn tokens(&self) -> impl Iterator<Item = (&TokenId, &TokenConfig)> {
        self.tokens.iter()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn link() -> TokenId {
        let Ok(t) = TokenId::new("LINK") else {
            panic!("valid token");
        };
        t
    }

    fn token_config() -> TokenConfig {
        let Ok(c) = TokenConfig::new(Ppm::new(10_000), Ppm::new(200_000), Rate::ONE) else {
            panic!("valid token config");
        };
        c
    }

    #[test]
    fn defaults() {
        let Ok(cfg) = ProtocolConfig::new(100_000, 10_000) else {
            panic!("expected Ok");
        };
        assert_eq!(cfg.exit_fee(), DEFAULT_EXIT_FEE);
        assert_eq!(cfg.ema_alpha(), DEFAULT_EMA_ALPHA);
        assert_eq!(cfg.ema_tolerance(), DEFAULT_EMA_TOLERANCE);
        assert_eq!(cfg.shutdown_policy(), ShutdownPolicy::Fail);
        assert_eq!(cfg.funding_limit(), 100_000);
        assert_eq!(cfg.min_liquidity_threshold(), 10_000);
    }

    #[test]
    fn threshold_rules() {
        assert!(ProtocolConfig::new(100, 0).is_err());
        assert!(ProtocolConfig::new(100, 101).is_err());
        assert!(ProtocolConfig::new(100, 100).is_ok());
    }

    #[test]
    fn ratio_rules() {
        let Ok(cfg) = ProtocolConfig::new(100, 10) else {
            panic!("expected Ok");
        };
        assert!(cfg.clone().with_exit_fee(Ppm::new(1_000_001)).is_err());
        assert!(cfg.clone().with_ema(Ppm::ZERO, Ppm::new(10_000)).is_err());
        assert!(cfg.clone().with_ema(Ppm::ONE, Ppm::new(1_000_001)).is_err());
        assert!(cfg.with_ema(Ppm::ONE, Ppm::ONE).is_ok());
    }

    #[test]
    fn token_config_rules() {
        assert!(TokenConfig::new(Ppm::ONE, Ppm::ZERO, Rate::ONE).is_err());
        assert!(TokenConfig::new(Ppm::ZERO, Ppm::new(1_000_001), Rate::ONE).is_err());
        assert!(matches!(
            TokenConfig::new(Ppm::ZERO, Ppm::ZERO, Rate::ZERO),
            Err(AmmError::InvalidRate(_))
        ));
    }

    #[test]
    fn bnt_is_not_a_pool_token() {
        let Ok(cfg) = ProtocolConfig::new(100, 10) else {
            panic!("expected Ok");
        };
        assert!(cfg.with_token(TokenId::bnt(), token_config()).is_err());
    }

    #[test]
    fn bootstrap_requires_whitelist() {
        let Ok(cfg) = ProtocolConfig::new(100, 10) else {
            panic!("expected Ok");
        };
        assert!(cfg.clone().with_bootstrapped(link()).is_err());
        let Ok(cfg) = cfg
            .with_token(link(), token_config())
            .and_then(|c| c.with_bootstrapped(link()))
        else {
            panic!("expected Ok");
        };
        assert!(cfg.is_whitelisted(&link()));
        assert!(cfg.is_bootstrapped(&link()));
        assert!(cfg.token(&link()).is_ok());
        assert!(matches!(
            cfg.token(&TokenId::bnt()),
            Err(AmmError::UnsupportedToken(_))
        ));
        assert_eq!(cfg.tokens().count(), 1);
    }
}
