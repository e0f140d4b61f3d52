//! Read-only pool views consumed by the tokenomics engine.

use crate::error::AmmError;
use crate::math::ArithmeticBackend;

use super::Ppm;

/// Snapshot of a TKN pool as seen by the withdrawal classifier.
///
/// | Field | Symbol | Meaning |
/// |-------|--------|---------|
/// | `bnt_trading_liquidity` | a | BNT available for trading |
/// | `tkn_trading_liquidity` | b | TKN available for trading |
/// | `tkn_vault_surplus` | c | TKN in the vault beyond `b` |
/// | `tkn_staked_balance` | e | TKN owed to liquidity providers |
/// | `withdrawal_fee` | n | exit fee ratio |
/// | `trading_fee` | m | pool trading fee ratio |
/// | `external_protection_balance` | w | TKN in the external protection wallet |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolState<B> {
    bnt_trading_liquidity: B,
    tkn_trading_liquidity: B,
    tkn_vault_surplus: B,
    tkn_staked_balance: B,
    withdrawal_fee: Ppm,
    trading_fee: Ppm,
    external_protection_balance: B,
}

impl<B: ArithmeticBackend> PoolState<B> {
    /// Creates a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if either fee ratio is
    /// above 100% or the trading fee is exactly 100%.
    pub fn new(
        bnt_trading_liquidity: B,
        tkn_trading_liquidity: B,
        tkn_vault_surplus: B,
        tkn_staked_balance: B,
        withdrawal_fee: Ppm,
        trading_fee: Ppm,
        external_protection_balance: B,
    ) -> crate::error::Result<Self> {
        if !withdrawal_fee.is_valid_ratio() {
            return Err(AmmError::InvalidConfiguration("withdrawal fee above 100%"));
        }
        if trading_fee >= Ppm::ONE {
            return Err(AmmError::InvalidConfiguration("trading fee must be below 100%"));
        }
        Ok(Self {
            bnt_trading_liquidity,
            tkn_trading_liquidity,
            tkn_vault_surplus,
            tkn_staked_balance,
            withdrawal_fee,
            trading_fee,
            external_protection_balance,
        })
    }

    /// BNT trading liquidity (a).
    #[must_use]
    pub const fn bnt_trading_liquidity(&self) -> B {
        self.bnt_trading_liquidity
    }

    /// TKN trading liquidity (b).
    #[must_use]
    pub const fn tkn_trading_liquidity(&self) -> B {
        self.tkn_trading_liquidity
    }

    /// TKN vault balance beyond the trading liquidity (c).
    #[must_use]
    pub const fn tkn_vault_surplus(&self) -> B {
        self.tkn_vault_surplus
    }

    /// TKN staked balance (e).
    #[must_use]
    pub const fn tkn_staked_balance(&self) -> B {
        self.tkn_staked_balance
    }

    /// Exit fee ratio (n).
    #[must_use]
    pub const fn withdrawal_fee(&self) -> Ppm {
        self.withdrawal_fee
    }

    /// Trading fee ratio (m).
    #[must_use]
    pub const fn trading_fee(&self) -> Ppm {
        self.trading_fee
    }

    /// External protection wallet balance (w).
    #[must_use]
    pub const fn external_protection_balance(&self) -> B {
        self.external_protection_balance
    }

    /// Returns `b + c`, the TKN the pool actually holds.
    ///
    /// # Errors
    ///
    /// Propagates an overflow fault.
    pub fn tkn_holdings(&self) -> Result<B, crate::error::ArithmeticFault> {
        self.tkn_trading_liquidity.checked_add(&self.tkn_vault_surplus)
    }
}

/// Exact pool-token exchange rate `numerator / denominator` in backend units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate<B> {
    numerator: B,
    denominator: B,
}

impl<B: ArithmeticBackend> ExchangeRate<B> {
    /// Creates a rate.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidRate`] if the denominator is zero.
    pub fn new(numerator: B, denominator: B) -> crate::error::Result<Self> {
        if denominator.is_zero() {
            return Err(AmmError::InvalidRate("exchange rate denominator is zero"));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Returns the numerator.
    #[must_use]
    pub const fn numerator(&self) -> B {
        self.numerator
    }

    /// Returns the denominator.
    #[must_use]
    pub const fn denominator(&self) -> B {
        self.denominator
    }
}

/// BNT and TKN trading liquidity of one pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingLiquidity<B> {
    bnt: B,
    tkn: B,
}

impl<B: ArithmeticBackend> TradingLiquidity<B> {
    /// Creates a liquidity pair.
    #[must_use]
    pub const fn new(bnt: B, tkn: B) -> Self {
        Self { bnt, tkn }
    }

    /// Empty liquidity.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(B::zero(), B::zero())
    }

    /// BNT side.
    #[must_use]
    pub const fn bnt(&self) -> B {
        self.bnt
    }

    /// TKN side.
    #[must_use]
    pub const fn tkn(&self) -> B {
        self.tkn
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bnt.is_zero() || self.tkn.is_zero()
    }
}

/// Per-pool trading fee and the share of it routed to the vortex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeeSchedule {
    pool_fee: Ppm,
    vortex_rate: Ppm,
}

impl FeeSchedule {
    /// Creates a fee schedule.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if the pool fee is not
    /// below 100% or the vortex rate is above 100%.
    pub fn new(pool_fee: Ppm, vortex_rate: Ppm) -> crate::error::Result<Self> {
        if pool_fee >= Ppm::ONE {
            return Err(AmmError::InvalidConfiguration("pool fee must be below 100%"));
        }
        if !vortex_rate.is_valid_ratio() {
            return Err(AmmError::InvalidConfiguration("vortex rate above 100%"));
        }
        Ok(Self {
            pool_fee,
            vortex_rate,
        })
    }

    /// Trading fee charged on the output amount.
    #[must_use]
    pub const fn pool_fee(&self) -> Ppm {
        self.pool_fee
    }

    /// Share of the trading fee routed to the vortex.
    #[must_use]
    pub const fn vortex_rate(&self) -> Ppm {
        self.vortex_rate
    }
}
