//! Balances owned by the orchestrator.

use crate::domain::TradingLiquidity;
use crate::error::ArithmeticFault;
use crate::math::ArithmeticBackend;

/// Balances of one non-BNT pool.
///
/// # State
///
/// - `vault`: TKN held by the protocol, trading liquidity included
/// - `staked`: TKN owed to bnTKN holders (`e` in the settlement formulas)
/// - `pool_token_supply`: outstanding bnTKN
/// - `external_protection`: TKN in the external protection wallet (`w`)
/// - `bnt_trading_liquidity` / `tkn_trading_liquidity`: `a` and `b`
/// - `funding_remaining`: BNT the protocol may still mint into this pool
/// - `bnt_compensation`: BNT minted to providers whose withdrawals the
///   vault could not cover in TKN
/// - `trading_enabled`: set once the pool has been bootstrapped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPool<B> {
    pub(crate) vault: B,
    pub(crate) staked: B,
    pub(crate) pool_token_supply: B,
    pub(crate) external_protection: B,
    pub(crate) bnt_trading_liquidity: B,
    pub(crate) tkn_trading_liquidity: B,
    pub(crate) funding_remaining: B,
    pub(crate) bnt_compensation: B,
    pub(crate) trading_enabled: bool,
}

impl<B: ArithmeticBackend> TokenPool<B> {
    pub(crate) fn new(funding_limit: B) -> Self {
        Self {
            vault: B::zero(),
            staked: B::zero(),
            pool_token_supply: B::zero(),
            external_protection: B::zero(),
            bnt_trading_liquidity: B::zero(),
            tkn_trading_liquidity: B::zero(),
            funding_remaining: funding_limit,
            bnt_compensation: B::zero(),
            trading_enabled: false,
        }
    }

    /// TKN held by the vault.
    #[must_use]
    pub const fn vault(&self) -> B {
        self.vault
    }

    /// TKN owed to liquidity providers.
    #[must_use]
    pub const fn staked(&self) -> B {
        self.staked
    }

    /// Outstanding bnTKN.
    #[must_use]
    pub const fn pool_token_supply(&self) -> B {
        self.pool_token_supply
    }

    /// TKN held by the external protection wallet.
    #[must_use]
    pub const fn external_protection(&self) -> B {
        self.external_protection
    }

    /// BNT side of the trading liquidity.
    #[must_use]
    pub const fn bnt_trading_liquidity(&self) -> B {
        self.bnt_trading_liquidity
    }

    /// TKN side of the trading liquidity.
    #[must_use]
    pub const fn tkn_trading_liquidity(&self) -> B {
        self.tkn_trading_liquidity
    }

    /// BNT the protocol may still mint into this pool.
    #[must_use]
    pub const fn funding_remaining(&self) -> B {
        self.funding_remaining
    }

    /// Cumulative BNT minted to compensate TKN withdrawals.
    #[must_use]
    pub const fn bnt_compensation(&self) -> B {
        self.bnt_compensation
    }

    /// Returns `true` once the pool has been bootstrapped.
    #[must_use]
    pub const fn trading_enabled(&self) -> bool {
        self.trading_enabled
    }

    /// Both sides of the trading liquidity.
    #[must_use]
    pub const fn liquidity(&self) -> TradingLiquidity<B> {
        TradingLiquidity::new(self.bnt_trading_liquidity, self.tkn_trading_liquidity)
    }

    /// Vault TKN outside trading liquidity, floored at zero.
    ///
    /// The second value is `true` when the floor was applied.
    #[must_use]
    pub fn vault_surplus(&self) -> (B, bool) {
        match self.vault.checked_sub(&self.tkn_trading_liquidity) {
            Ok(surplus) => (surplus, false),
            Err(_) => (B::zero(), true),
        }
    }

    /// Trading pool whose BNT side fell below `threshold`.
    #[must_use]
    pub fn is_below_threshold(&self, threshold: &B) -> bool {
        self.trading_enabled && self.bnt_trading_liquidity < *threshold
    }

    pub(crate) fn set_liquidity(&mut self, liquidity: TradingLiquidity<B>) {
        self.bnt_trading_liquidity = liquidity.bnt();
        self.tkn_trading_liquidity = liquidity.tkn();
    }

    /// Charges `amount` BNT against the pool's funding limit.
    pub(crate) fn draw_funding(&mut self, amount: &B) -> Result<(), ArithmeticFault> {
        self.funding_remaining = self.funding_remaining.checked_sub(amount)?;
        Ok(())
    }
}

/// Balances of the BNT reserve and the protocol-wide BNT accounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BntReserve<B> {
    pub(crate) vault: B,
    pub(crate) staked: B,
    pub(crate) pool_token_supply: B,
    pub(crate) vortex: B,
}

impl<B: ArithmeticBackend> BntReserve<B> {
    pub(crate) fn new() -> Self {
        Self {
            vault: B::zero(),
            staked: B::zero(),
            pool_token_supply: B::zero(),
            vortex: B::zero(),
        }
    }

    /// BNT held by the vault.
    #[must_use]
    pub const fn vault(&self) -> B {
        self.vault
    }

    /// BNT owed to bnBNT holders, protocol-owned share included.
    #[must_use]
    pub const fn staked(&self) -> B {
        self.staked
    }

    /// Outstanding bnBNT.
    #[must_use]
    pub const fn pool_token_supply(&self) -> B {
        self.pool_token_supply
    }

    /// Accumulated vortex fees.
    #[must_use]
    pub const fn vortex(&self) -> B {
        self.vortex
    }

    /// bnBNT issued for `amount` BNT at the current staking rate.
    pub(crate) fn pool_tokens_for(&self, amount: &B) -> Result<B, ArithmeticFault> {
        pool_tokens_for(amount, &self.staked, &self.pool_token_supply)
    }

    /// Mints protocol-owned BNT into the vault and staking balance.
    pub(crate) fn mint_protocol_liquidity(&mut self, amount: &B) -> Result<(), ArithmeticFault> {
        let issued = self.pool_tokens_for(amount)?;
        self.vault = self.vault.checked_add(amount)?;
        self.staked = self.staked.checked_add(amount)?;
        self.pool_token_supply = self.pool_token_supply.checked_add(&issued)?;
        Ok(())
    }
}

/// `amount · supply / staked`, or `amount` while either side is zero.
pub(crate) fn pool_tokens_for<B: ArithmeticBackend>(
    amount: &B,
    staked: &B,
    supply: &B,
) -> Result<B, ArithmeticFault> {
    if staked.is_zero() || supply.is_zero() {
        return Ok(*amount);
    }
    amount.mul_div(supply, staked)
}
