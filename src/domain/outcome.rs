//! Results of withdrawals and trades.

use crate::math::ArithmeticBackend;

use super::{Case, TokenId};

/// Signed movement of one side of a pool's trading liquidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiquidityDelta<B> {
    /// No change.
    Unchanged,
    /// Liquidity grows by the amount.
    Increase(B),
    /// Liquidity shrinks by the amount.
    Decrease(B),
}

impl<B: ArithmeticBackend> LiquidityDelta<B> {
    /// Applies the delta to `current`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic fault if a decrease exceeds `current` or an
    /// increase overflows.
    pub fn apply_to(&self, current: &B) -> Result<B, crate::error::ArithmeticFault> {
        match self {
            Self::Unchanged => Ok(*current),
            Self::Increase(amount) => current.checked_add(amount),
            Self::Decrease(amount) => current.checked_sub(amount),
        }
    }
}

/// Raw handler outputs, named after the withdrawal algebra.
///
/// Outputs a case does not define stay at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalAmounts<B> {
    /// p: BNT trading liquidity change.
    pub bnt_liquidity_change: B,
    /// q: BNT removed from protocol staking.
    pub bnt_burned: B,
    /// r: TKN trading liquidity change.
    pub tkn_liquidity_change: B,
    /// s: TKN paid out of the vault.
    pub tkn_from_vault: B,
    /// t: BNT paid to the provider.
    pub bnt_to_user: B,
    /// u: TKN paid out of the external protection wallet.
    pub tkn_from_wallet: B,
    /// v: withdrawal fee retained by the pool.
    pub withdrawal_fee: B,
}

impl<B: ArithmeticBackend> WithdrawalAmounts<B> {
    /// All outputs zero.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            bnt_liquidity_change: B::zero(),
            bnt_burned: B::zero(),
            tkn_liquidity_change: B::zero(),
            tkn_from_vault: B::zero(),
            bnt_to_user: B::zero(),
            tkn_from_wallet: B::zero(),
            withdrawal_fee: B::zero(),
        }
    }
}

/// A settled withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalOutcome<B> {
    case: Case,
    amounts: WithdrawalAmounts<B>,
    bnt_delta: LiquidityDelta<B>,
    tkn_delta: LiquidityDelta<B>,
}

impl<B: ArithmeticBackend> WithdrawalOutcome<B> {
    /// Assembles an outcome.
    #[must_use]
    pub const fn new(
        case: Case,
        amounts: WithdrawalAmounts<B>,
        bnt_delta: LiquidityDelta<B>,
        tkn_delta: LiquidityDelta<B>,
    ) -> Self {
        Self {
            case,
            amounts,
            bnt_delta,
            tkn_delta,
        }
    }

    /// The resolved case.
    #[must_use]
    pub const fn case(&self) -> Case {
        self.case
    }

    /// Raw handler outputs.
    #[must_use]
    pub const fn amounts(&self) -> &WithdrawalAmounts<B> {
        &self.amounts
    }

    /// Movement of the BNT trading liquidity.
    #[must_use]
    pub const fn bnt_delta(&self) -> LiquidityDelta<B> {
        self.bnt_delta
    }

    /// Movement of the TKN trading liquidity.
    #[must_use]
    pub const fn tkn_delta(&self) -> LiquidityDelta<B> {
        self.tkn_delta
    }

    /// TKN owed to the provider: `s + u`.
    ///
    /// # Errors
    ///
    /// Propagates an overflow fault.
    pub fn tkn_out(&self) -> Result<B, crate::error::ArithmeticFault> {
        self.amounts
            .tkn_from_vault
            .checked_add(&self.amounts.tkn_from_wallet)
    }

    /// BNT owed to the provider: `t`.
    #[must_use]
    pub const fn bnt_out(&self) -> B {
        self.amounts.bnt_to_user
    }
}

/// Direction of a single trade leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeDirection {
    /// BNT in, TKN out.
    BntToTkn,
    /// TKN in, BNT out.
    TknToBnt,
}

/// One leg of a trade against a single pool.
///
/// `trading_fee` and `lp_fee` are denominated in the leg's output token;
/// `vortex_fee` is always in BNT.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLeg<B> {
    /// Direction of the leg.
    pub direction: TradeDirection,
    /// Input amount.
    pub amount_in: B,
    /// Output amount after fees.
    pub amount_out: B,
    /// Full trading fee.
    pub trading_fee: B,
    /// Part of the fee credited to stakers of the output token.
    pub lp_fee: B,
    /// BNT routed to the vortex.
    pub vortex_fee: B,
    /// BNT trading liquidity after the leg.
    pub bnt_trading_liquidity: B,
    /// TKN trading liquidity after the leg.
    pub tkn_trading_liquidity: B,
}

/// A leg applied by the orchestrator to a concrete pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledLeg<B> {
    /// The TKN pool the leg traded against.
    pub pool: TokenId,
    /// Handler output.
    pub leg: TradeLeg<B>,
    /// Whether the new trading liquidity was written.
    pub liquidity_updated: bool,
}

/// A completed trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome<B> {
    /// Amount of the target token paid out.
    pub amount_out: B,
    /// One leg for BNT↔TKN, two for TKN↔TKN.
    pub legs: Vec<SettledLeg<B>>,
}

impl<B: ArithmeticBackend> TradeOutcome<B> {
    /// Trading fee of the final leg, in the target token.
    #[must_use]
    pub fn trading_fee(&self) -> B {
        self.legs
            .last()
            .map_or_else(B::zero, |settled| settled.leg.trading_fee)
    }

    /// Total BNT routed to the vortex across all legs.
    ///
    /// # Errors
    ///
    /// Propagates an overflow fault.
    pub fn vortex_fee(&self) -> Result<B, crate::error::ArithmeticFault> {
        self.legs
            .iter()
            .try_fold(B::zero(), |acc, settled| acc.checked_add(&settled.leg.vortex_fee))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PrimaryCase;
    use crate::math::FixedPoint;

    fn fp(v: u128) -> FixedPoint {
        FixedPoint::from_u128(v)
    }

    #[test]
    fn delta_apply() {
        let Ok(up) = LiquidityDelta::Increase(fp(5)).apply_to(&fp(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(up, fp(15));
        let Ok(down) = LiquidityDelta::Decrease(fp(5)).apply_to(&fp(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(down, fp(5));
        assert!(LiquidityDelta::Decrease(fp(11)).apply_to(&fp(10)).is_err());
        let Ok(same) = LiquidityDelta::Unchanged.apply_to(&fp(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(same, fp(10));
    }

    #[test]
    fn outcome_payouts() {
        let mut amounts = WithdrawalAmounts::zero();
        amounts.tkn_from_vault = fp(90);
        amounts.tkn_from_wallet = fp(7);
        amounts.bnt_to_user = fp(3);
        let outcome = WithdrawalOutcome::new(
            Case::primary(PrimaryCase::DefaultDeficit),
            amounts,
            LiquidityDelta::Unchanged,
            LiquidityDelta::Unchanged,
        );
        let Ok(tkn) = outcome.tkn_out() else {
            panic!("expected Ok");
        };
        assert_eq!(tkn, fp(97));
        assert_eq!(outcome.bnt_out(), fp(3));
    }

    #[test]
    fn trade_outcome_sums_vortex_over_legs() {
        let leg = TradeLeg {
            direction: TradeDirection::TknToBnt,
            amount_in: fp(100),
            amount_out: fp(90),
            trading_fee: fp(5),
            lp_fee: fp(4),
            vortex_fee: fp(1),
            bnt_trading_liquidity: fp(0),
            tkn_trading_liquidity: fp(0),
        };
        let Ok(pool) = TokenId::new("LINK") else {
            panic!("expected Ok");
        };
        let outcome = TradeOutcome {
            amount_out: fp(90),
            legs: vec![
                SettledLeg {
                    pool: pool.clone(),
                    leg,
                    liquidity_updated: true,
                },
                SettledLeg {
                    pool,
                    leg,
                    liquidity_updated: false,
                },
            ],
        };
        let Ok(vortex) = outcome.vortex_fee() else {
            panic!("expected Ok");
        };
        assert_eq!(vortex, fp(2));
        assert_eq!(outcome.trading_fee(), fp(5));
    }
}
