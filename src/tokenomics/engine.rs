//! Classification and settlement behind a single entry point.

use crate::domain::{
    ExchangeRate, FeeSchedule, LiquidityDelta, PoolState, PrimaryCase, Ppm, TradeLeg,
    TradingLiquidity, WalletAdjustment, WithdrawalAmounts, WithdrawalOutcome,
};
use crate::error::{AmmError, ArithmeticFault};
use crate::math::{handlers, ArithmeticBackend};

use super::{CaseClassifier, Classification};

/// Pure settlement engine.
///
/// Composes [`CaseClassifier`] with the closed-form [`handlers`]: it never
/// mutates pool state, it only returns what the new state should be.
///
/// # Examples
///
/// ```
/// use bancor_settlement::domain::{PoolState, Ppm, PrimaryCase};
/// use bancor_settlement::math::{ArithmeticBackend, FixedPoint};
/// use bancor_settlement::tokenomics::TokenomicsEngine;
///
/// let fp = FixedPoint::from_u128;
/// let Ok(state) = PoolState::new(
///     fp(10_000), fp(10_100), fp(0), fp(10_000),
///     Ppm::new(2_500), Ppm::new(10_000), fp(0),
/// ) else { panic!() };
///
/// let engine = TokenomicsEngine;
/// let Ok(outcome) = engine.settle(&state, &fp(10_000)) else { panic!() };
/// assert_eq!(outcome.case().primary_case(), PrimaryCase::DefaultSurplus);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenomicsEngine;

impl TokenomicsEngine {
    /// Classifies a withdrawal of `x` TKN, including the wallet suffix.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidQuantity`] if `x` is zero or exceeds the staked
    ///   balance.
    /// - [`AmmError::Arithmetic`] or [`AmmError::CaseAmbiguity`] from the
    ///   classifier.
    /// - [`AmmError::Settlement`] if the primary handler faults while the
    ///   wallet suffix is being resolved.
    pub fn classify<B: ArithmeticBackend>(
        &self,
        state: &PoolState<B>,
        x: &B,
    ) -> crate::error::Result<Classification<B>> {
        if x.is_zero() {
            return Err(AmmError::InvalidQuantity("withdrawal amount must be positive"));
        }
        if *x > state.tkn_staked_balance() {
            return Err(AmmError::InvalidQuantity(
                "withdrawal exceeds the staked balance",
            ));
        }

        let classification = CaseClassifier::classify(state, x)?;
        let needs_wallet = !classification.limits_satisfied()
            && !state.external_protection_balance().is_zero()
            && !state.bnt_trading_liquidity().is_zero();
        if !needs_wallet {
            return Ok(classification);
        }

        let case = classification.case();
        let (step, primary) = run_primary(case.primary_case(), state, x);
        let amounts = primary.map_err(|fault| AmmError::Settlement { case, step, fault })?;
        let wallet = CaseClassifier::check_external_wallet(state, &amounts.bnt_to_user)?;
        Ok(classification.with_wallet(wallet))
    }

    /// Applies a classification and returns the settlement.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Settlement`] naming the case and the handler
    /// step if any arithmetic faults.
    pub fn apply<B: ArithmeticBackend>(
        &self,
        classification: &Classification<B>,
        state: &PoolState<B>,
        x: &B,
    ) -> crate::error::Result<WithdrawalOutcome<B>> {
        let case = classification.case();
        let settlement = |step: &'static str| {
            move |fault: ArithmeticFault| AmmError::Settlement { case, step, fault }
        };

        let (step, primary) = run_primary(case.primary_case(), state, x);
        let amounts = primary.map_err(settlement(step))?;

        let amounts = match case.wallet_adjustment() {
            None => amounts,
            Some(WalletAdjustment::ExternalWalletAdjustment1) => {
                handlers::external_wallet_adjustment_1(state, amounts)
                    .map_err(settlement("external_wallet_adjustment_1"))?
            }
            Some(WalletAdjustment::ExternalWalletAdjustment2) => {
                handlers::external_wallet_adjustment_2(state, amounts)
                    .map_err(settlement("external_wallet_adjustment_2"))?
            }
        };

        let (bnt_delta, tkn_delta) = liquidity_deltas(case.primary_case(), &amounts);
        tracing::debug!(
            backend = B::NAME,
            case = %case,
            surplus = classification.is_surplus(),
            hlim_ok = classification.hlim().is_satisfied(),
            hmax_ok = classification.hmax().is_satisfied(),
            vault_covers = ?classification.vault_covers(),
            tkn_from_vault = %amounts.tkn_from_vault,
            tkn_from_wallet = %amounts.tkn_from_wallet,
            bnt_to_user = %amounts.bnt_to_user,
            "withdrawal settled"
        );
        Ok(WithdrawalOutcome::new(case, amounts, bnt_delta, tkn_delta))
    }

    /// Classifies and applies in one call.
    ///
    /// # Errors
    ///
    /// See [`classify`](Self::classify) and [`apply`](Self::apply).
    pub fn settle<B: ArithmeticBackend>(
        &self,
        state: &PoolState<B>,
        x: &B,
    ) -> crate::error::Result<WithdrawalOutcome<B>> {
        let classification = self.classify(state, x)?;
        self.apply(&classification, state, x)
    }

    /// Redeems bnBNT at `rate`; see [`handlers::unstake_bnt`].
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Arithmetic`] on any fault.
    pub fn unstake_bnt<B: ArithmeticBackend>(
        &self,
        amount: &B,
        rate: &ExchangeRate<B>,
        exit_fee: Ppm,
    ) -> crate::error::Result<(B, B)> {
        Ok(handlers::unstake_bnt(amount, rate, exit_fee)?)
    }

    /// BNT → TKN leg; see [`handlers::trade_bnt_to_tkn`].
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientLiquidity`] for an empty pool and
    /// [`AmmError::Arithmetic`] on any fault.
    pub fn trade_bnt_to_tkn<B: ArithmeticBackend>(
        &self,
        liquidity: &TradingLiquidity<B>,
        fees: FeeSchedule,
        amount: &B,
    ) -> crate::error::Result<TradeLeg<B>> {
        ensure_tradeable(liquidity, amount)?;
        Ok(handlers::trade_bnt_to_tkn(liquidity, fees, amount)?)
    }

    /// TKN → BNT leg; see [`handlers::trade_tkn_to_bnt`].
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientLiquidity`] for an empty pool and
    /// [`AmmError::Arithmetic`] on any fault.
    pub fn trade_tkn_to_bnt<B: ArithmeticBackend>(
        &self,
        liquidity: &TradingLiquidity<B>,
        fees: FeeSchedule,
        amount: &B,
    ) -> crate::error::Result<TradeLeg<B>> {
        ensure_tradeable(liquidity, amount)?;
        Ok(handlers::trade_tkn_to_bnt(liquidity, fees, amount)?)
    }

    /// TKN → TKN through BNT; see [`handlers::trade_tkn_to_tkn`].
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientLiquidity`] if either pool is empty
    /// and [`AmmError::Arithmetic`] on any fault.
    pub fn trade_tkn_to_tkn<B: ArithmeticBackend>(
        &self,
        source: &TradingLiquidity<B>,
        source_fees: FeeSchedule,
        target: &TradingLiquidity<B>,
        target_fees: FeeSchedule,
        amount: &B,
    ) -> crate::error::Result<(TradeLeg<B>, TradeLeg<B>)> {
        ensure_tradeable(source, amount)?;
        if target.is_empty() {
            return Err(AmmError::InsufficientLiquidity("target pool has no trading liquidity"));
        }
        Ok(handlers::trade_tkn_to_tkn(
            source,
            source_fees,
            target,
            target_fees,
            amount,
        )?)
    }
}

fn ensure_tradeable<B: ArithmeticBackend>(
    liquidity: &TradingLiquidity<B>,
    amount: &B,
) -> crate::error::Result<()> {
    if amount.is_zero() {
        return Err(AmmError::InvalidQuantity("trade amount must be positive"));
    }
    if liquidity.is_empty() {
        return Err(AmmError::InsufficientLiquidity("pool has no trading liquidity"));
    }
    Ok(())
}

/// Dispatches to the handler of a primary case.
fn run_primary<B: ArithmeticBackend>(
    case: PrimaryCase,
    state: &PoolState<B>,
    x: &B,
) -> (&'static str, Result<WithdrawalAmounts<B>, ArithmeticFault>) {
    match case {
        PrimaryCase::BalancedBootstrapSurplus
        | PrimaryCase::BootstrapSurplus
        | PrimaryCase::BootstrapSurplusSpecialCase => {
            ("bootstrap_surplus", handlers::bootstrap_surplus(state, x))
        }
        PrimaryCase::BootstrapDeficit => ("bootstrap_deficit", handlers::bootstrap_deficit(state, x)),
        PrimaryCase::BootstrapDeficitSpecialCase => (
            "bootstrap_deficit_special_case",
            handlers::bootstrap_deficit_special_case(state, x),
        ),
        PrimaryCase::ArbitrageSurplus => ("arbitrage_surplus", handlers::arbitrage_surplus(state, x)),
        PrimaryCase::ArbitrageDeficit => ("arbitrage_deficit", handlers::arbitrage_deficit(state, x)),
        PrimaryCase::DefaultSurplus => ("default_surplus", handlers::default_surplus(state, x)),
        PrimaryCase::DefaultDeficit => ("default_deficit", handlers::default_deficit(state, x)),
    }
}

/// Direction of the trading-liquidity movement each case implies.
fn liquidity_deltas<B: ArithmeticBackend>(
    case: PrimaryCase,
    amounts: &WithdrawalAmounts<B>,
) -> (LiquidityDelta<B>, LiquidityDelta<B>) {
    let p = amounts.bnt_liquidity_change;
    let r = amounts.tkn_liquidity_change;
    match case {
        PrimaryCase::ArbitrageSurplus => (LiquidityDelta::Decrease(p), LiquidityDelta::Increase(r)),
        PrimaryCase::ArbitrageDeficit => (LiquidityDelta::Increase(p), LiquidityDelta::Decrease(r)),
        PrimaryCase::DefaultSurplus | PrimaryCase::DefaultDeficit => {
            (LiquidityDelta::Decrease(p), LiquidityDelta::Decrease(r))
        }
        PrimaryCase::BalancedBootstrapSurplus
        | PrimaryCase::BootstrapSurplus
        | PrimaryCase::BootstrapSurplusSpecialCase
        | PrimaryCase::BootstrapDeficit
        | PrimaryCase::BootstrapDeficitSpecialCase => {
            (LiquidityDelta::Unchanged, LiquidityDelta::Unchanged)
        }
    }
}
