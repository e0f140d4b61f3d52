//! Closed-form withdrawal and trade handlers.
//!
//! Every handler is a pure function of a pool snapshot and an amount.  The
//! formulas are evaluated exactly in the order written below, because with
//! [`FixedPoint`](super::FixedPoint) each division floors and the
//! intermediate truncation is part of the observable result.
//!
//! Withdrawal symbols (see [`PoolState`]): `x` is the TKN value withdrawn
//! and `y = x·(1 − n)` the value net of the exit fee.
//!
//! | Handler | Outputs |
//! |---------|---------|
//! | [`bootstrap_surplus`] | `s = y` |
//! | [`bootstrap_deficit_special_case`] | `s = y·c/e` |
//! | [`bootstrap_deficit`] | `s = y·(b+c)/e`, `t = a·(y − s)/b` |
//! | [`arbitrage_surplus`] | `r = x·(b+c − e(1−n))/e`, `p = a·r(1−m)/(b + r(1−m))`, `s = y` |
//! | [`arbitrage_deficit`] | `r = x·(e(1−n) − b−c)/e`, `p = a·r(1−m)/(b − r(1−m))`, `s = y` |
//! | [`default_surplus`] | `r = y − c`, `p = q = a·r/b`, `s = y` |
//! | [`default_deficit`] | `s = y·(b+c)/e`, `r = s − c`, `p = q = a·r/b`, `t = a·(y − s)/b` |

use crate::domain::{
    ExchangeRate, FeeSchedule, PoolState, Ppm, TradeDirection, TradeLeg, TradingLiquidity,
    WithdrawalAmounts,
};
use crate::error::ArithmeticFault;

use super::ArithmeticBackend;

type HandlerResult<T> = Result<T, ArithmeticFault>;

// ---------------------------------------------------------------------------
// BNT pool
// ---------------------------------------------------------------------------

/// Redeems bnBNT: `gross = amount·num/den`, then the exit fee is withheld.
///
/// Returns `(tkn_out, bnt_out)`; `tkn_out` is always zero.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn unstake_bnt<B: ArithmeticBackend>(
    amount: &B,
    rate: &ExchangeRate<B>,
    exit_fee: Ppm,
) -> HandlerResult<(B, B)> {
    let gross = amount.mul_div(&rate.numerator(), &rate.denominator())?;
    let bnt_out = gross.mul_ppm(exit_fee.complement())?;
    Ok((B::zero(), bnt_out))
}

// ---------------------------------------------------------------------------
// Withdrawal cases
// ---------------------------------------------------------------------------

/// `y` and a zeroed output set carrying the withdrawal fee `v = x − y`.
fn net_of_exit_fee<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<(B, WithdrawalAmounts<B>)> {
    let y = x.mul_ppm(state.withdrawal_fee().complement())?;
    let mut amounts = WithdrawalAmounts::zero();
    amounts.withdrawal_fee = x.checked_sub(&y)?;
    Ok((y, amounts))
}

/// Pays `y` from the vault; trading liquidity is untouched.
///
/// Serves `BalancedBootstrapSurplus`, `BootstrapSurplus` and
/// `BootstrapSurplusSpecialCase`.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn bootstrap_surplus<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    amounts.tkn_from_vault = y;
    Ok(amounts)
}

/// Pays the vault's pro-rata share `y·c/e`.
///
/// # Errors
///
/// Propagates arithmetic faults, including a zero staked balance.
pub fn bootstrap_deficit_special_case<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    amounts.tkn_from_vault =
        y.mul_div(&state.tkn_vault_surplus(), &state.tkn_staked_balance())?;
    Ok(amounts)
}

/// Pays the deficit-scaled TKN share from the vault and the shortfall in BNT.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn bootstrap_deficit<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    let holdings = state.tkn_holdings()?;
    let z = y.mul_div(&holdings, &state.tkn_staked_balance())?;
    let shortfall = y.checked_sub(&z)?;
    amounts.tkn_from_vault = z;
    amounts.bnt_to_user = state
        .bnt_trading_liquidity()
        .mul_div(&shortfall, &state.tkn_trading_liquidity())?;
    Ok(amounts)
}

/// Settles a surplus withdrawal inside both limits by selling the surplus
/// share into the pool.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn arbitrage_surplus<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    let a = state.bnt_trading_liquidity();
    let b = state.tkn_trading_liquidity();
    let e = state.tkn_staked_balance();

    let reference = e.mul_ppm(state.withdrawal_fee().complement())?;
    let excess = state.tkn_holdings()?.checked_sub(&reference)?;
    let r = x.mul_div(&excess, &e)?;
    let r_net = r.mul_ppm(state.trading_fee().complement())?;
    let p = a.mul_div(&r_net, &b.checked_add(&r_net)?)?;

    amounts.bnt_liquidity_change = p;
    amounts.tkn_liquidity_change = r;
    amounts.tkn_from_vault = y;
    Ok(amounts)
}

/// Settles a deficit withdrawal inside both limits by buying the missing
/// share out of the pool.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn arbitrage_deficit<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    let a = state.bnt_trading_liquidity();
    let b = state.tkn_trading_liquidity();
    let e = state.tkn_staked_balance();

    let reference = e.mul_ppm(state.withdrawal_fee().complement())?;
    let missing = reference.checked_sub(&state.tkn_holdings()?)?;
    let r = x.mul_div(&missing, &e)?;
    let r_net = r.mul_ppm(state.trading_fee().complement())?;
    let p = a.mul_div(&r_net, &b.checked_sub(&r_net)?)?;

    amounts.bnt_liquidity_change = p;
    amounts.tkn_liquidity_change = r;
    amounts.tkn_from_vault = y;
    Ok(amounts)
}

/// Pays `y`, taking whatever the vault lacks out of trading liquidity.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn default_surplus<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    let r = y.checked_sub(&state.tkn_vault_surplus())?;
    let p = state
        .bnt_trading_liquidity()
        .mul_div(&r, &state.tkn_trading_liquidity())?;

    amounts.bnt_liquidity_change = p;
    amounts.bnt_burned = p;
    amounts.tkn_liquidity_change = r;
    amounts.tkn_from_vault = y;
    Ok(amounts)
}

/// Pays the deficit-scaled TKN share, shrinking trading liquidity, and the
/// shortfall in BNT.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn default_deficit<B: ArithmeticBackend>(
    state: &PoolState<B>,
    x: &B,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let (y, mut amounts) = net_of_exit_fee(state, x)?;
    let a = state.bnt_trading_liquidity();
    let b = state.tkn_trading_liquidity();

    let z = y.mul_div(&state.tkn_holdings()?, &state.tkn_staked_balance())?;
    let r = z.checked_sub(&state.tkn_vault_surplus())?;
    let p = a.mul_div(&r, &b)?;
    let t = a.mul_div(&y.checked_sub(&z)?, &b)?;

    amounts.bnt_liquidity_change = p;
    amounts.bnt_burned = p;
    amounts.tkn_liquidity_change = r;
    amounts.tkn_from_vault = z;
    amounts.bnt_to_user = t;
    Ok(amounts)
}

// ---------------------------------------------------------------------------
// External protection wallet
// ---------------------------------------------------------------------------

/// The wallet covers the BNT payout in full: `u = t·b/a`, `t = 0`.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn external_wallet_adjustment_1<B: ArithmeticBackend>(
    state: &PoolState<B>,
    amounts: WithdrawalAmounts<B>,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let mut adjusted = amounts;
    adjusted.tkn_from_wallet = amounts
        .bnt_to_user
        .mul_div(&state.tkn_trading_liquidity(), &state.bnt_trading_liquidity())?;
    adjusted.bnt_to_user = B::zero();
    Ok(adjusted)
}

/// The wallet is drained: `u = w`, `t = t − a·w/b`.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn external_wallet_adjustment_2<B: ArithmeticBackend>(
    state: &PoolState<B>,
    amounts: WithdrawalAmounts<B>,
) -> HandlerResult<WithdrawalAmounts<B>> {
    let w = state.external_protection_balance();
    let covered = state
        .bnt_trading_liquidity()
        .mul_div(&w, &state.tkn_trading_liquidity())?;
    let mut adjusted = amounts;
    adjusted.tkn_from_wallet = w;
    adjusted.bnt_to_user = amounts.bnt_to_user.checked_sub(&covered)?;
    Ok(adjusted)
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Sells `amount` BNT into a pool.
///
/// The TKN-denominated vortex share is converted to BNT at the post-trade
/// price and removed from the BNT side.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn trade_bnt_to_tkn<B: ArithmeticBackend>(
    liquidity: &TradingLiquidity<B>,
    fees: FeeSchedule,
    amount: &B,
) -> HandlerResult<TradeLeg<B>> {
    let a = liquidity.bnt();
    let b = liquidity.tkn();

    let a_in = a.checked_add(amount)?;
    let crude = b.mul_div(amount, &a_in)?;
    let trading_fee = crude.mul_ppm(fees.pool_fee())?;
    let amount_out = crude.checked_sub(&trading_fee)?;
    let vortex_tkn = trading_fee.mul_ppm(fees.vortex_rate())?;
    let lp_fee = trading_fee.checked_sub(&vortex_tkn)?;

    let tkn_after = b.checked_sub(&amount_out)?;
    let vortex_fee = a_in.mul_div(&vortex_tkn, &tkn_after)?;
    let bnt_after = a_in.checked_sub(&vortex_fee)?;

    Ok(TradeLeg {
        direction: TradeDirection::BntToTkn,
        amount_in: *amount,
        amount_out,
        trading_fee,
        lp_fee,
        vortex_fee,
        bnt_trading_liquidity: bnt_after,
        tkn_trading_liquidity: tkn_after,
    })
}

/// Sells `amount` TKN into a pool for BNT.
///
/// # Errors
///
/// Propagates arithmetic faults.
pub fn trade_tkn_to_bnt<B: ArithmeticBackend>(
    liquidity: &TradingLiquidity<B>,
    fees: FeeSchedule,
    amount: &B,
) -> HandlerResult<TradeLeg<B>> {
    let a = liquidity.bnt();
    let b = liquidity.tkn();

    let b_in = b.checked_add(amount)?;
    let crude = a.mul_div(amount, &b_in)?;
    let trading_fee = crude.mul_ppm(fees.pool_fee())?;
    let amount_out = crude.checked_sub(&trading_fee)?;
    let vortex_fee = trading_fee.mul_ppm(fees.vortex_rate())?;
    let lp_fee = trading_fee.checked_sub(&vortex_fee)?;

    let bnt_after = a.checked_sub(&amount_out)?.checked_sub(&vortex_fee)?;

    Ok(TradeLeg {
        direction: TradeDirection::TknToBnt,
        amount_in: *amount,
        amount_out,
        trading_fee,
        lp_fee,
        vortex_fee,
        bnt_trading_liquidity: bnt_after,
        tkn_trading_liquidity: b_in,
    })
}

/// Routes TKN→TKN through BNT: the source pool sells to BNT, the target
/// pool buys with it.  Returns `(source_leg, target_leg)`.
///
/// # Errors
///
/// Propagates arithmetic faults of either leg.
pub fn trade_tkn_to_tkn<B: ArithmeticBackend>(
    source: &TradingLiquidity<B>,
    source_fees: FeeSchedule,
    target: &TradingLiquidity<B>,
    target_fees: FeeSchedule,
    amount: &B,
) -> HandlerResult<(TradeLeg<B>, TradeLeg<B>)> {
    let sell = trade_tkn_to_bnt(source, source_fees, amount)?;
    let buy = trade_bnt_to_tkn(target, target_fees, &sell.amount_out)?;
    Ok((sell, buy))
}
