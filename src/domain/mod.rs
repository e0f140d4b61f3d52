//! Fundamental domain value types used throughout the settlement engine.
//!
//! This module contains the value types that model the protocol domain:
//! token identifiers, ratios, exchange rates, pool snapshots, withdrawal
//! cases and the outcomes of withdrawals and trades.  Newtypes use
//! validated constructors to enforce their invariants.

mod case;
mod outcome;
mod pool_state;
mod ppm;
mod rate;
mod token;

pub use case::{Case, PrimaryCase, WalletAdjustment};
pub use outcome::{
    LiquidityDelta, SettledLeg, TradeDirection, TradeLeg, TradeOutcome, WithdrawalAmounts,
    WithdrawalOutcome,
};
pub use pool_state::{ExchangeRate, FeeSchedule, PoolState, TradingLiquidity};
pub use ppm::{Ppm, PPM_RESOLUTION};
pub use rate::Rate;
pub use token::{TokenId, BNT_SYMBOL};
