//! Convenience re-exports for common types and traits.
//!
//! ```rust
//! use bancor_settlement::prelude::*;
//! ```

pub use crate::domain::{
    Case, ExchangeRate, FeeSchedule, LiquidityDelta, PoolState, Ppm, PrimaryCase, Rate, TokenId,
    TradeOutcome, TradingLiquidity, WalletAdjustment, WithdrawalAmounts, WithdrawalOutcome,
};

pub use crate::math::{ArithmeticBackend, FixedPoint};
#[cfg(feature = "float")]
pub use crate::math::FloatingPoint;

pub use crate::tokenomics::{CaseClassifier, TokenomicsEngine};

pub use crate::traits::{EmaProvider, LedgerStore};

pub use crate::config::{ProtocolConfig, ShutdownPolicy, TokenConfig};

pub use crate::protocol::Protocol;

pub use crate::error::{AmmError, ArithmeticFault, Result};
