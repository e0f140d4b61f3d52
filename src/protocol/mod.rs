//! The protocol orchestrator.
//!
//! [`Protocol`] owns every [`TokenPool`] and the [`BntReserve`], sequences
//! stake, unstake and trade requests through the
//! [`TokenomicsEngine`](crate::tokenomics::TokenomicsEngine), runs the pool
//! shutdown check and records committed balances in its
//! [`LedgerStore`](crate::traits::LedgerStore).

mod liquidity;
mod orchestrator;
mod state;

#[cfg(test)]
mod proptest_properties;

pub use orchestrator::{Protocol, WithdrawalPreview};
pub use state::{BntReserve, TokenPool};
