//! # Bancor Settlement
//!
//! Settlement engine for a single-sided-liquidity AMM in the style of
//! Bancor v3: classify a withdrawal into one of a fixed set of closed-form
//! cases, compute the payout split and the trading-liquidity movement with
//! checked arithmetic, and sequence stake, unstake and trade requests
//! against per-token ledgers.
//!
//! The arithmetic mirrors on-chain contract math.  Every primitive rejects
//! negative and above-`MAX_UINT256` results with an
//! [`ArithmeticFault`](error::ArithmeticFault) instead of wrapping, and
//! integer division floors in the exact order each formula is written.
//!
//! # Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `float` | yes | `f64` backend [`FloatingPoint`](math::FloatingPoint) for off-chain simulation |
//!
//! The `U256` backend [`FixedPoint`](math::FixedPoint) is always compiled.
//!
//! # Quick Start
//!
//! ```rust
//! use bancor_settlement::config::{ProtocolConfig, TokenConfig};
//! use bancor_settlement::domain::{Ppm, Rate, TokenId};
//! use bancor_settlement::math::{ArithmeticBackend, FixedPoint};
//! use bancor_settlement::protocol::Protocol;
//!
//! // 1. Whitelist and bootstrap a pool: 1% trading fee, 20% vortex
//! let link = TokenId::new("LINK").expect("valid symbol");
//! let token = TokenConfig::new(Ppm::new(10_000), Ppm::new(200_000), Rate::ONE)
//!     .expect("valid token config");
//! let config = ProtocolConfig::new(100_000, 5_000)
//!     .and_then(|c| c.with_token(link.clone(), token))
//!     .and_then(|c| c.with_bootstrapped(link.clone()))
//!     .expect("valid config");
//!
//! let mut protocol = Protocol::<FixedPoint>::new(config).expect("protocol");
//! let fp = FixedPoint::from_u128;
//!
//! // 2. Stake: the DAO bootstrap seeds trading liquidity
//! let pool_tokens = protocol.stake(&link, fp(10_000), 1).expect("stake");
//!
//! // 3. Trade TKN for BNT
//! let trade = protocol
//!     .trade(&link, fp(1_000), &TokenId::bnt(), 2)
//!     .expect("trade");
//! assert_eq!(trade.amount_out, fp(900));
//!
//! // 4. Inspect a withdrawal without applying it
//! let preview = protocol
//!     .describe_withdrawal(&link, pool_tokens)
//!     .expect("preview");
//! println!("{}", preview.classification.case());
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │     Protocol      │  stake / unstake / trade, shutdown check, commit
//! └────────┬─────────┘
//!          │ PoolState snapshot
//!          ▼
//! ┌──────────────────┐
//! │ TokenomicsEngine  │  classify → apply, external wallet suffix
//! └────────┬─────────┘
//!          │ CaseClassifier + handlers
//!          ▼
//! ┌──────────────────┐
//! │ ArithmeticBackend │  FixedPoint (U256), FloatingPoint (f64)
//! └──────────────────┘
//! ```
//!
//! # Module Guide
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`domain`] | Value types: [`Case`](domain::Case), [`PoolState`](domain::PoolState), [`Ppm`](domain::Ppm), [`Rate`](domain::Rate), outcomes |
//! | [`math`] | [`ArithmeticBackend`](math::ArithmeticBackend), both backends and the case [`handlers`](math::handlers) |
//! | [`tokenomics`] | [`CaseClassifier`](tokenomics::CaseClassifier) and [`TokenomicsEngine`](tokenomics::TokenomicsEngine) |
//! | [`protocol`] | [`Protocol`](protocol::Protocol) orchestrator and pool balances |
//! | [`config`] | [`ProtocolConfig`](config::ProtocolConfig) and per-token parameters |
//! | [`traits`] | [`LedgerStore`](traits::LedgerStore) and [`EmaProvider`](traits::EmaProvider) collaborators |
//! | [`ledger`] | [`InMemoryLedgers`](ledger::InMemoryLedgers) |
//! | [`ema`] | [`EmaTracker`](ema::EmaTracker) |
//! | [`error`] | [`AmmError`](error::AmmError) unified error enum |
//! | [`prelude`] | Convenience re-exports for common types and traits |
//!
//! # Logging
//!
//! Case selection, trades and liquidity changes are reported through
//! [`tracing`].  The crate never installs a subscriber.

pub mod config;
pub mod domain;
pub mod ema;
pub mod error;
pub mod ledger;
pub mod math;
pub mod prelude;
pub mod protocol;
pub mod tokenomics;
pub mod traits;
