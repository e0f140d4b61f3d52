//! Per-token balance ledgers.
//!
//! [`InMemoryLedgers`] is the default [`LedgerStore`]: one append-only
//! vector of [`LedgerEntry`] per `(LedgerKind, TokenId)` pair.

use core::fmt;
use std::collections::BTreeMap;

use crate::domain::TokenId;
use crate::traits::LedgerStore;

/// The balances the protocol keeps history for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LedgerKind {
    /// Tokens held by the protocol vault.
    Vault,
    /// Staked balance owed to liquidity providers.
    Staking,
    /// Outstanding pool tokens (bnTKN / bnBNT).
    PoolTokenSupply,
    /// TKN held by the external protection wallet.
    ExternalProtectionWallet,
    /// BNT side of a pool's trading liquidity.
    BntTradingLiquidity,
    /// TKN side of a pool's trading liquidity.
    TknTradingLiquidity,
    /// BNT the protocol may still mint into a pool.
    BntFundingRemaining,
    /// BNT minted to compensate a pool's TKN withdrawals.
    BntCompensation,
    /// Accumulated vortex fees, in BNT.
    Vortex,
}

impl LedgerKind {
    /// Every ledger a non-BNT pool carries.
    pub const POOL: [Self; 8] = [
        Self::Vault,
        Self::Staking,
        Self::PoolTokenSupply,
        Self::ExternalProtectionWallet,
        Self::BntTradingLiquidity,
        Self::TknTradingLiquidity,
        Self::BntFundingRemaining,
        Self::BntCompensation,
    ];

    /// Every ledger of the BNT reserve.
    pub const RESERVE: [Self; 4] = [Self::Vault, Self::Staking, Self::PoolTokenSupply, Self::Vortex];
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vault => "vault",
            Self::Staking => "staking",
            Self::PoolTokenSupply => "pool token supply",
            Self::ExternalProtectionWallet => "external protection wallet",
            Self::BntTradingLiquidity => "bnt trading liquidity",
            Self::TknTradingLiquidity => "tkn trading liquidity",
            Self::BntFundingRemaining => "bnt funding remaining",
            Self::BntCompensation => "bnt compensation",
            Self::Vortex => "vortex",
        };
        f.write_str(name)
    }
}

/// A balance recorded at a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry<B> {
    /// Block the balance was recorded at.
    pub block: u64,
    /// Balance at the end of the recording operation.
    pub value: B,
}

/// [`LedgerStore`] backed by a `BTreeMap` of append-only vectors.
///
/// # Examples
///
/// ```
/// use bancor_settlement::domain::TokenId;
/// use bancor_settlement::ledger::{InMemoryLedgers, LedgerKind};
/// use bancor_settlement::traits::LedgerStore;
///
/// let mut ledgers = InMemoryLedgers::<u64>::new();
/// let bnt = TokenId::bnt();
/// ledgers.append(LedgerKind::Vault, &bnt, 0, 0);
/// ledgers.append(LedgerKind::Vault, &bnt, 3, 500);
/// assert_eq!(ledgers.latest(LedgerKind::Vault, &bnt), Some(500));
/// assert_eq!(ledgers.history(LedgerKind::Vault, &bnt).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryLedgers<B> {
    entries: BTreeMap<(LedgerKind, TokenId), Vec<LedgerEntry<B>>>,
}

impl<B> InMemoryLedgers<B> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of ledgers holding at least one entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was ever appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B> Default for InMemoryLedgers<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Copy> LedgerStore<B> for InMemoryLedgers<B> {
    fn append(&mut self, kind: LedgerKind, token: &TokenId, block: u64, value: B) {
        self.entries
            .entry((kind, token.clone()))
            .or_default()
            .push(LedgerEntry { block, value });
    }

    fn latest(&self, kind: LedgerKind, token: &TokenId) -> Option<B> {
        self.history(kind, token).last().map(|entry| entry.value)
    }

    fn history(&self, kind: LedgerKind, token: &TokenId) -> &[LedgerEntry<B>] {
        self.entries
            .get(&(kind, token.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
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

    #[test]
    fn unknown_ledger_is_empty() {
        let ledgers = InMemoryLedgers::<u64>::new();
        assert!(ledgers.history(LedgerKind::Vault, &link()).is_empty());
        assert_eq!(ledgers.latest(LedgerKind::Vault, &link()), None);
        assert!(ledgers.is_empty());
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut ledgers = InMemoryLedgers::new();
        ledgers.append(LedgerKind::Staking, &link(), 1, 10u64);
        ledgers.append(LedgerKind::Staking, &link(), 1, 12);
        ledgers.append(LedgerKind::Staking, &link(), 4, 7);
        let blocks: Vec<_> = ledgers
            .history(LedgerKind::Staking, &link())
            .iter()
            .map(|e| (e.block, e.value))
            .collect();
        assert_eq!(blocks, vec![(1, 10), (1, 12), (4, 7)]);
        assert_eq!(ledgers.latest(LedgerKind::Staking, &link()), Some(7));
    }

    #[test]
    fn ledgers_are_keyed_by_kind_and_token() {
        let mut ledgers = InMemoryLedgers::new();
        ledgers.append(LedgerKind::Vault, &link(), 0, 1u64);
        ledgers.append(LedgerKind::Vault, &TokenId::bnt(), 0, 2);
        ledgers.append(LedgerKind::Staking, &link(), 0, 3);
        assert_eq!(ledgers.len(), 3);
        assert_eq!(ledgers.latest(LedgerKind::Vault, &link()), Some(1));
        assert_eq!(ledgers.latest(LedgerKind::Vault, &TokenId::bnt()), Some(2));
    }

    #[test]
    fn kind_display() {
        assert_eq!(LedgerKind::ExternalProtectionWallet.to_string(), "external protection wallet");
        assert_eq!(LedgerKind::BntCompensation.to_string(), "bnt compensation");
        assert_eq!(LedgerKind::POOL.len(), 8);
        assert_eq!(LedgerKind::RESERVE.len(), 4);
    }
}
