//! Append-only balance history consumed by the protocol.
//!
//! The orchestrator records the new value of every balance it touches
//! after each committed operation.  A [`LedgerStore`] only has to keep
//! those values in insertion order; it never rewrites a past entry.
//!
//! # Ledger Identity
//!
//! A ledger is addressed by a `(LedgerKind, TokenId)` pair.  The
//! protocol-wide ledgers (BNT funding remaining, vortex) are keyed by
//! [`TokenId::bnt`](crate::domain::TokenId::bnt).

use crate::domain::TokenId;
use crate::ledger::{LedgerEntry, LedgerKind};

/// Storage contract for per-token balance time series.
///
/// # Implementors
///
/// - [`InMemoryLedgers`](crate::ledger::InMemoryLedgers): `BTreeMap` of
///   append-only vectors, the protocol's default store.
///
/// # Ordering
///
/// Entries must be returned in the order they were appended.  Two entries
/// for the same block are legal; the later one is the balance at the end
/// of that block.
pub trait LedgerStore<B> {
    /// Appends `value` as the balance of `(kind, token)` at `block`.
    fn append(&mut self, kind: LedgerKind, token: &TokenId, block: u64, value: B);

    /// Returns the most recently appended value, if any.
    fn latest(&self, kind: LedgerKind, token: &TokenId) -> Option<B>;

    /// Returns every entry of `(kind, token)` in insertion order.
    ///
    /// Unknown ledgers yield an empty slice.
    fn history(&self, kind: LedgerKind, token: &TokenId) -> &[LedgerEntry<B>];
}
