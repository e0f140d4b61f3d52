//! Collaborator traits of the protocol orchestrator.
//!
//! The orchestrator owns pool state but delegates two concerns: balance
//! history to a [`LedgerStore`] and spot-rate smoothing to an
//! [`EmaProvider`].  Both have in-crate default implementations and can be
//! swapped through
//! [`Protocol::with_collaborators`](crate::protocol::Protocol::with_collaborators).

mod ema_provider;
mod ledger_store;

pub use ema_provider::EmaProvider;
pub use ledger_store::LedgerStore;
