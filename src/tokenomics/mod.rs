//! Withdrawal classification and settlement.
//!
//! [`CaseClassifier`] decides which settlement case a withdrawal falls
//! into; [`TokenomicsEngine`] runs the matching handler and attaches the
//! external wallet suffix.  Both are pure: they take a
//! [`PoolState`](crate::domain::PoolState) snapshot and never mutate it.

mod classifier;
mod engine;

#[cfg(test)]
mod proptest_properties;

pub use classifier::{CaseClassifier, Classification, LimitCheck, Predicates};
pub use engine::TokenomicsEngine;
