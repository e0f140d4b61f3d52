//! Arithmetic backends and closed-form handlers.
//!
//! This module provides the [`ArithmeticBackend`] trait, its two
//! implementations, and the [`handlers`] that compute every withdrawal
//! case and trade leg on top of it.
//!
//! # Backends
//!
//! | Feature | Type | Use case |
//! |---------|------|----------|
//! | always | `FixedPoint` | Bit-exact on-chain parity (`U256`) |
//! | `float` | `FloatingPoint` | Off-chain simulation (`f64`) |

mod backend;
mod fixed_point;
#[cfg(feature = "float")]
mod floating_point;

pub mod handlers;

pub use backend::ArithmeticBackend;
pub use fixed_point::FixedPoint;
#[cfg(feature = "float")]
pub use floating_point::FloatingPoint;
