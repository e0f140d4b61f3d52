//! Unified error types for the settlement engine.
//!
//! All fallible operations across the crate return [`AmmError`] as their
//! error type.  Arithmetic primitives report the narrower
//! [`ArithmeticFault`], which converts into [`AmmError::Arithmetic`] through
//! `?` or is wrapped into [`AmmError::Settlement`] when it originates inside
//! a withdrawal case handler.

use core::fmt;

use thiserror::Error;

use crate::domain::{Case, TokenId};

/// Classification of an arithmetic primitive failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The result would be negative.
    Negative,
    /// The result would exceed `MAX_UINT256`.
    Overflow,
    /// The divisor was zero.
    DivisionByZero,
    /// A floating-point result was `NaN` or infinite.
    NonFinite,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Negative => "negative result",
            Self::Overflow => "overflow above MAX_UINT256",
            Self::DivisionByZero => "division by zero",
            Self::NonFinite => "non-finite result",
        };
        f.write_str(label)
    }
}

/// A primitive operation produced a value outside `[0, MAX_UINT256]`.
///
/// Carries the rendered expression (operands included) and the offending
/// value so that a failure can be reproduced from the error alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in `{expression}` (value: {value})")]
pub struct ArithmeticFault {
    kind: FaultKind,
    expression: String,
    value: String,
}

impl ArithmeticFault {
    /// Creates a new fault.
    #[must_use]
    pub fn new(kind: FaultKind, expression: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            expression: expression.into(),
            value: value.into(),
        }
    }

    /// Returns the fault kind.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Returns the rendered expression, e.g. `"3 - 5"`.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the offending value, e.g. `"-2"`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Errors produced by the settlement engine and the protocol orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    /// An arithmetic primitive failed outside of a case handler.
    #[error("arithmetic fault: {0}")]
    Arithmetic(#[from] ArithmeticFault),

    /// An arithmetic primitive failed while a withdrawal case was applied.
    #[error("settlement of {case} failed in {step}: {fault}")]
    Settlement {
        /// The case being applied.
        case: Case,
        /// The handler step that faulted.
        step: &'static str,
        /// The underlying fault.
        #[source]
        fault: ArithmeticFault,
    },

    /// The token is not whitelisted.
    #[error("unsupported token: {0}")]
    UnsupportedToken(TokenId),

    /// The token identifier is malformed or used in an invalid position.
    #[error("invalid token: {0}")]
    InvalidToken(&'static str),

    /// A post-condition left a pool's BNT trading liquidity below the
    /// configured minimum.
    #[error(
        "pool shutdown triggered for {token}: BNT trading liquidity {liquidity} is below {threshold}"
    )]
    PoolShutdown {
        /// The pool that violated the threshold.
        token: TokenId,
        /// BNT trading liquidity after the operation.
        liquidity: String,
        /// Configured minimum liquidity.
        threshold: String,
    },

    /// An exchange rate is zero, negative or not representable.
    #[error("invalid rate: {0}")]
    InvalidRate(&'static str),

    /// Protocol or token configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// A caller-supplied amount is invalid.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(&'static str),

    /// The pool cannot serve the request.
    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(&'static str),

    /// Classifier predicates did not select exactly one case.
    #[error("ambiguous withdrawal case: {0}")]
    CaseAmbiguity(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, AmmError>;
