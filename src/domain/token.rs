//! Token identifiers.

use core::fmt;

use crate::error::AmmError;

/// Symbol of the protocol's reserve token.
pub const BNT_SYMBOL: &str = "BNT";

/// Identifier of a token known to the protocol, e.g. `"BNT"` or `"LINK"`.
///
/// Identifiers are non-empty, contain no whitespace and compare by their
/// symbol, so they can key ordered maps of pools and ledgers.
///
/// # Examples
///
/// ```
/// use bancor_settlement::domain::TokenId;
///
/// let Ok(link) = TokenId::new("LINK") else { panic!() };
/// assert!(!link.is_bnt());
/// assert!(TokenId::bnt().is_bnt());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(String);

impl TokenId {
    /// Creates a token identifier from its symbol.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if the symbol is empty or contains
    /// whitespace.
    pub fn new(symbol: impl Into<String>) -> crate::error::Result<Self> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(AmmError::InvalidToken("token symbol must not be empty"));
        }
        if symbol.chars().any(char::is_whitespace) {
            return Err(AmmError::InvalidToken("token symbol must not contain whitespace"));
        }
        Ok(Self(symbol))
    }

    /// Returns the identifier of the reserve token.
    #[must_use]
    pub fn bnt() -> Self {
        Self(BNT_SYMBOL.to_owned())
    }

    /// Returns `true` if this is the reserve token.
    #[must_use]
    pub fn is_bnt(&self) -> bool {
        self.0 == BNT_SYMBOL
    }

    /// Returns the symbol.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
