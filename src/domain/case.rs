//! Withdrawal case tags.
//!
//! A withdrawal settles through exactly one [`PrimaryCase`], optionally
//! followed by a [`WalletAdjustment`] when the external protection wallet
//! has to top up the payout.
//!
//! | Primary case | BNT trading liquidity | TKN trading liquidity |
//! |--------------|-----------------------|-----------------------|
//! | `BalancedBootstrapSurplus` | unchanged | unchanged |
//! | `BootstrapSurplus` | unchanged | unchanged |
//! | `BootstrapSurplusSpecialCase` | unchanged | unchanged |
//! | `BootstrapDeficit` | unchanged | unchanged |
//! | `BootstrapDeficitSpecialCase` | unchanged | unchanged |
//! | `ArbitrageSurplus` | − p | + r |
//! | `ArbitrageDeficit` | + p | − r |
//! | `DefaultSurplus` | − p | − r |
//! | `DefaultDeficit` | − p | − r |

use core::fmt;

/// The bonding-curve branch used to settle a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryCase {
    /// Vault plus trading liquidity exactly equals the staked balance.
    BalancedBootstrapSurplus,
    /// Surplus pool whose vault covers the payout.
    BootstrapSurplus,
    /// Surplus pool with no trading liquidity on either side.
    BootstrapSurplusSpecialCase,
    /// Deficit pool whose vault covers the scaled payout.
    BootstrapDeficit,
    /// Deficit pool with no trading liquidity on either side.
    BootstrapDeficitSpecialCase,
    /// Surplus pool within both withdrawal limits.
    ArbitrageSurplus,
    /// Deficit pool within both withdrawal limits.
    ArbitrageDeficit,
    /// Surplus pool that must shrink trading liquidity.
    DefaultSurplus,
    /// Deficit pool that must shrink trading liquidity.
    DefaultDeficit,
}

impl PrimaryCase {
    /// Every primary case, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::BalancedBootstrapSurplus,
        Self::BootstrapSurplus,
        Self::BootstrapSurplusSpecialCase,
        Self::BootstrapDeficit,
        Self::BootstrapDeficitSpecialCase,
        Self::ArbitrageSurplus,
        Self::ArbitrageDeficit,
        Self::DefaultSurplus,
        Self::DefaultDeficit,
    ];

    /// Returns `true` for the cases that settle a surplus pool.
    #[must_use]
    pub const fn is_surplus(&self) -> bool {
        matches!(
            self,
            Self::BalancedBootstrapSurplus
                | Self::BootstrapSurplus
                | Self::BootstrapSurplusSpecialCase
                | Self::ArbitrageSurplus
                | Self::DefaultSurplus
        )
    }

    /// Returns `true` if settling the case moves trading liquidity.
    #[must_use]
    pub const fn moves_trading_liquidity(&self) -> bool {
        matches!(
            self,
            Self::ArbitrageSurplus
                | Self::ArbitrageDeficit
                | Self::DefaultSurplus
                | Self::DefaultDeficit
        )
    }

    /// Human-readable name, e.g. `"bootstrap deficit (special case)"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BalancedBootstrapSurplus => "balanced bootstrap surplus",
            Self::BootstrapSurplus => "bootstrap surplus",
            Self::BootstrapSurplusSpecialCase => "bootstrap surplus (special case)",
            Self::BootstrapDeficit => "bootstrap deficit",
            Self::BootstrapDeficitSpecialCase => "bootstrap deficit (special case)",
            Self::ArbitrageSurplus => "arbitrage surplus",
            Self::ArbitrageDeficit => "arbitrage deficit",
            Self::DefaultSurplus => "default surplus",
            Self::DefaultDeficit => "default deficit",
        }
    }
}

impl fmt::Display for PrimaryCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Follow-up applied when the external protection wallet tops up a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletAdjustment {
    /// The wallet covers the whole BNT payout; `t` drops to zero.
    ExternalWalletAdjustment1,
    /// The wallet is drained; `t` shrinks by the wallet's BNT value.
    ExternalWalletAdjustment2,
}

impl fmt::Display for WalletAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalWalletAdjustment1 => f.write_str("external wallet adjustment (1)"),
            Self::ExternalWalletAdjustment2 => f.write_str("external wallet adjustment (2)"),
        }
    }
}

/// A fully resolved withdrawal case: primary branch plus optional suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Case {
    primary: PrimaryCase,
    wallet: Option<WalletAdjustment>,
}

impl Case {
    /// A case without a wallet adjustment.
    #[must_use]
    pub const fn primary(primary: PrimaryCase) -> Self {
        Self {
            primary,
            wallet: None,
        }
    }

    /// A case followed by a wallet adjustment.
    #[must_use]
    pub const fn with_wallet(primary: PrimaryCase, wallet: WalletAdjustment) -> Self {
        Self {
            primary,
            wallet: Some(wallet),
        }
    }

    /// Returns the primary branch.
    #[must_use]
    pub const fn primary_case(&self) -> PrimaryCase {
        self.primary
    }

    /// Returns the wallet suffix, if any.
    #[must_use]
    pub const fn wallet_adjustment(&self) -> Option<WalletAdjustment> {
        self.wallet
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wallet {
            Some(wallet) => write!(f, "{} {}", self.primary, wallet),
            None => write!(f, "{}", self.primary),
        }
    }
}
