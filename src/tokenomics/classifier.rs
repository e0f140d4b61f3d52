//! Withdrawal case classification.
//!
//! [`CaseClassifier`] is a stateless decision procedure.  Predicates run in
//! a fixed order and the first one that settles the case short-circuits the
//! rest:
//!
//! 1. [`is_balanced`](CaseClassifier::is_balanced): `b + c == e`
//! 2. [`check_surplus`](CaseClassifier::check_surplus): `b + c > e·(1 − n)`
//! 3. [`check_hlim`](CaseClassifier::check_hlim): `c·e/(b + c) > x`
//! 4. [`check_hmax`](CaseClassifier::check_hmax): surplus or deficit closed form `> x`
//! 5. [`check_vault_coverage`](CaseClassifier::check_vault_coverage), only
//!    when a limit failed
//! 6. [`select_case`](CaseClassifier::select_case)
//!
//! The external wallet suffix needs the primary handler's BNT payout and is
//! resolved by the [`TokenomicsEngine`](super::TokenomicsEngine).

use crate::domain::{Case, PoolState, PrimaryCase, WalletAdjustment};
use crate::error::{AmmError, ArithmeticFault};
use crate::math::ArithmeticBackend;

type CheckResult<T> = Result<T, ArithmeticFault>;

/// Result of one withdrawal limit check.
///
/// `limit` is `None` when the closed form is undefined (no holdings) or
/// unbounded (zero denominator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitCheck<B> {
    limit: Option<B>,
    satisfied: bool,
}

impl<B: ArithmeticBackend> LimitCheck<B> {
    const fn undefined() -> Self {
        Self {
            limit: None,
            satisfied: false,
        }
    }

    const fn unbounded() -> Self {
        Self {
            limit: None,
            satisfied: true,
        }
    }

    fn against(limit: B, x: &B) -> Self {
        Self {
            satisfied: limit > *x,
            limit: Some(limit),
        }
    }

    /// The computed limit, if finite and defined.
    #[must_use]
    pub const fn limit(&self) -> Option<B> {
        self.limit
    }

    /// Whether the withdrawal stays strictly below the limit.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.satisfied
    }
}

/// Boolean predicate values feeding [`CaseClassifier::select_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicates {
    /// `b + c > e·(1 − n)`.
    pub surplus: bool,
    /// `a == 0 && b == 0`.
    pub liquidity_empty: bool,
    /// `hlim > x`.
    pub satisfies_hlim: bool,
    /// `hmax > x`.
    pub satisfies_hmax: bool,
    /// `b + c > e`.
    pub exceeds_staked: bool,
    /// Vault coverage, evaluated only when a limit failed.
    pub vault_covers: Option<bool>,
}

/// Everything the classifier learned about a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<B> {
    case: Case,
    surplus: bool,
    hlim: LimitCheck<B>,
    hmax: LimitCheck<B>,
    vault_covers: Option<bool>,
}

impl<B: ArithmeticBackend> Classification<B> {
    /// The selected case.
    #[must_use]
    pub const fn case(&self) -> Case {
        self.case
    }

    /// Whether the pool is in surplus.  Balanced pools count as surplus.
    #[must_use]
    pub const fn is_surplus(&self) -> bool {
        self.surplus
    }

    /// The `hlim` check; `None` for balanced pools.
    #[must_use]
    pub const fn hlim(&self) -> &LimitCheck<B> {
        &self.hlim
    }

    /// The `hmax` check; `None` for balanced pools.
    #[must_use]
    pub const fn hmax(&self) -> &LimitCheck<B> {
        &self.hmax
    }

    /// Vault coverage, present only when a limit failed.
    #[must_use]
    pub const fn vault_covers(&self) -> Option<bool> {
        self.vault_covers
    }

    /// `true` when both limits hold.
    #[must_use]
    pub const fn limits_satisfied(&self) -> bool {
        self.hlim.satisfied && self.hmax.satisfied
    }

    /// Returns a copy carrying the wallet suffix.
    #[must_use]
    pub fn with_wallet(mut self, wallet: WalletAdjustment) -> Self {
        self.case = Case::with_wallet(self.case.primary_case(), wallet);
        self
    }
}

/// Stateless withdrawal classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseClassifier;

impl CaseClassifier {
    /// `b + c == e`.
    ///
    /// # Errors
    ///
    /// Propagates an overflow of `b + c`.
    pub fn is_balanced<B: ArithmeticBackend>(state: &PoolState<B>) -> CheckResult<bool> {
        Ok(state.tkn_holdings()? == state.tkn_staked_balance())
    }

    /// `b + c > e·(1 − n)`, the division-free form of `(b + c)/(1 − n) > e`.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic faults.
    pub fn check_surplus<B: ArithmeticBackend>(state: &PoolState<B>) -> CheckResult<bool> {
        let reference = state
            .tkn_staked_balance()
            .mul_ppm(state.withdrawal_fee().complement())?;
        Ok(state.tkn_holdings()? > reference)
    }

    /// `hlim = c·e/(b + c)`, satisfied when `hlim > x`.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic faults.
    pub fn check_hlim<B: ArithmeticBackend>(
        state: &PoolState<B>,
        x: &B,
    ) -> CheckResult<LimitCheck<B>> {
        let holdings = state.tkn_holdings()?;
        if holdings.is_zero() {
            return Ok(LimitCheck::undefined());
        }
        let hlim = state
            .tkn_vault_surplus()
            .mul_div(&state.tkn_staked_balance(), &holdings)?;
        Ok(LimitCheck::against(hlim, x))
    }

    /// `hmax = b·e·(e·n + f·m) / ((1 − m)·f · g)`.
    ///
    /// Surplus: `f = b + c − e` and `g = f + e·n`.  Deficit:
    /// `f = e·(1 − n) − (b + c)` and `g = e − (b + c)`.  A surplus pool that
    /// does not exceed `e` fails the check; a zero denominator means the
    /// limit is unbounded.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic faults.
    pub fn check_hmax<B: ArithmeticBackend>(
        state: &PoolState<B>,
        x: &B,
        surplus: bool,
    ) -> CheckResult<LimitCheck<B>> {
        let b = state.tkn_trading_liquidity();
        let e = state.tkn_staked_balance();
        let n = state.withdrawal_fee();
        let m = state.trading_fee();
        let holdings = state.tkn_holdings()?;
        let en = e.mul_ppm(n)?;

        let (f, g) = if surplus {
            if holdings <= e {
                return Ok(LimitCheck::undefined());
            }
            let f = holdings.checked_sub(&e)?;
            let g = f.checked_add(&en)?;
            (f, g)
        } else {
            let f = e.mul_ppm(n.complement())?.checked_sub(&holdings)?;
            let g = e.checked_sub(&holdings)?;
            (f, g)
        };

        let numerator = b.checked_mul(&e)?.checked_mul(&en.checked_add(&f.mul_ppm(m)?)?)?;
        let denominator = f.mul_ppm(m.complement())?.checked_mul(&g)?;
        if denominator.is_zero() {
            return Ok(LimitCheck::unbounded());
        }
        Ok(LimitCheck::against(numerator.checked_div(&denominator)?, x))
    }

    /// Whether the vault alone covers the payout, so trading liquidity can
    /// stay as it is.  Surplus: `y ≤ c`; deficit: `y·(b + c)/e ≤ c`.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic faults.
    pub fn check_vault_coverage<B: ArithmeticBackend>(
        state: &PoolState<B>,
        x: &B,
        surplus: bool,
    ) -> CheckResult<bool> {
        let y = x.mul_ppm(state.withdrawal_fee().complement())?;
        let payout = if surplus {
            y
        } else {
            y.mul_div(&state.tkn_holdings()?, &state.tkn_staked_balance())?
        };
        Ok(payout <= state.tkn_vault_surplus())
    }

    /// Maps predicate values to exactly one primary case.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::CaseAmbiguity`] for combinations no case claims.
    pub fn select_case(predicates: Predicates) -> crate::error::Result<PrimaryCase> {
        let limits_ok = predicates.satisfies_hlim && predicates.satisfies_hmax;
        if predicates.liquidity_empty {
            return Ok(if predicates.surplus {
                PrimaryCase::BootstrapSurplusSpecialCase
            } else {
                PrimaryCase::BootstrapDeficitSpecialCase
            });
        }
        match (predicates.surplus, limits_ok, predicates.vault_covers) {
            (true, true, _) if predicates.exceeds_staked => Ok(PrimaryCase::ArbitrageSurplus),
            (true, false, Some(false)) => Ok(PrimaryCase::DefaultSurplus),
            (true, false, Some(true)) => Ok(PrimaryCase::BootstrapSurplus),
            (false, true, _) => Ok(PrimaryCase::ArbitrageDeficit),
            (false, false, Some(false)) => Ok(PrimaryCase::DefaultDeficit),
            (false, false, Some(true)) => Ok(PrimaryCase::BootstrapDeficit),
            (true, true, _) => Err(AmmError::CaseAmbiguity(
                "surplus within limits without exceeding the staked balance",
            )),
            (_, false, None) => Err(AmmError::CaseAmbiguity(
                "limit violated but vault coverage not evaluated",
            )),
        }
    }

    /// Chooses the wallet suffix: adjustment 1 when `a·w ≥ t·b`.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic faults.
    pub fn check_external_wallet<B: ArithmeticBackend>(
        state: &PoolState<B>,
        bnt_to_user: &B,
    ) -> CheckResult<WalletAdjustment> {
        let wallet_value = state
            .bnt_trading_liquidity()
            .checked_mul(&state.external_protection_balance())?;
        let owed = bnt_to_user.checked_mul(&state.tkn_trading_liquidity())?;
        Ok(if wallet_value >= owed {
            WalletAdjustment::ExternalWalletAdjustment1
        } else {
            WalletAdjustment::ExternalWalletAdjustment2
        })
    }

    /// Runs predicates 1–6 and returns the primary classification.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Arithmetic`] if a predicate faults and
    /// [`AmmError::CaseAmbiguity`] if no case applies.
    pub fn classify<B: ArithmeticBackend>(
        state: &PoolState<B>,
        x: &B,
    ) -> crate::error::Result<Classification<B>> {
        if Self::is_balanced(state)? {
            return Ok(Classification {
                case: Case::primary(PrimaryCase::BalancedBootstrapSurplus),
                surplus: true,
                hlim: LimitCheck::undefined(),
                hmax: LimitCheck::undefined(),
                vault_covers: None,
            });
        }

        let surplus = Self::check_surplus(state)?;
        let hlim = Self::check_hlim(state, x)?;
        let hmax = Self::check_hmax(state, x, surplus)?;
        let vault_covers = if hlim.satisfied && hmax.satisfied {
            None
        } else {
            Some(Self::check_vault_coverage(state, x, surplus)?)
        };

        let primary = Self::select_case(Predicates {
            surplus,
            liquidity_empty: state.bnt_trading_liquidity().is_zero()
                && state.tkn_trading_liquidity().is_zero(),
            satisfies_hlim: hlim.satisfied,
            satisfies_hmax: hmax.satisfied,
            exceeds_staked: state.tkn_holdings()? > state.tkn_staked_balance(),
            vault_covers,
        })?;

        Ok(Classification {
            case: Case::primary(primary),
            surplus,
            hlim,
            hmax,
            vault_covers,
        })
    }
}
