//! Property-based tests for classification and settlement.
//!
//! 1. **Exhaustive classification**: no reachable state is ambiguous.
//! 2. **Idempotence**: classifying the same snapshot twice agrees.
//! 3. **Payout bound**: TKN paid out never exceeds the amount withdrawn.
//! 4. **Trade invariant**: `a·b` never decreases across a trade leg.
//! 5. **Backend agreement**: the `f64` backend picks the same case.

use proptest::prelude::*;

use crate::domain::{FeeSchedule, PoolState, Ppm, TradingLiquidity};
use crate::error::AmmError;
use crate::math::{ArithmeticBackend, FixedPoint};

use super::TokenomicsEngine;

type FP = FixedPoint;

fn fp(v: u128) -> FP {
    FP::from_u128(v)
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    a: u128,
    b: u128,
    c: u128,
    e: u128,
    n: u32,
    m: u32,
    w: u128,
}

impl Snapshot {
    fn state(&self) -> PoolState<FP> {
        let Ok(s) = PoolState::new(
            fp(self.a),
            fp(self.b),
            fp(self.c),
            fp(self.e),
            Ppm::new(self.n),
            Ppm::new(self.m),
            fp(self.w),
        ) else {
            panic!("valid pool state");
        };
        s
    }
}

// ---------------------------------------------------------------------------
// Custom strategies
// ---------------------------------------------------------------------------

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    (
        1_000u128..=10_000_000u128,
        1_000u128..=10_000_000u128,
        0u128..=10_000_000u128,
        1_000u128..=10_000_000u128,
        0u32..=50_000u32,
        0u32..=50_000u32,
        0u128..=1_000_000u128,
    )
        .prop_map(|(a, b, c, e, n, m, w)| Snapshot { a, b, c, e, n, m, w })
}

/// Withdrawal as a share of the staked balance, in `[0.01%, 100%]`.
fn share_strategy() -> impl Strategy<Value = u128> {
    1u128..=10_000u128
}

fn withdrawal(snapshot: &Snapshot, share: u128) -> u128 {
    (snapshot.e * share / 10_000).max(1)
}

fn fees_strategy() -> impl Strategy<Value = FeeSchedule> {
    (0u32..=100_000u32, 0u32..=1_000_000u32).prop_map(|(fee, vortex)| {
        let Ok(fees) = FeeSchedule::new(Ppm::new(fee), Ppm::new(vortex)) else {
            panic!("valid fees");
        };
        fees
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_classification_is_exhaustive(
        snapshot in snapshot_strategy(),
        share in share_strategy(),
    ) {
        let x = fp(withdrawal(&snapshot, share));
        let result = TokenomicsEngine.classify(&snapshot.state(), &x);
        prop_assert!(
            !matches!(result, Err(AmmError::CaseAmbiguity(_))),
            "ambiguous case for {:?} x={}", snapshot, x
        );
    }

    #[test]
    fn prop_classification_is_idempotent(
        snapshot in snapshot_strategy(),
        share in share_strategy(),
    ) {
        let state = snapshot.state();
        let x = fp(withdrawal(&snapshot, share));
        let first = TokenomicsEngine.classify(&state, &x).map(|c| c.case());
        let second = TokenomicsEngine.classify(&state, &x).map(|c| c.case());
        prop_assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn prop_payout_never_exceeds_withdrawal(
        snapshot in snapshot_strategy(),
        share in share_strategy(),
    ) {
        let x = fp(withdrawal(&snapshot, share));
        let Ok(outcome) = TokenomicsEngine.settle(&snapshot.state(), &x) else {
            return Ok(());
        };
        let Ok(tkn_out) = outcome.tkn_out() else {
            return Ok(());
        };
        prop_assert!(
            tkn_out <= x,
            "{} paid {} TKN for x={}", outcome.case(), tkn_out, x
        );
    }

    #[test]
    fn prop_tkn_to_bnt_keeps_product(
        a in 10_000u128..=10_000_000u128,
        b in 10_000u128..=10_000_000u128,
        amount in 1u128..=1_000_000u128,
        fees in fees_strategy(),
    ) {
        let liquidity = TradingLiquidity::new(fp(a), fp(b));
        let Ok(leg) = TokenomicsEngine.trade_tkn_to_bnt(&liquidity, fees, &fp(amount)) else {
            return Ok(());
        };
        let Ok(before) = fp(a).checked_mul(&fp(b)) else {
            return Ok(());
        };
        let Ok(after) = leg.bnt_trading_liquidity.checked_mul(&leg.tkn_trading_liquidity) else {
            return Ok(());
        };
        prop_assert!(after >= before, "k decreased: {} < {}", after, before);
    }

    #[test]
    fn prop_bnt_to_tkn_keeps_product(
        a in 10_000u128..=10_000_000u128,
        b in 10_000u128..=10_000_000u128,
        amount in 1u128..=1_000_000u128,
        fees in fees_strategy(),
    ) {
        let liquidity = TradingLiquidity::new(fp(a), fp(b));
        let Ok(leg) = TokenomicsEngine.trade_bnt_to_tkn(&liquidity, fees, &fp(amount)) else {
            return Ok(());
        };
        let Ok(before) = fp(a).checked_mul(&fp(b)) else {
            return Ok(());
        };
        let Ok(after) = leg.bnt_trading_liquidity.checked_mul(&leg.tkn_trading_liquidity) else {
            return Ok(());
        };
        prop_assert!(after >= before, "k decreased: {} < {}", after, before);
    }
}

#[cfg(feature = "float")]
mod backend_agreement {
    use super::*;
    use crate::math::FloatingPoint;

    fn fl(v: u128) -> FloatingPoint {
        FloatingPoint::from_u128(v)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Far from the decision boundaries both backends agree.
        #[test]
        fn prop_backends_agree_on_clear_cases(
            a in 100_000u128..=1_000_000u128,
            e in 100_000u128..=1_000_000u128,
            surplus_pct in 10u128..=50u128,
            share in 1u128..=5u128,
        ) {
            let b = e * (100 + surplus_pct) / 100;
            let x = e * share / 1_000;
            let Ok(fixed) = PoolState::new(
                fp(a), fp(b), fp(0), fp(e), Ppm::new(2_500), Ppm::new(3_000), fp(0),
            ) else {
                panic!("valid pool state");
            };
            let Ok(float) = PoolState::new(
                fl(a), fl(b), fl(0), fl(e), Ppm::new(2_500), Ppm::new(3_000), fl(0),
            ) else {
                panic!("valid pool state");
            };
            let fixed_case = TokenomicsEngine.classify(&fixed, &fp(x)).map(|c| c.case());
            let float_case = TokenomicsEngine.classify(&float, &fl(x)).map(|c| c.case());
            prop_assert_eq!(fixed_case.ok(), float_case.ok());
        }
    }
}
