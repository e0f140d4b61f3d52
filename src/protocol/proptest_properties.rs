//! Property-based tests for the orchestrator over random request sequences.
//!
//! 1. **Round trip**: staking and redeeming the issued pool tokens never
//!    returns more than was staked.
//! 2. **Ledger mirror**: after every request the latest ledger entries
//!    equal the live balances, and a failed request leaves no trace.
//! 3. **Non-negativity**: no ledger entry of the `f64` backend is negative.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use crate::config::{ProtocolConfig, ShutdownPolicy, TokenConfig};
use crate::domain::{Ppm, Rate, TokenId};
use crate::ledger::LedgerKind;
use crate::math::{ArithmeticBackend, FixedPoint};
use crate::traits::LedgerStore;

use super::Protocol;

type FP = FixedPoint;

fn fp(v: u128) -> FP {
    FP::from_u128(v)
}

fn token(symbol: &str) -> TokenId {
    let Ok(t) = TokenId::new(symbol) else {
        panic!("valid token");
    };
    t
}

/// BNT, LINK and ETH, indexed by the request strategies.
fn tokens() -> [TokenId; 3] {
    [TokenId::bnt(), token("LINK"), token("ETH")]
}

fn protocol<B: ArithmeticBackend>(policy: ShutdownPolicy) -> Protocol<B> {
    let Ok(tkn) = TokenConfig::new(Ppm::new(10_000), Ppm::new(200_000), Rate::ONE) else {
        panic!("valid token config");
    };
    let Ok(cfg) = ProtocolConfig::new(100_000, 5_000)
        .and_then(|c| c.with_token(token("LINK"), tkn))
        .and_then(|c| c.with_token(token("ETH"), tkn))
        .and_then(|c| c.with_bootstrapped(token("LINK")))
        .and_then(|c| c.with_bootstrapped(token("ETH")))
        .and_then(|c| c.with_shutdown_policy(policy))
    else {
        panic!("valid config");
    };
    let Ok(p) = Protocol::new(cfg) else {
        panic!("valid protocol");
    };
    p
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Stake(usize, u128),
    /// Redeems a percentage of the outstanding pool tokens.
    Unstake(usize, u128),
    Trade(usize, usize, u128),
}

fn run<B: ArithmeticBackend>(
    p: &mut Protocol<B>,
    request: Request,
    block: u64,
) -> crate::error::Result<()> {
    let tokens = tokens();
    match request {
        Request::Stake(t, amount) => p.stake(&tokens[t], B::from_u128(amount), block).map(|_| ()),
        Request::Unstake(t, pct) => {
            let supply = if tokens[t].is_bnt() {
                p.bnt_reserve().pool_token_supply()
            } else {
                p.pool(&tokens[t])?.pool_token_supply()
            };
            let amount = supply.mul_div(&B::from_u128(pct), &B::from_u128(100))?;
            p.unstake(&tokens[t], amount, block).map(|_| ())
        }
        Request::Trade(from, to, amount) => p
            .trade(&tokens[from], B::from_u128(amount), &tokens[to], block)
            .map(|_| ()),
    }
}

fn history_lengths<B: ArithmeticBackend>(p: &Protocol<B>) -> Vec<usize> {
    let [bnt, link, eth] = tokens();
    let mut lengths: Vec<usize> = LedgerKind::RESERVE
        .iter()
        .map(|kind| p.ledgers().history(*kind, &bnt).len())
        .collect();
    for t in [link, eth] {
        lengths.extend(
            LedgerKind::POOL
                .iter()
                .map(|kind| p.ledgers().history(*kind, &t).len()),
        );
    }
    lengths
}

fn ledgers_mirror_state(p: &Protocol<FP>) -> Result<(), TestCaseError> {
    let [bnt, link, eth] = tokens();
    for t in [link, eth] {
        let Ok(pool) = p.pool(&t) else {
            return Err(TestCaseError::fail("missing pool"));
        };
        let live = [
            (LedgerKind::Vault, pool.vault()),
            (LedgerKind::Staking, pool.staked()),
            (LedgerKind::PoolTokenSupply, pool.pool_token_supply()),
            (LedgerKind::ExternalProtectionWallet, pool.external_protection()),
            (LedgerKind::BntTradingLiquidity, pool.bnt_trading_liquidity()),
            (LedgerKind::TknTradingLiquidity, pool.tkn_trading_liquidity()),
            (LedgerKind::BntFundingRemaining, pool.funding_remaining()),
            (LedgerKind::BntCompensation, pool.bnt_compensation()),
        ];
        for (kind, value) in live {
            prop_assert_eq!(p.ledgers().latest(kind, &t), Some(value), "{} of {}", kind, t);
        }
    }
    let reserve = p.bnt_reserve();
    let live = [
        (LedgerKind::Vault, reserve.vault()),
        (LedgerKind::Staking, reserve.staked()),
        (LedgerKind::PoolTokenSupply, reserve.pool_token_supply()),
        (LedgerKind::Vortex, reserve.vortex()),
    ];
    for (kind, value) in live {
        prop_assert_eq!(p.ledgers().latest(kind, &bnt), Some(value), "{} of BNT", kind);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Custom strategies
// ---------------------------------------------------------------------------

fn request_strategy() -> impl Strategy<Value = Request> {
    prop_oneof![
        (0usize..3, 1u128..=50_000u128).prop_map(|(t, amount)| Request::Stake(t, amount)),
        (0usize..3, 1u128..=100u128).prop_map(|(t, pct)| Request::Unstake(t, pct)),
        (0usize..3, 0usize..3, 1u128..=5_000u128)
            .prop_map(|(from, to, amount)| Request::Trade(from, to, amount)),
    ]
}

fn requests_strategy() -> impl Strategy<Value = Vec<Request>> {
    prop::collection::vec(request_strategy(), 1..40)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_tkn_round_trip_never_returns_more_than_staked(
        first in 1u128..=200_000u128,
        second in 0u128..=200_000u128,
    ) {
        let link = token("LINK");
        let mut p = protocol::<FP>(ShutdownPolicy::Fail);
        let Ok(issued) = p.stake(&link, fp(first), 1) else {
            return Ok(());
        };
        if second > 0 {
            let Ok(_) = p.stake(&link, fp(second), 2) else {
                return Ok(());
            };
        }
        let Ok((tkn, bnt)) = p.unstake(&link, issued, 3) else {
            return Ok(());
        };
        prop_assert!(tkn <= fp(first), "{} TKN back for {} staked", tkn, first);
        prop_assert_eq!(bnt, FP::zero());
    }

    #[test]
    fn prop_bnt_round_trip_never_returns_more_than_staked(amount in 1u128..=1_000_000u128) {
        let bnt = TokenId::bnt();
        let mut p = protocol::<FP>(ShutdownPolicy::Fail);
        let Ok(issued) = p.stake(&bnt, fp(amount), 1) else {
            return Ok(());
        };
        let Ok((tkn, bnt_out)) = p.unstake(&bnt, issued, 2) else {
            return Ok(());
        };
        prop_assert_eq!(tkn, FP::zero());
        prop_assert!(bnt_out <= fp(amount));
    }

    #[test]
    fn prop_ledgers_mirror_state(requests in requests_strategy()) {
        let mut p = protocol::<FP>(ShutdownPolicy::Fail);
        for (block, request) in (1u64..).zip(requests) {
            let before = p.clone();
            let lengths = history_lengths(&p);
            if run(&mut p, request, block).is_err() {
                prop_assert_eq!(history_lengths(&p), lengths);
                prop_assert_eq!(p.bnt_reserve(), before.bnt_reserve());
                prop_assert_eq!(p.last_block(), before.last_block());
                for t in tokens().iter().filter(|t| !t.is_bnt()) {
                    prop_assert_eq!(p.pool(t).ok(), before.pool(t).ok());
                }
            }
            ledgers_mirror_state(&p)?;
        }
    }
}

#[cfg(feature = "float")]
mod float_backend {
    use super::*;
    use crate::math::FloatingPoint;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_ledgers_stay_non_negative(requests in requests_strategy()) {
            let mut p = protocol::<FloatingPoint>(ShutdownPolicy::WarnOnly);
            for (block, request) in (1u64..).zip(requests) {
                let _ = run(&mut p, request, block);
            }
            let [bnt, link, eth] = tokens();
            let mut ledgers = LedgerKind::RESERVE.map(|kind| (kind, bnt.clone())).to_vec();
            for t in [link, eth] {
                ledgers.extend(LedgerKind::POOL.map(|kind| (kind, t.clone())));
            }
            for (kind, t) in &ledgers {
                for entry in p.ledgers().history(*kind, t) {
                    prop_assert!(
                        entry.value.get() >= 0.0,
                        "{} of {} at block {} is {}", kind, t, entry.block, entry.value
                    );
                }
            }
        }
    }
}
