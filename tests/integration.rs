//! Integration tests exercising the full system from config to settlement.
//!
//! These tests drive the public API with 18-decimal amounts: bootstrap a
//! pool, trade against it, then withdraw under both shutdown policies.

#![allow(clippy::panic)]

use bancor_settlement::config::{ProtocolConfig, ShutdownPolicy, TokenConfig};
use bancor_settlement::domain::{LiquidityDelta, PrimaryCase, Ppm, Rate, TokenId, TradeOutcome};
use bancor_settlement::error::AmmError;
use bancor_settlement::ledger::LedgerKind;
use bancor_settlement::math::{ArithmeticBackend, FixedPoint};
use bancor_settlement::protocol::Protocol;
use bancor_settlement::traits::LedgerStore;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

const E18: u128 = 1_000_000_000_000_000_000;

fn fp(v: u128) -> FixedPoint {
    FixedPoint::from_u128(v)
}

fn link() -> TokenId {
    let Ok(t) = TokenId::new("LINK") else {
        panic!("valid token");
    };
    t
}

fn config(policy: ShutdownPolicy) -> ProtocolConfig {
    let Ok(token) = TokenConfig::new(Ppm::new(10_000), Ppm::new(200_000), Rate::ONE) else {
        panic!("valid token config");
    };
    let Ok(cfg) = ProtocolConfig::new(100_000 * E18, 1_000 * E18)
        .and_then(|c| c.with_token(link(), token))
        .and_then(|c| c.with_bootstrapped(link()))
        .and_then(|c| c.with_shutdown_policy(policy))
    else {
        panic!("valid config");
    };
    cfg
}

/// Stake 10_000 LINK at block 1, then sell 100 LINK for BNT at block 2.
fn staked_and_traded<B: ArithmeticBackend>(
    policy: ShutdownPolicy,
) -> (Protocol<B>, TradeOutcome<B>) {
    let Ok(mut p) = Protocol::<B>::new(config(policy)) else {
        panic!("valid protocol");
    };
    let Ok(_) = p.stake(&link(), B::from_u128(10_000 * E18), 1) else {
        panic!("stake failed");
    };
    let Ok(trade) = p.trade(&link(), B::from_u128(100 * E18), &TokenId::bnt(), 2) else {
        panic!("trade failed");
    };
    (p, trade)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn bootstrap_seeds_twice_the_threshold() {
    let Ok(mut p) = Protocol::<FixedPoint>::new(config(ShutdownPolicy::Fail)) else {
        panic!("valid protocol");
    };
    let Ok(issued) = p.stake(&link(), fp(10_000 * E18), 1) else {
        panic!("stake failed");
    };
    assert_eq!(issued, fp(10_000 * E18));

    let Ok(pool) = p.pool(&link()) else {
        panic!("expected pool");
    };
    assert!(pool.trading_enabled());
    assert_eq!(pool.bnt_trading_liquidity(), fp(2_000 * E18));
    assert_eq!(pool.tkn_trading_liquidity(), fp(2_000 * E18));
    assert_eq!(pool.funding_remaining(), fp(98_000 * E18));
    assert_eq!(p.bnt_reserve().pool_token_supply(), fp(2_000 * E18));
}

#[test]
fn trade_settles_against_trading_liquidity() {
    let (p, trade) = staked_and_traded::<FixedPoint>(ShutdownPolicy::Fail);

    assert_eq!(trade.amount_out, fp(94_285_714_285_714_285_715));
    assert_eq!(trade.trading_fee(), fp(952_380_952_380_952_380));
    assert_eq!(trade.vortex_fee().ok(), Some(fp(190_476_190_476_190_476)));
    assert_eq!(trade.legs.len(), 1);
    assert_eq!(trade.legs[0].leg.lp_fee, fp(761_904_761_904_761_904));
    assert!(trade.legs[0].liquidity_updated);

    let Ok(pool) = p.pool(&link()) else {
        panic!("expected pool");
    };
    assert_eq!(pool.bnt_trading_liquidity(), fp(1_905_523_809_523_809_523_809));
    assert_eq!(pool.tkn_trading_liquidity(), fp(2_100 * E18));
    assert_eq!(pool.vault(), fp(10_100 * E18));
    assert_eq!(pool.funding_remaining(), fp(97_999_238_095_238_095_238_096));

    let reserve = p.bnt_reserve();
    assert_eq!(reserve.vault(), fp(1_905_714_285_714_285_714_285));
    assert_eq!(reserve.staked(), fp(2_000_761_904_761_904_761_904));
    assert_eq!(reserve.vortex(), fp(190_476_190_476_190_476));

    let bnt_tl = p
        .ledgers()
        .history(LedgerKind::BntTradingLiquidity, &link());
    let blocks: Vec<u64> = bnt_tl.iter().map(|entry| entry.block).collect();
    assert_eq!(blocks, vec![0, 1, 2]);
}

#[test]
fn partial_withdrawal_arbitrages() {
    let (mut p, _) = staked_and_traded::<FixedPoint>(ShutdownPolicy::Fail);

    let Ok(preview) = p.describe_withdrawal(&link(), fp(1_000 * E18)) else {
        panic!("expected preview");
    };
    assert_eq!(
        preview.classification.case().primary_case(),
        PrimaryCase::ArbitrageSurplus
    );
    assert_eq!(
        preview.outcome.bnt_delta(),
        LiquidityDelta::Decrease(fp(11_163_196_469_782_658_314))
    );
    assert_eq!(
        preview.outcome.tkn_delta(),
        LiquidityDelta::Increase(fp(12_500_000_000_000_000_000))
    );

    let Ok((tkn, bnt)) = p.unstake(&link(), fp(1_000 * E18), 3) else {
        panic!("unstake failed");
    };
    assert_eq!(tkn, fp(997_500_000_000_000_000_000));
    assert_eq!(bnt, FixedPoint::zero());

    let Ok(pool) = p.pool(&link()) else {
        panic!("expected pool");
    };
    assert_eq!(pool.bnt_trading_liquidity(), fp(1_894_360_613_054_026_865_495));
    assert_eq!(pool.tkn_trading_liquidity(), fp(2_112_500_000_000_000_000_000));
    assert_eq!(pool.vault(), fp(9_102_500_000_000_000_000_000));
    assert_eq!(pool.staked(), fp(9_000 * E18));
    assert_eq!(pool.pool_token_supply(), fp(9_000 * E18));
    assert_eq!(p.bnt_reserve().vault(), fp(1_894_551_089_244_503_055_971));
    assert_eq!(p.last_block(), Some(3));
}

#[test]
fn full_withdrawal_trips_shutdown() {
    let (mut p, _) = staked_and_traded::<FixedPoint>(ShutdownPolicy::Fail);
    let reserve_before = *p.bnt_reserve();

    let result = p.unstake(&link(), fp(10_000 * E18), 3);
    let Err(AmmError::PoolShutdown {
        token,
        liquidity,
        threshold,
    }) = result
    else {
        panic!("expected shutdown");
    };
    assert_eq!(token, link());
    assert_eq!(liquidity, "113424036281179138322");
    assert_eq!(threshold, "1000000000000000000000");

    let Ok(pool) = p.pool(&link()) else {
        panic!("expected pool");
    };
    assert_eq!(pool.staked(), fp(10_000 * E18));
    assert_eq!(*p.bnt_reserve(), reserve_before);
    assert_eq!(p.last_block(), Some(2));
}

#[test]
fn full_withdrawal_under_warn_only() {
    let (mut p, _) = staked_and_traded::<FixedPoint>(ShutdownPolicy::WarnOnly);

    let Ok(preview) = p.describe_withdrawal(&link(), fp(10_000 * E18)) else {
        panic!("expected preview");
    };
    assert_eq!(
        preview.classification.case().primary_case(),
        PrimaryCase::DefaultSurplus
    );

    let Ok((tkn, bnt)) = p.unstake(&link(), fp(10_000 * E18), 3) else {
        panic!("unstake failed");
    };
    assert_eq!(tkn, fp(9_975 * E18));
    assert_eq!(bnt, FixedPoint::zero());

    let Ok(pool) = p.pool(&link()) else {
        panic!("expected pool");
    };
    assert_eq!(pool.bnt_trading_liquidity(), fp(113_424_036_281_179_138_322));
    assert_eq!(pool.tkn_trading_liquidity(), fp(125 * E18));
    assert_eq!(pool.vault(), fp(125 * E18));
    assert_eq!(pool.staked(), FixedPoint::zero());

    let reserve = p.bnt_reserve();
    assert_eq!(reserve.vault(), fp(113_614_512_471_655_328_798));
    assert_eq!(reserve.staked(), fp(208_662_131_519_274_376_417));
    assert_eq!(
        p.ledgers().latest(LedgerKind::Staking, &TokenId::bnt()),
        Some(fp(208_662_131_519_274_376_417))
    );
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[cfg(feature = "float")]
#[test]
fn float_backend_tracks_fixed_point() {
    use bancor_settlement::math::FloatingPoint;

    let (fixed, _) = staked_and_traded::<FixedPoint>(ShutdownPolicy::Fail);
    let (float, trade) = staked_and_traded::<FloatingPoint>(ShutdownPolicy::Fail);
    let exact_out = 94_285_714_285_714_285_715_f64;
    assert!(((trade.amount_out.get() - exact_out) / exact_out).abs() < 1e-9);

    let (Ok(fixed_pool), Ok(float_pool)) = (fixed.pool(&link()), float.pool(&link())) else {
        panic!("expected pools");
    };
    let exact = 1_905_523_809_523_809_523_809_f64;
    let approx = float_pool.bnt_trading_liquidity().get();
    assert!(((approx - exact) / exact).abs() < 1e-9);
    assert_eq!(fixed_pool.tkn_trading_liquidity(), fp(2_100 * E18));
    assert!((float_pool.tkn_trading_liquidity().get() - 2.1e21).abs() / 2.1e21 < 1e-12);

    let Ok(preview) = float.describe_withdrawal(&link(), FloatingPoint::from_u128(1_000 * E18))
    else {
        panic!("expected preview");
    };
    assert_eq!(
        preview.classification.case().primary_case(),
        PrimaryCase::ArbitrageSurplus
    );
}
