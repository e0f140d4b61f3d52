//! When and by how much staked TKN becomes trading liquidity.

use crate::domain::{Rate, TradingLiquidity};
use crate::error::ArithmeticFault;
use crate::math::ArithmeticBackend;

use super::TokenPool;

/// Multiple of the minimum liquidity threshold seeded by the DAO bootstrap.
pub(crate) const BOOTSTRAP_BUFFER_FACTOR: u128 = 2;

/// BNT the DAO bootstrap seeds for a given minimum liquidity threshold.
pub(crate) fn bootstrap_seed<B: ArithmeticBackend>(threshold: &B) -> Result<B, ArithmeticFault> {
    threshold.checked_mul(&B::from_u128(BOOTSTRAP_BUFFER_FACTOR))
}

/// Liquidity the DAO bootstrap would seed into an empty pool.
///
/// Seeds `seed` BNT against `seed / rate` TKN once the vault is worth at
/// least `seed` BNT and the pool's funding limit still covers it.
pub(crate) fn bootstrap<B: ArithmeticBackend>(
    pool: &TokenPool<B>,
    rate: Rate,
    seed: &B,
) -> Result<Option<TradingLiquidity<B>>, ArithmeticFault> {
    if pool.funding_remaining() < *seed {
        return Ok(None);
    }
    let vault_value = pool.vault().mul_rate(rate)?;
    if vault_value < *seed {
        return Ok(None);
    }
    let tkn = seed.div_rate(rate)?;
    Ok(Some(TradingLiquidity::new(*seed, tkn)))
}

/// Growth of an already trading pool, capped by the vault surplus and the
/// pool's remaining BNT funding.
///
/// 1. Surplus covers a doubling and funding covers `a`: both sides double.
/// 2. Funding is short of `a` but surplus covers the funding: grow by the
///    remaining funding.
/// 3. Otherwise, when funding covers the surplus: grow by the surplus.
pub(crate) fn expansion<B: ArithmeticBackend>(
    pool: &TokenPool<B>,
    surplus: &B,
    rate: Rate,
) -> Result<Option<TradingLiquidity<B>>, ArithmeticFault> {
    let a = pool.bnt_trading_liquidity();
    let b = pool.tkn_trading_liquidity();
    let funding = pool.funding_remaining();
    let surplus_value = surplus.mul_rate(rate)?;

    let growth = if *surplus >= b && a <= funding {
        TradingLiquidity::new(a, b)
    } else if a > funding && (*surplus >= b || surplus_value >= funding) {
        TradingLiquidity::new(funding, funding.div_rate(rate)?)
    } else if surplus_value <= funding {
        TradingLiquidity::new(surplus_value, *surplus)
    } else {
        return Ok(None);
    };

    Ok((!growth.is_empty()).then_some(growth))
}
