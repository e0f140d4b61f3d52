//! Stake, unstake and trade against owned pool state.

use std::collections::BTreeMap;

use crate::config::{ProtocolConfig, ShutdownPolicy};
use crate::domain::{
    ExchangeRate, PoolState, Rate, SettledLeg, TokenId, TradeDirection, TradeLeg, TradeOutcome,
    WithdrawalOutcome,
};
use crate::ema::EmaTracker;
use crate::error::AmmError;
use crate::ledger::{InMemoryLedgers, LedgerKind};
use crate::math::ArithmeticBackend;
use crate::tokenomics::{Classification, TokenomicsEngine};
use crate::traits::{EmaProvider, LedgerStore};

use super::state::pool_tokens_for;
use super::{liquidity, BntReserve, TokenPool};

/// Dry-run result of [`Protocol::describe_withdrawal`].
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalPreview<B> {
    /// TKN value of the redeemed pool tokens (`x`).
    pub amount: B,
    /// Case, limits and predicates of the withdrawal.
    pub classification: Classification<B>,
    /// Amounts the withdrawal would settle.
    pub outcome: WithdrawalOutcome<B>,
}

/// State touched by one operation, committed only if every check passes.
#[derive(Debug, Clone)]
struct Candidate<B> {
    pools: Vec<(TokenId, TokenPool<B>)>,
    reserve: Option<BntReserve<B>>,
}

impl<B> Candidate<B> {
    const fn new() -> Self {
        Self {
            pools: Vec::new(),
            reserve: None,
        }
    }

    fn pool(&self, token: &TokenId) -> Option<&TokenPool<B>> {
        self.pools
            .iter()
            .find_map(|(candidate, pool)| (candidate == token).then_some(pool))
    }
}

/// The settlement protocol: sole owner and mutator of pool state.
///
/// Every operation works on copies of the pools and reserve it touches.
/// The copies replace the live state only after the arithmetic succeeded
/// and the pool shutdown check passed; the new balances are then appended
/// to the ledgers at the operation's block.  A failed operation leaves
/// state and ledgers as they were.
///
/// # Type Parameters
///
/// - `B`: arithmetic backend, fixed for the lifetime of the protocol
/// - `L`: ledger store, [`InMemoryLedgers`] by default
/// - `E`: EMA provider, [`EmaTracker`] by default
///
/// # Concurrency
///
/// Operations take `&mut self`.  Callers that serve concurrent requests
/// must serialize them, e.g. behind a `Mutex`, so that no withdrawal is
/// classified against stale trading liquidity.
///
/// # Examples
///
/// ```
/// use bancor_settlement::config::{ProtocolConfig, TokenConfig};
/// use bancor_settlement::domain::{Ppm, Rate, TokenId};
/// use bancor_settlement::math::{ArithmeticBackend, FixedPoint};
/// use bancor_settlement::protocol::Protocol;
///
/// let Ok(link) = TokenId::new("LINK") else { panic!() };
/// let Ok(token) = TokenConfig::new(Ppm::new(10_000), Ppm::new(200_000), Rate::ONE) else {
///     panic!()
/// };
/// let Ok(config) = ProtocolConfig::new(100_000, 5_000)
///     .and_then(|c| c.with_token(link.clone(), token))
///     .and_then(|c| c.with_bootstrapped(link.clone()))
/// else {
///     panic!()
/// };
/// let Ok(mut protocol) = Protocol::<FixedPoint>::new(config) else { panic!() };
///
/// let Ok(minted) = protocol.stake(&link, FixedPoint::from_u128(10_000), 1) else { panic!() };
/// assert_eq!(minted, FixedPoint::from_u128(10_000));
///
/// let Ok(pool) = protocol.pool(&link) else { panic!() };
/// assert!(pool.trading_enabled());
/// assert_eq!(pool.bnt_trading_liquidity(), FixedPoint::from_u128(10_000));
/// ```
#[derive(Debug, Clone)]
pub struct Protocol<B, L = InMemoryLedgers<B>, E = EmaTracker> {
    config: ProtocolConfig,
    engine: TokenomicsEngine,
    pools: BTreeMap<TokenId, TokenPool<B>>,
    reserve: BntReserve<B>,
    ledgers: L,
    ema: E,
    last_block: Option<u64>,
}

impl<B: ArithmeticBackend> Protocol<B, InMemoryLedgers<B>, EmaTracker> {
    /// Creates a protocol with in-memory ledgers and the default EMA.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `config` is invalid.
    pub fn new(config: ProtocolConfig) -> crate::error::Result<Self> {
        let ema = EmaTracker::new(config.ema_alpha(), config.ema_tolerance());
        Self::with_collaborators(config, InMemoryLedgers::new(), ema)
    }
}

impl<B, L, E> Protocol<B, L, E>
where
    B: ArithmeticBackend,
    L: LedgerStore<B>,
    E: EmaProvider,
{
    /// Creates a protocol with caller-supplied ledger store and EMA.
    ///
    /// Every whitelisted token gets an empty pool with the full funding
    /// limit, its EMA is seeded with the configured initial rate, and every
    /// ledger receives a genesis entry at block 0.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `config` is invalid.
    pub fn with_collaborators(
        config: ProtocolConfig,
        mut ledgers: L,
        mut ema: E,
    ) -> crate::error::Result<Self> {
        config.validate()?;

        let reserve = BntReserve::new();
        let funding_limit = B::from_u128(config.funding_limit());
        let mut pools = BTreeMap::new();
        for (token, token_config) in config.tokens() {
            ema.register(token, token_config.initial_rate(), 0);
            pools.insert(token.clone(), TokenPool::new(funding_limit));
        }

        for (token, pool) in &pools {
            record_pool(&mut ledgers, token, pool, 0);
        }
        record_reserve(&mut ledgers, &reserve, 0);

        Ok(Self {
            config,
            engine: TokenomicsEngine,
            pools,
            reserve,
            ledgers,
            ema,
            last_block: None,
        })
    }

    // -- Queries ------------------------------------------------------------

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Balances of a pool token.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::UnsupportedToken`] if `token` has no pool.
    pub fn pool(&self, token: &TokenId) -> crate::error::Result<&TokenPool<B>> {
        self.pools
            .get(token)
            .ok_or_else(|| AmmError::UnsupportedToken(token.clone()))
    }

    /// The classifier's view of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::UnsupportedToken`] if `token` has no pool.
    pub fn pool_state(&self, token: &TokenId) -> crate::error::Result<PoolState<B>> {
        self.state_of(token, self.pool(token)?)
    }

    /// BNT reserve balances.
    #[must_use]
    pub const fn bnt_reserve(&self) -> &BntReserve<B> {
        &self.reserve
    }

    /// The ledger store.
    #[must_use]
    pub const fn ledgers(&self) -> &L {
        &self.ledgers
    }

    /// Current EMA of a pool token's rate.
    #[must_use]
    pub fn ema_rate(&self, token: &TokenId) -> Option<Rate> {
        self.ema.ema(token)
    }

    /// Last block an operation committed at.
    #[must_use]
    pub const fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    /// Trading pools whose BNT trading liquidity is below the minimum
    /// liquidity threshold.
    #[must_use]
    pub fn pools_below_threshold(&self) -> Vec<&TokenId> {
        let threshold = B::from_u128(self.config.min_liquidity_threshold());
        self.pools
            .iter()
            .filter(|(_, pool)| pool.is_below_threshold(&threshold))
            .map(|(token, _)| token)
            .collect()
    }

    /// Classifies and settles a TKN withdrawal without applying it.
    ///
    /// # Errors
    ///
    /// Same as [`unstake`](Self::unstake) for a TKN pool, except that the
    /// shutdown check is not run.
    pub fn describe_withdrawal(
        &self,
        token: &TokenId,
        pool_tokens: B,
    ) -> crate::error::Result<WithdrawalPreview<B>> {
        let pool = self.pool(token)?;
        let amount = withdrawal_value(pool, &pool_tokens)?;
        let state = self.state_of(token, pool)?;
        let classification = self.engine.classify(&state, &amount)?;
        let outcome = self.engine.apply(&classification, &state, &amount)?;
        Ok(WithdrawalPreview {
            amount,
            classification,
            outcome,
        })
    }

    // -- Operations ---------------------------------------------------------

    /// Stakes `amount` of `token` and returns the pool tokens issued.
    ///
    /// For a bootstrapped TKN pool whose spot rate is inside the EMA band,
    /// the stake also exposes trading liquidity: the DAO bootstrap for an
    /// empty pool, or a liquidity expansion for a trading one.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidQuantity`] if `amount` is zero.
    /// - [`AmmError::UnsupportedToken`] if `token` is not whitelisted.
    /// - [`AmmError::Arithmetic`] on any arithmetic fault.
    /// - [`AmmError::PoolShutdown`] under [`ShutdownPolicy::Fail`].
    pub fn stake(&mut self, token: &TokenId, amount: B, block: u64) -> crate::error::Result<B> {
        self.ensure_whitelisted(token)?;
        if amount.is_zero() {
            return Err(AmmError::InvalidQuantity("stake amount must be positive"));
        }
        self.refresh_ema(&[token], block)?;

        let mut reserve = self.reserve;
        let mut candidate = Candidate::new();

        let issued = if token.is_bnt() {
            let issued = reserve.pool_tokens_for(&amount)?;
            reserve.staked = reserve.staked.checked_add(&amount)?;
            reserve.vault = reserve.vault.checked_add(&amount)?;
            reserve.pool_token_supply = reserve.pool_token_supply.checked_add(&issued)?;
            issued
        } else {
            let mut pool = *self.pool(token)?;
            let issued = pool_tokens_for(&amount, &pool.staked, &pool.pool_token_supply)?;
            pool.vault = pool.vault.checked_add(&amount)?;
            pool.staked = pool.staked.checked_add(&amount)?;
            pool.pool_token_supply = pool.pool_token_supply.checked_add(&issued)?;
            self.expose_liquidity(token, &mut pool, &mut reserve, block)?;
            candidate.pools.push((token.clone(), pool));
            issued
        };
        candidate.reserve = Some(reserve);

        tracing::debug!(token = %token, amount = %amount, issued = %issued, block, "stake");
        self.commit(candidate, block)?;
        Ok(issued)
    }

    /// Redeems `pool_tokens` of `token` and returns `(tkn_out, bnt_out)`.
    ///
    /// BNT redemptions are paid at the staking rate less the exit fee.  TKN
    /// redemptions are classified and settled by the [`TokenomicsEngine`];
    /// the external wallet covers what the vault cannot, and any remaining
    /// BNT compensation is minted and booked against the pool.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidQuantity`] if `pool_tokens` is zero or exceeds
    ///   the outstanding supply.
    /// - [`AmmError::UnsupportedToken`] if `token` is not whitelisted.
    /// - [`AmmError::Settlement`] if a case handler faults.
    /// - [`AmmError::PoolShutdown`] under [`ShutdownPolicy::Fail`].
    pub fn unstake(
        &mut self,
        token: &TokenId,
        pool_tokens: B,
        block: u64,
    ) -> crate::error::Result<(B, B)> {
        self.ensure_whitelisted(token)?;
        if pool_tokens.is_zero() {
            return Err(AmmError::InvalidQuantity("pool token amount must be positive"));
        }
        self.refresh_ema(&[token], block)?;

        if token.is_bnt() {
            return self.unstake_bnt(pool_tokens, block);
        }

        let mut pool = *self.pool(token)?;
        let x = withdrawal_value(&pool, &pool_tokens)?;
        let state = self.state_of(token, &pool)?;
        let outcome = self.engine.settle(&state, &x)?;
        let amounts = outcome.amounts();

        let mut reserve = self.reserve;
        pool.staked = pool.staked.checked_sub(&x)?;
        pool.vault = pool.vault.checked_sub(&amounts.tkn_from_vault)?;
        pool.external_protection = pool
            .external_protection
            .checked_sub(&amounts.tkn_from_wallet)?;
        pool.pool_token_supply = pool.pool_token_supply.checked_sub(&pool_tokens)?;

        let bnt_before = pool.bnt_trading_liquidity;
        pool.bnt_trading_liquidity = outcome.bnt_delta().apply_to(&bnt_before)?;
        pool.tkn_trading_liquidity = outcome
            .tkn_delta()
            .apply_to(&pool.tkn_trading_liquidity)?;
        reserve.vault = outcome.bnt_delta().apply_to(&reserve.vault)?;
        reserve.staked = reserve.staked.checked_sub(&amounts.bnt_burned)?;

        let tkn_out = outcome.tkn_out()?;
        let bnt_out = outcome.bnt_out();
        pool.bnt_compensation = pool.bnt_compensation.checked_add(&bnt_out)?;
        tracing::debug!(
            token = %token,
            block,
            case = %outcome.case(),
            x = %x,
            tkn_out = %tkn_out,
            bnt_out = %bnt_out,
            "unstake"
        );

        let mut candidate = Candidate::new();
        candidate.pools.push((token.clone(), pool));
        candidate.reserve = Some(reserve);
        self.commit(candidate, block)?;
        Ok((tkn_out, bnt_out))
    }

    /// Swaps `amount_in` of `token_in` for `token_out`, writing trading
    /// liquidity only inside the EMA band.
    ///
    /// # Errors
    ///
    /// See [`trade_with`](Self::trade_with).
    pub fn trade(
        &mut self,
        token_in: &TokenId,
        amount_in: B,
        token_out: &TokenId,
        block: u64,
    ) -> crate::error::Result<TradeOutcome<B>> {
        self.trade_with(token_in, amount_in, token_out, block, false)
    }

    /// Swaps `amount_in` of `token_in` for `token_out`.
    ///
    /// With `force` set, trading liquidity is written even when a pool's
    /// spot rate is outside the EMA band.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidToken`] if both tokens are the same.
    /// - [`AmmError::InvalidQuantity`] if `amount_in` is zero.
    /// - [`AmmError::UnsupportedToken`] if either token is not whitelisted.
    /// - [`AmmError::InsufficientLiquidity`] if a pool is not trading.
    /// - [`AmmError::Arithmetic`] on any arithmetic fault.
    /// - [`AmmError::PoolShutdown`] under [`ShutdownPolicy::Fail`].
    pub fn trade_with(
        &mut self,
        token_in: &TokenId,
        amount_in: B,
        token_out: &TokenId,
        block: u64,
        force: bool,
    ) -> crate::error::Result<TradeOutcome<B>> {
        if token_in == token_out {
            return Err(AmmError::InvalidToken("source and target token are the same"));
        }
        self.ensure_whitelisted(token_in)?;
        self.ensure_whitelisted(token_out)?;
        if amount_in.is_zero() {
            return Err(AmmError::InvalidQuantity("trade amount must be positive"));
        }
        self.refresh_ema(&[token_in, token_out], block)?;

        let mut reserve = self.reserve;
        let mut candidate = Candidate::new();
        let mut legs = Vec::with_capacity(2);

        if token_out.is_bnt() {
            let mut pool = self.trading_pool(token_in)?;
            let fees = self.config.token(token_in)?.fees();
            let leg = self
                .engine
                .trade_tkn_to_bnt(&pool.liquidity(), fees, &amount_in)?;
            pool.vault = pool.vault.checked_add(&amount_in)?;
            reserve.vault = reserve.vault.checked_sub(&leg.amount_out)?;
            accrue_bnt_fees(&mut reserve, &leg)?;
            legs.push(self.settle_leg(token_in, &mut pool, leg, force, block)?);
            candidate.pools.push((token_in.clone(), pool));
        } else if token_in.is_bnt() {
            let mut pool = self.trading_pool(token_out)?;
            let fees = self.config.token(token_out)?.fees();
            let leg = self
                .engine
                .trade_bnt_to_tkn(&pool.liquidity(), fees, &amount_in)?;
            reserve.vault = reserve.vault.checked_add(&amount_in)?;
            reserve.vortex = reserve.vortex.checked_add(&leg.vortex_fee)?;
            pool.vault = pool.vault.checked_sub(&leg.amount_out)?;
            pool.staked = pool.staked.checked_add(&leg.lp_fee)?;
            legs.push(self.settle_leg(token_out, &mut pool, leg, force, block)?);
            candidate.pools.push((token_out.clone(), pool));
        } else {
            let mut source = self.trading_pool(token_in)?;
            let mut target = self.trading_pool(token_out)?;
            let (first, second) = self.engine.trade_tkn_to_tkn(
                &source.liquidity(),
                self.config.token(token_in)?.fees(),
                &target.liquidity(),
                self.config.token(token_out)?.fees(),
                &amount_in,
            )?;
            source.vault = source.vault.checked_add(&amount_in)?;
            accrue_bnt_fees(&mut reserve, &first)?;
            reserve.vortex = reserve.vortex.checked_add(&second.vortex_fee)?;
            target.vault = target.vault.checked_sub(&second.amount_out)?;
            target.staked = target.staked.checked_add(&second.lp_fee)?;
            legs.push(self.settle_leg(token_in, &mut source, first, force, block)?);
            legs.push(self.settle_leg(token_out, &mut target, second, force, block)?);
            candidate.pools.push((token_in.clone(), source));
            candidate.pools.push((token_out.clone(), target));
        }
        candidate.reserve = Some(reserve);

        let amount_out = legs
            .last()
            .map_or_else(B::zero, |settled| settled.leg.amount_out);
        let outcome = TradeOutcome { amount_out, legs };
        tracing::debug!(
            token_in = %token_in,
            token_out = %token_out,
            amount_in = %amount_in,
            amount_out = %outcome.amount_out,
            fee = %outcome.trading_fee(),
            block,
            "trade"
        );

        self.commit(candidate, block)?;
        Ok(outcome)
    }

    /// Credits `amount` TKN to a pool's external protection wallet.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidToken`] for BNT, which has no wallet.
    /// - [`AmmError::UnsupportedToken`] if `token` is not whitelisted.
    /// - [`AmmError::InvalidQuantity`] if `amount` is zero.
    pub fn fund_external_protection(
        &mut self,
        token: &TokenId,
        amount: B,
        block: u64,
    ) -> crate::error::Result<B> {
        if token.is_bnt() {
            return Err(AmmError::InvalidToken("BNT has no external protection wallet"));
        }
        self.ensure_whitelisted(token)?;
        if amount.is_zero() {
            return Err(AmmError::InvalidQuantity("funding amount must be positive"));
        }

        let mut pool = *self.pool(token)?;
        pool.external_protection = pool.external_protection.checked_add(&amount)?;
        let balance = pool.external_protection;

        let mut candidate = Candidate::new();
        candidate.pools.push((token.clone(), pool));
        self.commit(candidate, block)?;
        Ok(balance)
    }

    // -- Internals ----------------------------------------------------------

    fn unstake_bnt(&mut self, pool_tokens: B, block: u64) -> crate::error::Result<(B, B)> {
        let mut reserve = self.reserve;
        if pool_tokens > reserve.pool_token_supply {
            return Err(AmmError::InvalidQuantity("pool tokens exceed the outstanding supply"));
        }
        let rate = ExchangeRate::new(reserve.staked, reserve.pool_token_supply)?;
        let (tkn_out, bnt_out) =
            self.engine
                .unstake_bnt(&pool_tokens, &rate, self.config.exit_fee())?;

        reserve.staked = reserve.staked.checked_sub(&bnt_out)?;
        reserve.vault = reserve.vault.checked_sub(&bnt_out)?;
        reserve.pool_token_supply = reserve.pool_token_supply.checked_sub(&pool_tokens)?;
        tracing::debug!(pool_tokens = %pool_tokens, bnt_out = %bnt_out, block, "unstake BNT");

        let mut candidate = Candidate::new();
        candidate.reserve = Some(reserve);
        self.commit(candidate, block)?;
        Ok((tkn_out, bnt_out))
    }

    /// DAO bootstrap or liquidity expansion after a TKN stake.
    fn expose_liquidity(
        &mut self,
        token: &TokenId,
        pool: &mut TokenPool<B>,
        reserve: &mut BntReserve<B>,
        block: u64,
    ) -> crate::error::Result<()> {
        if !self.config.is_bootstrapped(token) {
            tracing::debug!(token = %token, "pool not bootstrapped; liquidity stays in the vault");
            return Ok(());
        }
        let (rate, within_tolerance) = self.observe_spot(token, pool, block)?;
        if !within_tolerance {
            tracing::warn!(
                token = %token,
                spot = %rate,
                "spot rate outside EMA tolerance; liquidity not exposed"
            );
            return Ok(());
        }

        if pool.trading_enabled && !pool.liquidity().is_empty() {
            let surplus = self.vault_surplus(token, pool);
            let Some(growth) = liquidity::expansion(pool, &surplus, rate)? else {
                return Ok(());
            };
            pool.draw_funding(&growth.bnt())?;
            reserve.mint_protocol_liquidity(&growth.bnt())?;
            pool.bnt_trading_liquidity = pool.bnt_trading_liquidity.checked_add(&growth.bnt())?;
            pool.tkn_trading_liquidity = pool.tkn_trading_liquidity.checked_add(&growth.tkn())?;
            tracing::debug!(
                token = %token,
                bnt = %growth.bnt(),
                tkn = %growth.tkn(),
                "trading liquidity expanded"
            );
            return Ok(());
        }

        let threshold = B::from_u128(self.config.min_liquidity_threshold());
        let target = liquidity::bootstrap_seed(&threshold)?;
        let Some(seed) = liquidity::bootstrap(pool, rate, &target)? else {
            return Ok(());
        };
        pool.draw_funding(&seed.bnt())?;
        reserve.mint_protocol_liquidity(&seed.bnt())?;
        pool.set_liquidity(seed);
        pool.trading_enabled = true;
        tracing::info!(
            token = %token,
            bnt = %seed.bnt(),
            tkn = %seed.tkn(),
            rate = %rate,
            "pool bootstrapped"
        );
        Ok(())
    }

    /// Writes a leg's post-trade liquidity if the pool's current spot rate
    /// is inside the band.
    ///
    /// `pool` still holds the pre-trade liquidity.  The BNT LP fee of a
    /// TKN → BNT leg is charged against the pool's funding limit only when
    /// the liquidity is written.
    fn settle_leg(
        &mut self,
        token: &TokenId,
        pool: &mut TokenPool<B>,
        leg: TradeLeg<B>,
        force: bool,
        block: u64,
    ) -> crate::error::Result<SettledLeg<B>> {
        let (spot, within_tolerance) = self.observe_spot(token, pool, block)?;
        let liquidity_updated = force || within_tolerance;
        if liquidity_updated {
            pool.bnt_trading_liquidity = leg.bnt_trading_liquidity;
            pool.tkn_trading_liquidity = leg.tkn_trading_liquidity;
            if leg.direction == TradeDirection::TknToBnt {
                pool.funding_remaining = pool.funding_remaining.saturating_sub(&leg.lp_fee);
            }
        } else {
            tracing::warn!(
                token = %token,
                spot = %spot,
                "spot rate outside EMA tolerance; trading liquidity not updated"
            );
        }
        Ok(SettledLeg {
            pool: token.clone(),
            leg,
            liquidity_updated,
        })
    }

    /// Feeds the current spot rate of every touched pool token to the EMA.
    ///
    /// The provider moves each token's average at most once per block.
    fn refresh_ema(&mut self, tokens: &[&TokenId], block: u64) -> crate::error::Result<()> {
        for token in tokens.iter().filter(|t| !t.is_bnt()) {
            let spot = self.spot_rate(token, self.pool(token)?)?;
            self.ema.update(token, spot, block)?;
        }
        Ok(())
    }

    /// Feeds the pool's current spot rate to the EMA and checks it against
    /// the tolerance band.
    fn observe_spot(
        &mut self,
        token: &TokenId,
        pool: &TokenPool<B>,
        block: u64,
    ) -> crate::error::Result<(Rate, bool)> {
        let spot = self.spot_rate(token, pool)?;
        self.ema.update(token, spot, block)?;
        Ok((spot, self.ema.is_within_tolerance(token)))
    }

    /// `a / b`, or the configured initial rate while the pool is empty.
    fn spot_rate(&self, token: &TokenId, pool: &TokenPool<B>) -> crate::error::Result<Rate> {
        if pool.liquidity().is_empty() {
            return Ok(self.config.token(token)?.initial_rate());
        }
        Ok(B::rate_of(
            &pool.bnt_trading_liquidity,
            &pool.tkn_trading_liquidity,
        )?)
    }

    fn vault_surplus(&self, token: &TokenId, pool: &TokenPool<B>) -> B {
        let (surplus, clamped) = pool.vault_surplus();
        if clamped {
            tracing::warn!(
                token = %token,
                vault = %pool.vault,
                tkn_trading_liquidity = %pool.tkn_trading_liquidity,
                "vault below TKN trading liquidity; surplus floored at zero"
            );
        }
        surplus
    }

    fn state_of(&self, token: &TokenId, pool: &TokenPool<B>) -> crate::error::Result<PoolState<B>> {
        let token_config = self.config.token(token)?;
        PoolState::new(
            pool.bnt_trading_liquidity,
            pool.tkn_trading_liquidity,
            self.vault_surplus(token, pool),
            pool.staked,
            self.config.exit_fee(),
            token_config.fees().pool_fee(),
            pool.external_protection,
        )
    }

    fn trading_pool(&self, token: &TokenId) -> crate::error::Result<TokenPool<B>> {
        let pool = *self.pool(token)?;
        if !pool.trading_enabled || pool.liquidity().is_empty() {
            return Err(AmmError::InsufficientLiquidity("pool is not trading"));
        }
        Ok(pool)
    }

    fn ensure_whitelisted(&self, token: &TokenId) -> crate::error::Result<()> {
        if self.config.is_whitelisted(token) {
            Ok(())
        } else {
            Err(AmmError::UnsupportedToken(token.clone()))
        }
    }

    /// Runs the shutdown check over every pool, candidates overlaid, then
    /// swaps the candidate in and records it.
    fn commit(&mut self, candidate: Candidate<B>, block: u64) -> crate::error::Result<()> {
        let threshold = B::from_u128(self.config.min_liquidity_threshold());
        for (token, live) in &self.pools {
            let pool = candidate.pool(token).unwrap_or(live);
            if !pool.is_below_threshold(&threshold) {
                continue;
            }
            match self.config.shutdown_policy() {
                ShutdownPolicy::Fail => {
                    return Err(AmmError::PoolShutdown {
                        token: token.clone(),
                        liquidity: pool.bnt_trading_liquidity.to_string(),
                        threshold: threshold.to_string(),
                    });
                }
                ShutdownPolicy::WarnOnly => tracing::warn!(
                    token = %token,
                    liquidity = %pool.bnt_trading_liquidity,
                    threshold = %threshold,
                    "pool shutdown triggered; continuing"
                ),
            }
        }

        for (token, pool) in candidate.pools {
            record_pool(&mut self.ledgers, &token, &pool, block);
            self.pools.insert(token, pool);
        }
        if let Some(reserve) = candidate.reserve {
            record_reserve(&mut self.ledgers, &reserve, block);
            self.reserve = reserve;
        }
        self.last_block = Some(block);
        Ok(())
    }
}

/// TKN value of `pool_tokens`: `pool_tokens · staked / supply`.
fn withdrawal_value<B: ArithmeticBackend>(
    pool: &TokenPool<B>,
    pool_tokens: &B,
) -> crate::error::Result<B> {
    if pool.pool_token_supply.is_zero() || *pool_tokens > pool.pool_token_supply {
        return Err(AmmError::InvalidQuantity("pool tokens exceed the outstanding supply"));
    }
    Ok(pool_tokens.mul_div(&pool.staked, &pool.pool_token_supply)?)
}

/// Books the BNT-side fees of a TKN → BNT leg.
fn accrue_bnt_fees<B: ArithmeticBackend>(
    reserve: &mut BntReserve<B>,
    leg: &TradeLeg<B>,
) -> crate::error::Result<()> {
    reserve.staked = reserve.staked.checked_add(&leg.lp_fee)?;
    reserve.vortex = reserve.vortex.checked_add(&leg.vortex_fee)?;
    Ok(())
}

fn record_pool<B: ArithmeticBackend, L: LedgerStore<B>>(
    ledgers: &mut L,
    token: &TokenId,
    pool: &TokenPool<B>,
    block: u64,
) {
    for kind in LedgerKind::POOL {
        let value = match kind {
            LedgerKind::Vault => pool.vault,
            LedgerKind::Staking => pool.staked,
            LedgerKind::PoolTokenSupply => pool.pool_token_supply,
            LedgerKind::ExternalProtectionWallet => pool.external_protection,
            LedgerKind::BntTradingLiquidity => pool.bnt_trading_liquidity,
            LedgerKind::TknTradingLiquidity => pool.tkn_trading_liquidity,
            LedgerKind::BntFundingRemaining => pool.funding_remaining,
            LedgerKind::BntCompensation => pool.bnt_compensation,
            LedgerKind::Vortex => continue,
        };
        ledgers.append(kind, token, block, value);
    }
}

fn record_reserve<B: ArithmeticBackend, L: LedgerStore<B>>(
    ledgers: &mut L,
    reserve: &BntReserve<B>,
    block: u64,
) {
    let bnt = TokenId::bnt();
    for kind in LedgerKind::RESERVE {
        let value = match kind {
            LedgerKind::Vault => reserve.vault,
            LedgerKind::Staking => reserve.staked,
            LedgerKind::PoolTokenSupply => reserve.pool_token_supply,
            LedgerKind::Vortex => reserve.vortex,
            LedgerKind::ExternalProtectionWallet
            | LedgerKind::BntTradingLiquidity
            | LedgerKind::TknTradingLiquidity
            | LedgerKind::BntFundingRemaining
            | LedgerKind::BntCompensation => continue,
        };
        ledgers.append(kind, &bnt, block, value);
    }
}
