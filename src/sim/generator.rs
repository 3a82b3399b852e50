//! The synthetic market generator: one explicit state object advancing the
//! book one tick at a time.

use super::agents::{Agent, BookView, Intent, MarketMaker, MeanReversion, Momentum, Noise};
use super::intraday::IntradayCurve;
use super::midprice::MidPriceProcess;
use super::regime::{Regime, RegimeMachine};
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::orderbook::{L3Event, OrderBook, OrderId, Side, Trade};
use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, LogNormal, Poisson};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Cumulative generator counters, exposed for profiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorStats {
    /// Simulation ticks completed.
    pub ticks: u64,
    /// L3 events emitted.
    pub events: u64,
    /// Executions emitted.
    pub trades: u64,
    /// Total executed quantity.
    pub executed_quantity: u64,
    /// Cancellations that removed quantity.
    pub cancels: u64,
}

/// Live resting order ids with O(1) insert, remove and uniform sampling.
///
/// Kept in lockstep with the book through add/cancel results, so random
/// cancel targets never require scanning the book itself.
#[derive(Debug, Default)]
struct Outstanding {
    ids: Vec<OrderId>,
    positions: HashMap<OrderId, usize>,
}

impl Outstanding {
    fn insert(&mut self, id: OrderId) {
        if self.positions.contains_key(&id) {
            return;
        }
        self.positions.insert(id, self.ids.len());
        self.ids.push(id);
    }

    fn remove(&mut self, id: OrderId) {
        let Some(position) = self.positions.remove(&id) else {
            return;
        };
        self.ids.swap_remove(position);
        if let Some(&moved) = self.ids.get(position) {
            self.positions.insert(moved, position);
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> Option<OrderId> {
        if self.ids.is_empty() {
            return None;
        }
        Some(self.ids[rng.gen_range(0..self.ids.len())])
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Regime-switching synthetic market generator.
///
/// Owns the RNG, the latent mid-price process, the regime machine, the
/// intraday curve and the agent population. `step()` advances the
/// simulation one tick and returns that tick's L3 events in emission
/// order. Given the same `(seed, config)` the event stream is
/// bit-reproducible.
pub struct MarketGenerator {
    config: SimConfig,
    book: Arc<RwLock<OrderBook>>,
    rng: ChaCha8Rng,
    midprice: MidPriceProcess,
    regimes: RegimeMachine,
    curve: IntradayCurve,
    agents: Vec<Agent>,
    outstanding: Outstanding,
    stats: GeneratorStats,
    noise_offset: Exp<f64>,
    noise_size: LogNormal<f64>,
}

impl MarketGenerator {
    /// Build a generator with a fresh book.
    ///
    /// The configuration should have passed [`SimConfig::validate`].
    pub fn new(config: SimConfig) -> Self {
        let book = Arc::new(RwLock::new(OrderBook::with_clock(
            SimClock::new(),
            config.validate_orders,
        )));
        Self::with_book(config, book)
    }

    /// Build a generator around an existing shared book.
    pub fn with_book(config: SimConfig, book: Arc<RwLock<OrderBook>>) -> Self {
        let mut agents = Vec::new();
        for _ in 0..config.market_makers {
            agents.push(Agent::MarketMaker(MarketMaker::new()));
        }
        for _ in 0..config.momentum_agents {
            agents.push(Agent::Momentum(Momentum::new()));
        }
        for _ in 0..config.mean_reversion_agents {
            agents.push(Agent::MeanReversion(MeanReversion::new()));
        }
        for _ in 0..config.noise_agents {
            agents.push(Agent::Noise(Noise::new()));
        }

        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            midprice: MidPriceProcess::new(config.initial_mid, config.tick_size),
            regimes: RegimeMachine::new(config.regime_matrix),
            curve: IntradayCurve::new(config.session_length_s),
            agents,
            outstanding: Outstanding::default(),
            stats: GeneratorStats::default(),
            noise_offset: Exp::new(0.35).expect("valid exponential rate"),
            noise_size: LogNormal::new(2.2, 0.8).expect("valid lognormal parameters"),
            config,
            book,
        }
    }

    /// Shared handle to the book this generator drives.
    #[must_use]
    pub fn book(&self) -> Arc<RwLock<OrderBook>> {
        Arc::clone(&self.book)
    }

    /// Cumulative counters.
    #[must_use]
    pub fn stats(&self) -> GeneratorStats {
        self.stats
    }

    /// Current regime.
    #[must_use]
    pub fn regime(&self) -> Regime {
        self.regimes.current()
    }

    /// Current latent mid price.
    #[must_use]
    pub fn mid(&self) -> f64 {
        self.midprice.mid()
    }

    /// Resting orders currently tracked for random cancellation.
    #[must_use]
    pub fn outstanding_orders(&self) -> usize {
        self.outstanding.len()
    }

    /// Seed the empty book with a block of passive liquidity around the
    /// initial mid, so the first ticks see a two-sided market.
    pub fn seed_book(&mut self) -> Vec<L3Event> {
        let MarketGenerator {
            config,
            book,
            rng,
            outstanding,
            stats,
            noise_size,
            ..
        } = self;
        let mut book = book.write();
        let mid_tick = config.price_to_tick(config.initial_mid);

        let mut events = Vec::new();
        let mut trades = Vec::new();
        for level in 1..=10i64 {
            for _ in 0..3 {
                let quantity = (noise_size.sample(rng) as u64).clamp(1, 500);
                apply_intent(
                    &mut book,
                    Intent::Limit {
                        side: Side::Bid,
                        price_tick: mid_tick - level,
                        quantity,
                    },
                    outstanding,
                    stats,
                    &mut events,
                    &mut trades,
                );
                let quantity = (noise_size.sample(rng) as u64).clamp(1, 500);
                apply_intent(
                    &mut book,
                    Intent::Limit {
                        side: Side::Ask,
                        price_tick: mid_tick + level,
                        quantity,
                    },
                    outstanding,
                    stats,
                    &mut events,
                    &mut trades,
                );
            }
        }
        debug_assert!(trades.is_empty(), "seeding must not cross the book");
        events
    }

    /// Advance the simulation one tick.
    ///
    /// Returns the tick's L3 events in emission order. The per-tick work
    /// is: advance time, evolve the mid, step the regime, poll the agents,
    /// then mix in the Poisson noise flow of adds and cancels.
    pub fn step(&mut self) -> Vec<L3Event> {
        let MarketGenerator {
            config,
            book,
            rng,
            midprice,
            regimes,
            curve,
            agents,
            outstanding,
            stats,
            noise_offset,
            noise_size,
        } = self;
        let mut book = book.write();

        let dt_ns: u64 = rng.gen_range(500_000..1_500_000);
        let now = book.clock_mut().advance(dt_ns);
        let dt_s = dt_ns as f64 / 1e9;

        let mid = midprice.step(dt_s, &regimes.current().params(), rng);
        let params = regimes.step(rng).params();

        let budget =
            config.orders_per_tick as f64 * params.arrival_mult * curve.activity(now);

        let mut events = Vec::new();
        let mut tick_trades: Vec<Trade> = Vec::new();

        // Agent flow.
        let view = BookView {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            mid,
            now,
            tick_size: config.tick_size,
        };
        for agent in agents.iter_mut() {
            let intents = agent.propose(&view, rng);
            let mut placed = Vec::new();
            for intent in intents {
                if let Some(id) = apply_intent(
                    &mut book,
                    intent,
                    outstanding,
                    stats,
                    &mut events,
                    &mut tick_trades,
                ) {
                    placed.push(id);
                }
            }
            if !placed.is_empty() {
                agent.on_orders_placed(&placed);
            }
        }

        // Noise flow: Poisson cancels drawn uniformly from outstanding ids,
        // the rest of the budget as near-touch limit adds.
        let cancel_mean = budget * config.cancel_ratio * params.cancel_mult;
        let cancel_count = if cancel_mean > 0.0 {
            Poisson::new(cancel_mean)
                .map(|poisson| poisson.sample(rng) as u64)
                .unwrap_or(0)
        } else {
            0
        };
        for _ in 0..cancel_count {
            let Some(id) = outstanding.sample(rng) else {
                break;
            };
            apply_intent(
                &mut book,
                Intent::Cancel { id },
                outstanding,
                stats,
                &mut events,
                &mut tick_trades,
            );
        }

        let add_count = (budget.round() as i64 - cancel_count as i64).max(0);
        let mid_tick = config.price_to_tick(mid);
        for _ in 0..add_count {
            let side = if rng.gen_bool(0.5) {
                Side::Bid
            } else {
                Side::Ask
            };
            let offset = 1 + (noise_offset.sample(rng) as i64).min(100);
            let price_tick = match side {
                Side::Bid => mid_tick - offset,
                Side::Ask => mid_tick + offset,
            };
            let quantity = (noise_size.sample(rng) as u64).clamp(1, 500);
            apply_intent(
                &mut book,
                Intent::Limit {
                    side,
                    price_tick,
                    quantity,
                },
                outstanding,
                stats,
                &mut events,
                &mut tick_trades,
            );
        }

        drop(book);

        for agent in agents.iter_mut() {
            agent.observe_trades(&tick_trades);
        }

        stats.ticks += 1;
        trace!(
            "tick {}: {} events, {} trades, {} resting",
            stats.ticks,
            events.len(),
            tick_trades.len(),
            outstanding.len()
        );
        events
    }
}

/// Apply one intent to the book, folding its events and trades into the
/// tick output and keeping the outstanding-order tracker in sync.
///
/// Returns the assigned order id for submissions.
fn apply_intent(
    book: &mut OrderBook,
    intent: Intent,
    outstanding: &mut Outstanding,
    stats: &mut GeneratorStats,
    events: &mut Vec<L3Event>,
    trades: &mut Vec<Trade>,
) -> Option<OrderId> {
    match intent {
        Intent::Limit {
            side,
            price_tick,
            quantity,
        } => match book.add_limit(side, price_tick, quantity) {
            Ok(result) => {
                for id in &result.filled_maker_ids {
                    outstanding.remove(*id);
                }
                if result.resting {
                    outstanding.insert(result.order_id);
                }
                fold_result(&result.trades, &result.events, stats, events, trades);
                Some(result.order_id)
            }
            Err(error) => {
                trace!("limit intent rejected: {error}");
                None
            }
        },
        Intent::Market { side, quantity } => match book.add_market(side, quantity) {
            Ok(result) => {
                for id in &result.filled_maker_ids {
                    outstanding.remove(*id);
                }
                fold_result(&result.trades, &result.events, stats, events, trades);
                Some(result.order_id)
            }
            Err(error) => {
                trace!("market intent rejected: {error}");
                None
            }
        },
        Intent::Cancel { id } => {
            let result = book.cancel(id);
            outstanding.remove(id);
            if let Some(event) = result.event {
                stats.cancels += 1;
                stats.events += 1;
                events.push(event);
            }
            None
        }
    }
}

fn fold_result(
    new_trades: &[Trade],
    new_events: &[L3Event],
    stats: &mut GeneratorStats,
    events: &mut Vec<L3Event>,
    trades: &mut Vec<Trade>,
) {
    stats.trades += new_trades.len() as u64;
    stats.executed_quantity += new_trades.iter().map(|trade| trade.quantity).sum::<u64>();
    stats.events += new_events.len() as u64;
    trades.extend_from_slice(new_trades);
    events.extend_from_slice(new_events);
}
