//! Agent population: strategies that turn a book view into order intents.
//!
//! Agents never touch the book. Each poll they receive a [`BookView`] and
//! return [`Intent`]s; the generator applies those to the book and routes
//! the resulting order ids and executions back, so an agent can track its
//! own quotes and inventory without sharing state.

use crate::orderbook::{OrderId, Side, Trade};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, LogNormal};
use std::collections::VecDeque;

/// Read-only market state handed to each agent poll.
#[derive(Debug, Clone, Copy)]
pub struct BookView {
    /// Best bid as `(price_tick, size)`.
    pub best_bid: Option<(i64, u64)>,
    /// Best ask as `(price_tick, size)`.
    pub best_ask: Option<(i64, u64)>,
    /// Latent mid price in real units.
    pub mid: f64,
    /// Simulation time in monotonic nanoseconds.
    pub now: u64,
    /// Price quantum for tick conversion.
    pub tick_size: f64,
}

impl BookView {
    /// The latent mid rounded to the nearest tick.
    #[must_use]
    #[inline]
    pub fn mid_tick(&self) -> i64 {
        (self.mid / self.tick_size).round() as i64
    }
}

/// An order intent returned by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Submit a limit order.
    Limit {
        /// Book side.
        side: Side,
        /// Limit price in ticks.
        price_tick: i64,
        /// Order quantity.
        quantity: u64,
    },
    /// Submit a market order.
    Market {
        /// Book side.
        side: Side,
        /// Order quantity.
        quantity: u64,
    },
    /// Cancel a resting order.
    Cancel {
        /// Target order id.
        id: OrderId,
    },
}

/// A member of the agent population. Dispatch is a flat enum.
#[derive(Debug, Clone)]
pub enum Agent {
    /// Two-sided passive quoting around the mid.
    MarketMaker(MarketMaker),
    /// Trades with recent returns once they exceed a threshold.
    Momentum(Momentum),
    /// Fades deviations from a slow anchor.
    MeanReversion(MeanReversion),
    /// Uninformed random flow.
    Noise(Noise),
}

impl Agent {
    /// Poll the agent for intents.
    pub fn propose(&mut self, view: &BookView, rng: &mut ChaCha8Rng) -> Vec<Intent> {
        match self {
            Agent::MarketMaker(agent) => agent.propose(view),
            Agent::Momentum(agent) => agent.propose(view, rng),
            Agent::MeanReversion(agent) => agent.propose(view, rng),
            Agent::Noise(agent) => agent.propose(view, rng),
        }
    }

    /// Report the ids assigned to this agent's submitted orders, in the
    /// same sequence the adds appeared in its last proposal.
    pub fn on_orders_placed(&mut self, ids: &[OrderId]) {
        if let Agent::MarketMaker(agent) = self {
            agent.on_orders_placed(ids);
        }
    }

    /// Report the tick's executions so stateful agents can update
    /// inventory.
    pub fn observe_trades(&mut self, trades: &[Trade]) {
        if let Agent::MarketMaker(agent) = self {
            agent.observe_trades(trades);
        }
    }
}

/// Passive liquidity provider quoting both sides of the mid.
///
/// Re-quotes when the mid drifts beyond a threshold, cancelling the stale
/// pair first. Quote width grows with inventory and quotes skew toward the
/// reducing side; at the inventory limit the growing side goes dark.
#[derive(Debug, Clone)]
pub struct MarketMaker {
    quote_size: u64,
    base_half_spread_ticks: i64,
    /// Re-quote once the mid moves this many ticks from the quoted mid.
    requote_ticks: f64,
    inventory: i64,
    max_inventory: i64,
    last_quote_mid: Option<f64>,
    bid_id: Option<OrderId>,
    ask_id: Option<OrderId>,
    /// Sides of the adds awaiting id assignment, in proposal order.
    pending: Vec<Side>,
}

impl MarketMaker {
    /// Maker with default sizing and a 200-lot inventory limit.
    pub fn new() -> Self {
        Self {
            quote_size: 8,
            base_half_spread_ticks: 3,
            requote_ticks: 2.0,
            inventory: 0,
            max_inventory: 200,
            last_quote_mid: None,
            bid_id: None,
            ask_id: None,
            pending: Vec::new(),
        }
    }

    /// Current signed inventory in lots.
    #[must_use]
    pub fn inventory(&self) -> i64 {
        self.inventory
    }

    fn propose(&mut self, view: &BookView) -> Vec<Intent> {
        let moved_ticks = self
            .last_quote_mid
            .map(|quoted| ((view.mid - quoted) / view.tick_size).abs())
            .unwrap_or(f64::INFINITY);
        let quotes_alive = self.bid_id.is_some() || self.ask_id.is_some();
        if moved_ticks < self.requote_ticks && quotes_alive {
            return Vec::new();
        }

        let mut intents = Vec::new();
        if let Some(id) = self.bid_id.take() {
            intents.push(Intent::Cancel { id });
        }
        if let Some(id) = self.ask_id.take() {
            intents.push(Intent::Cancel { id });
        }

        // Widen with inventory pressure and lean quotes toward flat.
        let half = self.base_half_spread_ticks + self.inventory.abs() / 64;
        let skew = self.inventory / 32;
        let mid_tick = view.mid_tick();

        self.pending.clear();
        if self.inventory < self.max_inventory {
            intents.push(Intent::Limit {
                side: Side::Bid,
                price_tick: mid_tick - half - skew,
                quantity: self.quote_size,
            });
            self.pending.push(Side::Bid);
        }
        if self.inventory > -self.max_inventory {
            intents.push(Intent::Limit {
                side: Side::Ask,
                price_tick: mid_tick + half - skew,
                quantity: self.quote_size,
            });
            self.pending.push(Side::Ask);
        }

        self.last_quote_mid = Some(view.mid);
        intents
    }

    fn on_orders_placed(&mut self, ids: &[OrderId]) {
        for (side, id) in self.pending.drain(..).zip(ids.iter().copied()) {
            match side {
                Side::Bid => self.bid_id = Some(id),
                Side::Ask => self.ask_id = Some(id),
            }
        }
    }

    fn observe_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            if Some(trade.maker_id) == self.bid_id {
                self.inventory += trade.quantity as i64;
            } else if Some(trade.maker_id) == self.ask_id {
                self.inventory -= trade.quantity as i64;
            }
        }
    }
}

impl Default for MarketMaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Chases recent returns with aggressive limit orders.
#[derive(Debug, Clone)]
pub struct Momentum {
    mids: VecDeque<f64>,
    window: usize,
    /// Return over the window that triggers a trade.
    threshold: f64,
}

impl Momentum {
    /// Trader firing on 15 bps moves over a 20-poll window.
    pub fn new() -> Self {
        Self {
            mids: VecDeque::new(),
            window: 20,
            threshold: 0.0015,
        }
    }

    fn propose(&mut self, view: &BookView, rng: &mut ChaCha8Rng) -> Vec<Intent> {
        self.mids.push_back(view.mid);
        if self.mids.len() <= self.window {
            return Vec::new();
        }
        self.mids.pop_front();

        let oldest = self.mids[0];
        let window_return = (view.mid - oldest) / oldest;
        if window_return.abs() < self.threshold {
            return Vec::new();
        }
        // Reset so one move triggers once.
        self.mids.clear();

        let quantity = rng.gen_range(5..=30);
        let intent = if window_return > 0.0 {
            view.best_ask.map(|(ask, _)| Intent::Limit {
                side: Side::Bid,
                price_tick: ask + 2,
                quantity,
            })
        } else {
            view.best_bid.map(|(bid, _)| Intent::Limit {
                side: Side::Ask,
                price_tick: bid - 2,
                quantity,
            })
        };
        intent.into_iter().collect()
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new()
    }
}

/// Fades the mid once it strays from a slowly adapting anchor.
#[derive(Debug, Clone)]
pub struct MeanReversion {
    anchor: Option<f64>,
    /// Anchor EWMA weight per poll.
    alpha: f64,
    /// Relative deviation that triggers a passive fade.
    threshold: f64,
}

impl MeanReversion {
    /// Trader fading 20 bps deviations from a slow EWMA anchor.
    pub fn new() -> Self {
        Self {
            anchor: None,
            alpha: 0.01,
            threshold: 0.002,
        }
    }

    fn propose(&mut self, view: &BookView, rng: &mut ChaCha8Rng) -> Vec<Intent> {
        let anchor = match self.anchor {
            Some(anchor) => {
                let next = anchor + self.alpha * (view.mid - anchor);
                self.anchor = Some(next);
                next
            }
            None => {
                self.anchor = Some(view.mid);
                return Vec::new();
            }
        };

        let deviation = (view.mid - anchor) / anchor;
        if deviation.abs() < self.threshold {
            return Vec::new();
        }

        let quantity = rng.gen_range(3..=20);
        let intent = if deviation > 0.0 {
            // Rich to anchor: offer just outside the touch.
            view.best_ask.map(|(ask, _)| Intent::Limit {
                side: Side::Ask,
                price_tick: ask + 1,
                quantity,
            })
        } else {
            view.best_bid.map(|(bid, _)| Intent::Limit {
                side: Side::Bid,
                price_tick: bid - 1,
                quantity,
            })
        };
        intent.into_iter().collect()
    }
}

impl Default for MeanReversion {
    fn default() -> Self {
        Self::new()
    }
}

/// Uninformed flow: random side, lognormal size, exponential near-touch
/// offset.
#[derive(Debug, Clone)]
pub struct Noise {
    /// Probability of emitting an order on a given poll.
    intensity: f64,
    offset: Exp<f64>,
    size: LogNormal<f64>,
}

impl Noise {
    /// Noise trader emitting on roughly half its polls.
    pub fn new() -> Self {
        Self {
            intensity: 0.5,
            offset: Exp::new(0.4).expect("valid exponential rate"),
            size: LogNormal::new(1.8, 0.7).expect("valid lognormal parameters"),
        }
    }

    fn propose(&mut self, view: &BookView, rng: &mut ChaCha8Rng) -> Vec<Intent> {
        if !rng.gen_bool(self.intensity) {
            return Vec::new();
        }
        let side = if rng.gen_bool(0.5) {
            Side::Bid
        } else {
            Side::Ask
        };
        let offset = 1 + (self.offset.sample(rng) as i64).min(100);
        let mid_tick = view.mid_tick();
        let price_tick = match side {
            Side::Bid => mid_tick - offset,
            Side::Ask => mid_tick + offset,
        };
        let quantity = (self.size.sample(rng) as u64).clamp(1, 500);
        vec![Intent::Limit {
            side,
            price_tick,
            quantity,
        }]
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn view(mid: f64) -> BookView {
        BookView {
            best_bid: Some((9_995, 10)),
            best_ask: Some((10_005, 10)),
            mid,
            now: 0,
            tick_size: 0.01,
        }
    }

    #[test]
    fn test_market_maker_quotes_both_sides() {
        let mut maker = MarketMaker::new();
        let intents = maker.propose(&view(100.0));
        assert_eq!(intents.len(), 2);
        let sides: Vec<Side> = intents
            .iter()
            .map(|intent| match intent {
                Intent::Limit { side, .. } => *side,
                other => panic!("unexpected intent {other:?}"),
            })
            .collect();
        assert_eq!(sides, vec![Side::Bid, Side::Ask]);
    }

    #[test]
    fn test_market_maker_requotes_after_move() {
        let mut maker = MarketMaker::new();
        let first = maker.propose(&view(100.0));
        maker.on_orders_placed(&[11, 12]);
        assert_eq!(first.len(), 2);

        // Tiny move: keep quotes.
        assert!(maker.propose(&view(100.005)).is_empty());

        // Large move: cancel the stale pair and place a fresh one.
        let requote = maker.propose(&view(100.5));
        assert_eq!(requote.len(), 4);
        assert!(matches!(requote[0], Intent::Cancel { id: 11 }));
        assert!(matches!(requote[1], Intent::Cancel { id: 12 }));
    }

    #[test]
    fn test_market_maker_tracks_inventory() {
        let mut maker = MarketMaker::new();
        maker.propose(&view(100.0));
        maker.on_orders_placed(&[21, 22]);
        maker.observe_trades(&[Trade {
            maker_id: 21,
            aggressor_side: Side::Ask,
            price_tick: 9_997,
            quantity: 5,
            ts: 1,
        }]);
        assert_eq!(maker.inventory(), 5);
        maker.observe_trades(&[Trade {
            maker_id: 22,
            aggressor_side: Side::Bid,
            price_tick: 10_003,
            quantity: 8,
            ts: 2,
        }]);
        assert_eq!(maker.inventory(), -3);
    }

    #[test]
    fn test_momentum_fires_on_trend() {
        let mut momentum = Momentum::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut fired = Vec::new();
        for step in 0..40 {
            let mid = 100.0 * (1.0 + 0.0005 * step as f64);
            fired.extend(momentum.propose(&view(mid), &mut rng));
        }
        assert!(!fired.is_empty());
        assert!(matches!(
            fired[0],
            Intent::Limit {
                side: Side::Bid,
                ..
            }
        ));
    }

    #[test]
    fn test_momentum_quiet_on_flat_market() {
        let mut momentum = Momentum::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(momentum.propose(&view(100.0), &mut rng).is_empty());
        }
    }

    #[test]
    fn test_mean_reversion_fades_rich_mid() {
        let mut agent = MeanReversion::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..50 {
            agent.propose(&view(100.0), &mut rng);
        }
        let intents = agent.propose(&view(101.0), &mut rng);
        assert!(matches!(
            intents.as_slice(),
            [Intent::Limit {
                side: Side::Ask,
                ..
            }]
        ));
    }

    #[test]
    fn test_noise_stays_off_the_mid() {
        let mut noise = Noise::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            for intent in noise.propose(&view(100.0), &mut rng) {
                let Intent::Limit {
                    side,
                    price_tick,
                    quantity,
                } = intent
                else {
                    panic!("noise emits limits only");
                };
                match side {
                    Side::Bid => assert!(price_tick < 10_000),
                    Side::Ask => assert!(price_tick > 10_000),
                }
                assert!((1..=500).contains(&quantity));
            }
        }
    }
}
