//! Core order book state: price levels, id index and top-of-book cache.

use super::error::OrderBookError;
use super::level::PriceLevel;
use super::order::{Order, OrderId, Side};
use crate::clock::SimClock;
use std::collections::{BTreeMap, HashMap};
use tracing::error;

/// A bounded-depth view of the book in ticks, captured at one instant.
///
/// Both sides are best-first: bids descending by tick, asks ascending.
/// The sampler converts this into the wire snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthView {
    /// Capture time in monotonic nanoseconds.
    pub ts: u64,
    /// Bid levels as `(price_tick, aggregate_size)`.
    pub bids: Vec<(i64, u64)>,
    /// Ask levels as `(price_tick, aggregate_size)`.
    pub asks: Vec<(i64, u64)>,
}

/// A price-time-priority matching engine over integer price ticks.
///
/// The book is a single-writer structure: all mutations go through one
/// owner (`&mut self`), and readers share it behind a read-write lock.
/// Price levels live in ordered maps per side; an id index maps each
/// resting order to its level so cancellation never scans the book; the
/// top of book is cached and refreshed once per mutating operation, making
/// `best_bid`/`best_ask` O(1) reads.
#[derive(Debug)]
pub struct OrderBook {
    pub(super) bids: BTreeMap<i64, PriceLevel>,
    pub(super) asks: BTreeMap<i64, PriceLevel>,

    /// Resting order id to `(side, price_tick)`. Exactly one entry per
    /// resting order.
    pub(super) ids: HashMap<OrderId, (Side, i64)>,

    /// Cached top of book, refreshed after every mutating operation.
    pub(super) best_bid: Option<(i64, u64)>,
    pub(super) best_ask: Option<(i64, u64)>,

    pub(super) next_order_id: OrderId,

    /// Simulation clock; every emitted event takes a unique stamp from it.
    pub(super) clock: SimClock,

    /// When set, invariants are checked after every mutation and any
    /// violation aborts the process.
    validate: bool,
}

impl OrderBook {
    /// Create an empty book with a fresh clock.
    pub fn new() -> Self {
        Self::with_clock(SimClock::new(), false)
    }

    /// Create an empty book with an explicit clock and validation mode.
    pub fn with_clock(clock: SimClock, validate: bool) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            ids: HashMap::new(),
            best_bid: None,
            best_ask: None,
            next_order_id: 1,
            clock,
            validate,
        }
    }

    /// Current simulation time in monotonic nanoseconds.
    #[must_use]
    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Mutable access to the simulation clock, used by the generator to
    /// advance time between ticks.
    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    /// Best bid as `(price_tick, aggregate_size)`, if any. O(1).
    #[must_use]
    #[inline]
    pub fn best_bid(&self) -> Option<(i64, u64)> {
        self.best_bid
    }

    /// Best ask as `(price_tick, aggregate_size)`, if any. O(1).
    #[must_use]
    #[inline]
    pub fn best_ask(&self) -> Option<(i64, u64)> {
        self.best_ask
    }

    /// Mid price in ticks (average of best bid and ask).
    #[must_use]
    pub fn mid_tick(&self) -> Option<f64> {
        match (self.best_bid, self.best_ask) {
            (Some((bid, _)), Some((ask, _))) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Spread in ticks (best ask minus best bid).
    #[must_use]
    pub fn spread_ticks(&self) -> Option<i64> {
        match (self.best_bid, self.best_ask) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    /// Number of resting orders across both sides.
    #[must_use]
    pub fn total_orders(&self) -> usize {
        self.ids.len()
    }

    /// Total resting quantity on one side.
    #[must_use]
    pub fn total_volume(&self, side: Side) -> u64 {
        self.side_levels(side)
            .values()
            .map(PriceLevel::total_quantity)
            .sum()
    }

    /// Look up a resting order by id.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        let (side, price_tick) = *self.ids.get(&id)?;
        self.side_levels(side)
            .get(&price_tick)?
            .iter()
            .find(|order| order.id == id)
    }

    /// Up to `n` levels on one side, best-first, as `(price_tick, size)`.
    #[must_use]
    pub fn depth(&self, side: Side, n: usize) -> Vec<(i64, u64)> {
        let levels = self.side_levels(side);
        let iter: Box<dyn Iterator<Item = (&i64, &PriceLevel)>> = match side {
            Side::Bid => Box::new(levels.iter().rev()),
            Side::Ask => Box::new(levels.iter()),
        };
        iter.take(n)
            .map(|(tick, level)| (*tick, level.total_quantity()))
            .collect()
    }

    /// Capture an immutable bounded-depth view of both sides.
    #[must_use]
    pub fn snapshot(&self, depth: usize) -> DepthView {
        DepthView {
            ts: self.now(),
            bids: self.depth(Side::Bid, depth),
            asks: self.depth(Side::Ask, depth),
        }
    }

    #[inline]
    pub(super) fn side_levels(&self, side: Side) -> &BTreeMap<i64, PriceLevel> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[inline]
    pub(super) fn side_levels_mut(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevel> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Refresh the top-of-book cache from the level maps.
    pub(super) fn refresh_best(&mut self) {
        self.best_bid = self
            .bids
            .iter()
            .next_back()
            .map(|(tick, level)| (*tick, level.total_quantity()));
        self.best_ask = self
            .asks
            .iter()
            .next()
            .map(|(tick, level)| (*tick, level.total_quantity()));
    }

    /// Check every book invariant, returning a description of the first
    /// violation found.
    ///
    /// Checked: the id index covers resting orders exactly once; level
    /// aggregates equal the sum of queued quantities; no empty levels
    /// remain; the book is not crossed.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut indexed = 0usize;
        for (side, levels) in [(Side::Bid, &self.bids), (Side::Ask, &self.asks)] {
            for (tick, level) in levels {
                if level.is_empty() {
                    return Err(format!("empty {side} level at tick {tick}"));
                }
                if level.total_quantity() != level.recomputed_quantity() {
                    return Err(format!(
                        "{side} level {tick} aggregate {} != recomputed {}",
                        level.total_quantity(),
                        level.recomputed_quantity()
                    ));
                }
                for order in level.iter() {
                    indexed += 1;
                    match self.ids.get(&order.id) {
                        Some(&(indexed_side, indexed_tick))
                            if indexed_side == side && indexed_tick == *tick => {}
                        Some(_) => {
                            return Err(format!("order {} indexed at wrong location", order.id));
                        }
                        None => return Err(format!("order {} missing from id index", order.id)),
                    }
                }
            }
        }
        if indexed != self.ids.len() {
            return Err(format!(
                "id index has {} entries for {indexed} resting orders",
                self.ids.len()
            ));
        }
        if let (Some((bid, _)), Some((ask, _))) = (self.best_bid, self.best_ask) {
            if bid >= ask {
                return Err(format!("crossed book: best bid {bid} >= best ask {ask}"));
            }
        }
        Ok(())
    }

    /// Run the invariant check in validated mode, aborting on violation.
    ///
    /// A violation is programmer error, not input error, so it is fatal.
    pub(super) fn assert_invariants(&self) {
        if !self.validate {
            return;
        }
        if let Err(violation) = self.check_invariants() {
            error!("order book invariant violated: {violation}");
            panic!("order book invariant violated: {violation}");
        }
    }

    pub(super) fn allocate_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate an order quantity at admission.
pub(super) fn validate_quantity(quantity: u64) -> Result<(), OrderBookError> {
    if quantity == 0 {
        return Err(OrderBookError::InvalidQuantity { quantity });
    }
    Ok(())
}
