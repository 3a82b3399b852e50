//! Coalescing book sampler.

use crate::config::SimConfig;
use crate::orderbook::OrderBook;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A bounded-depth snapshot of the book with real prices.
///
/// Sides are best-first: bids descending by price, asks ascending. `seq`
/// strictly increases across snapshots from one sampler and is never
/// reused, so a consumer can detect skipped frames from the gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Capture time in monotonic nanoseconds.
    pub ts: u64,
    /// Sampler sequence number, strictly increasing.
    pub seq: u64,
    /// Bid levels as `[price, size]`, best first.
    pub bids: Vec<(f64, u64)>,
    /// Ask levels as `[price, size]`, best first.
    pub asks: Vec<(f64, u64)>,
}

impl BookSnapshot {
    /// Best bid as `(price, size)`, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<(f64, u64)> {
        self.bids.first().copied()
    }

    /// Best ask as `(price, size)`, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<(f64, u64)> {
        self.asks.first().copied()
    }
}

/// Converts the live book into wire snapshots at a bounded depth.
///
/// Sampling is coalescing: each call reads the book's current state under
/// a read guard, one O(depth) pass per side. Nothing is queued, so a
/// consumer sampling slower than the book advances always sees the latest
/// state.
pub struct SnapshotSampler {
    book: Arc<RwLock<OrderBook>>,
    tick_size: f64,
    depth: usize,
    next_seq: u64,
}

impl SnapshotSampler {
    /// Sampler over a shared book, taking depth and tick size from the
    /// configuration.
    pub fn new(book: Arc<RwLock<OrderBook>>, config: &SimConfig) -> Self {
        Self {
            book,
            tick_size: config.tick_size,
            depth: config.depth as usize,
            next_seq: 1,
        }
    }

    /// Capture the current book state as the next snapshot in sequence.
    pub fn sample(&mut self) -> BookSnapshot {
        let view = self.book.read().snapshot(self.depth);
        let seq = self.next_seq;
        self.next_seq += 1;

        let to_price = |(tick, size): &(i64, u64)| (*tick as f64 * self.tick_size, *size);
        BookSnapshot {
            ts: view.ts,
            seq,
            bids: view.bids.iter().map(to_price).collect(),
            asks: view.asks.iter().map(to_price).collect(),
        }
    }
}
