//! Order and side definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique order identifier, assigned sequentially by the book. Never zero.
pub type OrderId = u64;

/// Side of the book an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side. Best bid is the highest resting price.
    Bid,
    /// Sell side. Best ask is the lowest resting price.
    Ask,
}

impl Side {
    /// The side an incoming order of this side matches against.
    #[must_use]
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// Order type. Market orders never rest; any unfilled remainder is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Rests at its limit price after matching any marketable quantity.
    Limit,
    /// Consumes opposite liquidity best-first, then disappears.
    Market,
}

/// A resting order as held in a price level queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    /// Unique identifier.
    pub id: OrderId,
    /// Book side.
    pub side: Side,
    /// Limit or market. Only limit orders ever rest.
    pub kind: OrderKind,
    /// Limit price in ticks. Meaningless for market orders.
    pub price_tick: i64,
    /// Remaining quantity. Decremented in place on partial fills; an order
    /// is removed from its level when this reaches zero.
    pub quantity: u64,
    /// Admission time in monotonic nanoseconds; defines time priority.
    pub timestamp: u64,
}

impl Order {
    /// Build a limit order.
    pub fn limit(id: OrderId, side: Side, price_tick: i64, quantity: u64, timestamp: u64) -> Self {
        Self {
            id,
            side,
            kind: OrderKind::Limit,
            price_tick,
            quantity,
            timestamp,
        }
    }
}
