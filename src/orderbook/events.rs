//! L3 event stream types.
//!
//! The book narrates every state change as an ITCH-like per-order event.
//! Timestamps are stamped from the book's clock one nanosecond apart, so
//! the emitted sequence is strictly ordered by `(ts, id)` and two runs of
//! the same seeded simulation produce byte-identical streams.

use super::order::{OrderId, Side};
use serde::{Deserialize, Serialize};

/// A single execution against a resting order.
///
/// The trade price is always the maker's resting price tick; the taker
/// receives any price improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Id of the resting (maker) order that was consumed.
    pub maker_id: OrderId,
    /// Side of the incoming (taker) order.
    pub aggressor_side: Side,
    /// Execution price in ticks (the maker's price).
    pub price_tick: i64,
    /// Executed quantity.
    pub quantity: u64,
    /// Execution time in monotonic nanoseconds.
    pub ts: u64,
}

/// Per-order-granularity book event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum L3Event {
    /// A new order rested on the book.
    Add {
        /// Order id.
        id: OrderId,
        /// Book side.
        side: Side,
        /// Resting price in ticks.
        price_tick: i64,
        /// Resting quantity (after any immediate fills).
        quantity: u64,
        /// Admission time in monotonic nanoseconds.
        ts: u64,
    },
    /// A resting order was (partially) executed by an incoming order.
    Execute {
        /// Id of the consumed resting order.
        maker_id: OrderId,
        /// Side of the incoming order.
        aggressor_side: Side,
        /// Execution price in ticks.
        price_tick: i64,
        /// Executed quantity.
        quantity: u64,
        /// Execution time in monotonic nanoseconds.
        ts: u64,
    },
    /// A resting order was (partially) cancelled.
    Cancel {
        /// Cancelled order id.
        id: OrderId,
        /// Book side.
        side: Side,
        /// Price level the order rested at, in ticks.
        price_tick: i64,
        /// Quantity removed from the book.
        cancelled_quantity: u64,
        /// Cancellation time in monotonic nanoseconds.
        ts: u64,
    },
}

impl L3Event {
    /// Event timestamp in monotonic nanoseconds.
    #[must_use]
    pub fn ts(&self) -> u64 {
        match self {
            L3Event::Add { ts, .. } | L3Event::Execute { ts, .. } | L3Event::Cancel { ts, .. } => {
                *ts
            }
        }
    }

    /// The order id an event is keyed on: the resting order for adds and
    /// cancels, the maker for executions.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        match self {
            L3Event::Add { id, .. } | L3Event::Cancel { id, .. } => *id,
            L3Event::Execute { maker_id, .. } => *maker_id,
        }
    }
}

impl From<Trade> for L3Event {
    fn from(trade: Trade) -> Self {
        L3Event::Execute {
            maker_id: trade.maker_id,
            aggressor_side: trade.aggressor_side,
            price_tick: trade.price_tick,
            quantity: trade.quantity,
            ts: trade.ts,
        }
    }
}
