//! Public book operations: add, cancel and bulk level cancel.

use super::book::{OrderBook, validate_quantity};
use super::error::OrderBookError;
use super::events::{L3Event, Trade};
use super::level::PriceLevel;
use super::order::{Order, OrderId, Side};
use tracing::trace;

/// Result of submitting an order.
#[derive(Debug, Clone)]
pub struct AddResult {
    /// Id assigned to the incoming order.
    pub order_id: OrderId,
    /// Executions produced by the order, in match sequence.
    pub trades: Vec<Trade>,
    /// L3 events in emission order: executions first, then the resting add
    /// when a limit remainder rests.
    pub events: Vec<L3Event>,
    /// Quantity not filled by matching. For market orders this was dropped;
    /// for limit orders it rests on the book.
    pub remaining: u64,
    /// True when a limit remainder was placed on the book.
    pub resting: bool,
    /// Resting orders fully consumed by this submission.
    pub filled_maker_ids: Vec<OrderId>,
}

/// Result of a cancel-by-id request.
#[derive(Debug, Clone, Copy)]
pub struct CancelResult {
    /// Quantity removed from the book; zero when the id was unknown.
    pub cancelled_quantity: u64,
    /// The cancellation event, when anything was removed.
    pub event: Option<L3Event>,
}

impl OrderBook {
    /// Submit a limit order.
    ///
    /// Matches any marketable quantity against the opposite side, then
    /// rests the remainder at `(side, price_tick)` in time priority.
    ///
    /// # Errors
    /// [`OrderBookError::InvalidQuantity`] when `quantity` is zero; the
    /// book is left untouched.
    pub fn add_limit(
        &mut self,
        side: Side,
        price_tick: i64,
        quantity: u64,
    ) -> Result<AddResult, OrderBookError> {
        validate_quantity(quantity)?;
        let order_id = self.allocate_order_id();
        let outcome = self.match_incoming(side, quantity, Some(price_tick));

        let mut events = outcome.events;
        let resting = outcome.remaining > 0;
        if resting {
            let ts = self.clock.stamp();
            let order = Order::limit(order_id, side, price_tick, outcome.remaining, ts);
            self.side_levels_mut(side)
                .entry(price_tick)
                .or_insert_with(|| PriceLevel::new(price_tick))
                .push_back(order);
            self.ids.insert(order_id, (side, price_tick));
            events.push(L3Event::Add {
                id: order_id,
                side,
                price_tick,
                quantity: outcome.remaining,
                ts,
            });
        }

        self.refresh_best();
        trace!(
            "limit {side} {quantity}@{price_tick}: id={order_id} filled={} resting={}",
            quantity - outcome.remaining,
            outcome.remaining
        );
        self.assert_invariants();

        Ok(AddResult {
            order_id,
            trades: outcome.trades,
            events,
            remaining: outcome.remaining,
            resting,
            filled_maker_ids: outcome.filled_maker_ids,
        })
    }

    /// Submit a market order.
    ///
    /// Consumes opposite liquidity best-first; any unfilled remainder is
    /// dropped. Market orders never rest.
    ///
    /// # Errors
    /// [`OrderBookError::InvalidQuantity`] when `quantity` is zero.
    pub fn add_market(&mut self, side: Side, quantity: u64) -> Result<AddResult, OrderBookError> {
        validate_quantity(quantity)?;
        let order_id = self.allocate_order_id();
        let outcome = self.match_incoming(side, quantity, None);

        self.refresh_best();
        trace!(
            "market {side} {quantity}: id={order_id} filled={} dropped={}",
            quantity - outcome.remaining,
            outcome.remaining
        );
        self.assert_invariants();

        Ok(AddResult {
            order_id,
            trades: outcome.trades,
            events: outcome.events,
            remaining: outcome.remaining,
            resting: false,
            filled_maker_ids: outcome.filled_maker_ids,
        })
    }

    /// Cancel a resting order by id.
    ///
    /// Unknown ids are a no-op with `cancelled_quantity` 0; repeated
    /// cancels are therefore harmless.
    pub fn cancel(&mut self, id: OrderId) -> CancelResult {
        let Some((side, price_tick)) = self.ids.remove(&id) else {
            trace!("cancel {id}: unknown id");
            return CancelResult {
                cancelled_quantity: 0,
                event: None,
            };
        };

        let cancelled = {
            let levels = match side {
                Side::Bid => &mut self.bids,
                Side::Ask => &mut self.asks,
            };
            let mut cancelled = 0;
            if let Some(level) = levels.get_mut(&price_tick) {
                if let Some(order) = level.remove_by_id(id) {
                    cancelled = order.quantity;
                }
                if level.is_empty() {
                    levels.remove(&price_tick);
                }
            }
            cancelled
        };

        let event = (cancelled > 0).then(|| {
            let ts = self.clock.stamp();
            L3Event::Cancel {
                id,
                side,
                price_tick,
                cancelled_quantity: cancelled,
                ts,
            }
        });

        self.refresh_best();
        trace!("cancel {id}: removed {cancelled}@{price_tick} {side}");
        self.assert_invariants();

        CancelResult {
            cancelled_quantity: cancelled,
            event,
        }
    }

    /// Cancel up to `quantity` from the head of a level, oldest orders
    /// first. The last affected order may be reduced rather than removed.
    ///
    /// Returns one cancellation event per affected order. A missing level
    /// returns no events.
    pub fn cancel_level(&mut self, side: Side, price_tick: i64, quantity: u64) -> Vec<L3Event> {
        let mut events = Vec::new();
        let mut budget = quantity;

        while budget > 0 {
            let head = {
                let levels = match side {
                    Side::Bid => &mut self.bids,
                    Side::Ask => &mut self.asks,
                };
                let Some(level) = levels.get_mut(&price_tick) else {
                    break;
                };
                let head = level.fill_front(budget);
                if level.is_empty() {
                    levels.remove(&price_tick);
                }
                head
            };
            let Some((id, cancelled, removed)) = head else {
                break;
            };
            budget -= cancelled;
            if removed {
                self.ids.remove(&id);
            }
            let ts = self.clock.stamp();
            events.push(L3Event::Cancel {
                id,
                side,
                price_tick,
                cancelled_quantity: cancelled,
                ts,
            });
        }

        if !events.is_empty() {
            self.refresh_best();
            trace!(
                "cancel_level {side}@{price_tick}: removed {} across {} orders",
                quantity - budget,
                events.len()
            );
        }
        self.assert_invariants();
        events
    }
}
