//! The match loop: consuming opposite liquidity best-first, FIFO within
//! each level.

use super::book::OrderBook;
use super::events::{L3Event, Trade};
use super::order::{OrderId, Side};

/// Everything produced by matching one incoming order.
#[derive(Debug, Default)]
pub(super) struct MatchOutcome {
    pub trades: Vec<Trade>,
    pub events: Vec<L3Event>,
    /// Quantity left after the walk stopped.
    pub remaining: u64,
    /// Makers whose orders were fully consumed and left the book.
    pub filled_maker_ids: Vec<OrderId>,
}

impl OrderBook {
    /// Walk the opposite side best-first, consuming liquidity FIFO within
    /// each level until `quantity` is exhausted, the side empties, or the
    /// limit price stops being marketable.
    ///
    /// `limit_tick` of `None` matches at any price (market order). Trades
    /// execute at the maker's resting price, so an aggressive limit can
    /// fill across several improving levels. Each execution gets its own
    /// clock stamp, keeping the event stream strictly ordered.
    pub(super) fn match_incoming(
        &mut self,
        aggressor_side: Side,
        quantity: u64,
        limit_tick: Option<i64>,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome {
            remaining: quantity,
            ..MatchOutcome::default()
        };
        let opposite = aggressor_side.opposite();

        while outcome.remaining > 0 {
            let best_tick = match opposite {
                Side::Ask => match self.asks.keys().next() {
                    Some(tick) => *tick,
                    None => break,
                },
                Side::Bid => match self.bids.keys().next_back() {
                    Some(tick) => *tick,
                    None => break,
                },
            };

            if let Some(limit) = limit_tick {
                let marketable = match aggressor_side {
                    Side::Bid => best_tick <= limit,
                    Side::Ask => best_tick >= limit,
                };
                if !marketable {
                    break;
                }
            }

            let levels = match opposite {
                Side::Ask => &mut self.asks,
                Side::Bid => &mut self.bids,
            };
            let Some(level) = levels.get_mut(&best_tick) else {
                break;
            };

            while outcome.remaining > 0 {
                let Some((maker_id, filled, removed)) = level.fill_front(outcome.remaining) else {
                    break;
                };
                outcome.remaining -= filled;
                if removed {
                    self.ids.remove(&maker_id);
                    outcome.filled_maker_ids.push(maker_id);
                }
                let ts = self.clock.stamp();
                let trade = Trade {
                    maker_id,
                    aggressor_side,
                    price_tick: best_tick,
                    quantity: filled,
                    ts,
                };
                outcome.trades.push(trade);
                outcome.events.push(trade.into());
            }

            if levels
                .get(&best_tick)
                .is_some_and(|level| level.is_empty())
            {
                levels.remove(&best_tick);
            }
        }

        outcome
    }
}
