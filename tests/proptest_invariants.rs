//! Property-based tests for order book and generator invariants.
//!
//! Random operation sequences are generated with proptest and every
//! structural invariant is checked after each mutation.

use lobsim::{MarketGenerator, OrderBook, OrderId, Side, SimConfig};
use proptest::prelude::*;

/// A random book operation. Cancels pick an index into the ids seen so
/// far, so sequences exercise known, unknown and repeated targets.
#[derive(Debug, Clone)]
enum Op {
    Limit { side: Side, tick: i64, quantity: u64 },
    Market { side: Side, quantity: u64 },
    CancelNth(usize),
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Bid), Just(Side::Ask)]
}

fn tick_strategy() -> impl Strategy<Value = i64> {
    9_950i64..=10_050i64
}

fn quantity_strategy() -> impl Strategy<Value = u64> {
    1u64..=200u64
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (side_strategy(), tick_strategy(), quantity_strategy())
            .prop_map(|(side, tick, quantity)| Op::Limit { side, tick, quantity }),
        1 => (side_strategy(), quantity_strategy())
            .prop_map(|(side, quantity)| Op::Market { side, quantity }),
        2 => (0usize..64).prop_map(Op::CancelNth),
    ]
}

fn apply(book: &mut OrderBook, seen_ids: &mut Vec<OrderId>, op: &Op) {
    match op {
        Op::Limit {
            side,
            tick,
            quantity,
        } => {
            let result = book.add_limit(*side, *tick, *quantity).unwrap();
            if result.resting {
                seen_ids.push(result.order_id);
            }
        }
        Op::Market { side, quantity } => {
            book.add_market(*side, *quantity).unwrap();
        }
        Op::CancelNth(index) => {
            if !seen_ids.is_empty() {
                let id = seen_ids[index % seen_ids.len()];
                book.cancel(id);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Structural invariants hold after every operation: aggregates match,
    /// no empty levels linger, the id index is exact, the book is never
    /// crossed.
    #[test]
    fn invariants_hold_under_random_operations(
        ops in prop::collection::vec(op_strategy(), 1..200)
    ) {
        let mut book = OrderBook::new();
        let mut seen_ids = Vec::new();
        for op in &ops {
            apply(&mut book, &mut seen_ids, op);
            prop_assert!(book.check_invariants().is_ok(), "after {:?}", op);
        }
    }

    /// Depth totals agree with per-side volume accounting.
    #[test]
    fn depth_sums_match_total_volume(
        ops in prop::collection::vec(op_strategy(), 1..150)
    ) {
        let mut book = OrderBook::new();
        let mut seen_ids = Vec::new();
        for op in &ops {
            apply(&mut book, &mut seen_ids, op);
        }
        for side in [Side::Bid, Side::Ask] {
            let depth_total: u64 = book.depth(side, usize::MAX).iter().map(|(_, s)| s).sum();
            prop_assert_eq!(depth_total, book.total_volume(side));
        }
    }

    /// Cancelling a known id removes exactly its resting quantity, and a
    /// second cancel of the same id is a no-op.
    #[test]
    fn cancel_accounting_is_exact(
        ops in prop::collection::vec(op_strategy(), 0..100),
        side in side_strategy(),
        tick in tick_strategy(),
        quantity in quantity_strategy(),
    ) {
        let mut book = OrderBook::new();
        let mut seen_ids = Vec::new();
        for op in &ops {
            apply(&mut book, &mut seen_ids, op);
        }

        let result = book.add_limit(side, tick, quantity).unwrap();
        prop_assume!(result.resting);
        let resting = result.remaining;
        let before = book.total_volume(side);

        let cancel = book.cancel(result.order_id);
        prop_assert_eq!(cancel.cancelled_quantity, resting);
        prop_assert_eq!(book.total_volume(side), before - resting);
        prop_assert_eq!(book.cancel(result.order_id).cancelled_quantity, 0);
    }

    /// Executions for one incoming order never exceed its quantity and
    /// exactly complement the unfilled remainder.
    #[test]
    fn executions_conserve_quantity(
        ops in prop::collection::vec(op_strategy(), 0..100),
        side in side_strategy(),
        tick in tick_strategy(),
        quantity in quantity_strategy(),
    ) {
        let mut book = OrderBook::new();
        let mut seen_ids = Vec::new();
        for op in &ops {
            apply(&mut book, &mut seen_ids, op);
        }

        let result = book.add_limit(side, tick, quantity).unwrap();
        let executed: u64 = result.trades.iter().map(|trade| trade.quantity).sum();
        prop_assert!(executed <= quantity);
        prop_assert_eq!(executed + result.remaining, quantity);
    }

    /// Snapshots are sorted best-first and capped at the requested depth.
    #[test]
    fn snapshots_sorted_and_bounded(
        ops in prop::collection::vec(op_strategy(), 1..150),
        depth in 1usize..20,
    ) {
        let mut book = OrderBook::new();
        let mut seen_ids = Vec::new();
        for op in &ops {
            apply(&mut book, &mut seen_ids, op);
        }

        let view = book.snapshot(depth);
        prop_assert!(view.bids.len() <= depth);
        prop_assert!(view.asks.len() <= depth);
        for pair in view.bids.windows(2) {
            prop_assert!(pair[0].0 > pair[1].0, "bids not strictly descending");
        }
        for pair in view.asks.windows(2) {
            prop_assert!(pair[0].0 < pair[1].0, "asks not strictly ascending");
        }
    }

    /// Adding an order and cancelling it leaves the observable book
    /// unchanged when nothing matched in between.
    #[test]
    fn add_then_cancel_is_identity(
        resting in prop::collection::vec(
            (side_strategy(), tick_strategy(), quantity_strategy()), 0..30
        ),
        quantity in quantity_strategy(),
    ) {
        let mut book = OrderBook::new();
        for (side, tick, qty) in &resting {
            let _ = book.add_limit(*side, *tick, *qty);
        }
        let bids = book.depth(Side::Bid, usize::MAX);
        let asks = book.depth(Side::Ask, usize::MAX);

        // A bid strictly below the best ask cannot match.
        let passive_tick = book.best_ask().map(|(ask, _)| ask - 1).unwrap_or(10_000);
        let result = book.add_limit(Side::Bid, passive_tick, quantity).unwrap();
        prop_assert!(result.trades.is_empty());
        book.cancel(result.order_id);

        prop_assert_eq!(book.depth(Side::Bid, usize::MAX), bids);
        prop_assert_eq!(book.depth(Side::Ask, usize::MAX), asks);
    }

    /// Two generators with the same seed emit identical event streams.
    #[test]
    fn generator_is_deterministic(seed in any::<u64>()) {
        let run = |seed: u64| {
            let mut generator = MarketGenerator::new(SimConfig {
                seed,
                ..SimConfig::default()
            });
            generator.seed_book();
            (0..30).flat_map(|_| generator.step()).collect::<Vec<_>>()
        };
        prop_assert_eq!(run(seed), run(seed));
    }
}
