//! End-to-end book scenarios through the public API.

use lobsim::{L3Event, OrderBook, Side};

#[test]
fn test_empty_book_market_buy() {
    let mut book = OrderBook::new();
    let result = book.add_market(Side::Bid, 100).unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.remaining, 100);
    assert!(book.best_bid().is_none());
    assert!(book.best_ask().is_none());
}

#[test]
fn test_same_price_fifo_consumption() {
    let mut book = OrderBook::new();
    let earlier = book.add_limit(Side::Ask, 100, 10).unwrap().order_id;
    let later = book.add_limit(Side::Ask, 100, 10).unwrap().order_id;
    assert!(earlier < later);

    let result = book.add_market(Side::Bid, 15).unwrap();
    assert_eq!(result.trades[0].maker_id, earlier);
    assert_eq!(result.trades[0].quantity, 10);
    assert_eq!(result.trades[1].maker_id, later);
    assert_eq!(result.trades[1].quantity, 5);
}

#[test]
fn test_crossing_bid_executes_at_maker_price_and_rests() {
    let mut book = OrderBook::new();
    book.add_limit(Side::Ask, 100, 5).unwrap();

    let result = book.add_limit(Side::Bid, 101, 9).unwrap();
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].price_tick, 100);
    assert!(result.resting);
    assert_eq!(book.best_bid(), Some((101, 4)));
    assert!(book.best_ask().is_none());
}

#[test]
fn test_price_improvement_walk_leaves_partial_top() {
    let mut book = OrderBook::new();
    book.add_limit(Side::Ask, 100, 3).unwrap();
    book.add_limit(Side::Ask, 101, 4).unwrap();
    book.add_limit(Side::Ask, 102, 5).unwrap();

    let result = book.add_market(Side::Bid, 10).unwrap();
    let fills: Vec<(i64, u64)> = result
        .trades
        .iter()
        .map(|trade| (trade.price_tick, trade.quantity))
        .collect();
    assert_eq!(fills, vec![(100, 3), (101, 4), (102, 3)]);
    assert_eq!(book.best_ask(), Some((102, 2)));
}

#[test]
fn test_middle_cancel_keeps_queue_order_and_size() {
    let mut book = OrderBook::new();
    let first = book.add_limit(Side::Bid, 100, 5).unwrap().order_id;
    let middle = book.add_limit(Side::Bid, 100, 7).unwrap().order_id;
    let last = book.add_limit(Side::Bid, 100, 9).unwrap().order_id;

    let cancel = book.cancel(middle);
    assert_eq!(cancel.cancelled_quantity, 7);
    assert_eq!(book.best_bid(), Some((100, 14)));

    let result = book.add_market(Side::Ask, 14).unwrap();
    let makers: Vec<u64> = result.trades.iter().map(|trade| trade.maker_id).collect();
    assert_eq!(makers, vec![first, last]);
}

#[test]
fn test_events_serialize_as_json_lines() {
    let mut book = OrderBook::new();
    let result = book.add_limit(Side::Bid, 100, 5).unwrap();
    let line = serde_json::to_string(&result.events[0]).unwrap();
    assert!(line.contains("\"type\":\"add\""));
    assert!(line.contains("\"side\":\"bid\""));

    let parsed: L3Event = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed, result.events[0]);
}

#[test]
fn test_depth_view_matches_operations() {
    let mut book = OrderBook::new();
    book.add_limit(Side::Bid, 99, 1).unwrap();
    book.add_limit(Side::Bid, 98, 2).unwrap();
    book.add_limit(Side::Ask, 101, 3).unwrap();

    let view = book.snapshot(10);
    assert_eq!(view.bids, vec![(99, 1), (98, 2)]);
    assert_eq!(view.asks, vec![(101, 3)]);
    assert!(book.check_invariants().is_ok());
}
