//! Cancellation semantics: by id, repeated, and head-of-level bulk.

use super::test_helpers::{rest_limit, validated_book};
use crate::orderbook::{L3Event, Side};

#[test]
fn test_cancel_known_id_removes_quantity() {
    let mut book = validated_book();
    let id = rest_limit(&mut book, Side::Bid, 100, 8);
    let before = book.total_volume(Side::Bid);

    let result = book.cancel(id);
    assert_eq!(result.cancelled_quantity, 8);
    assert!(matches!(
        result.event,
        Some(L3Event::Cancel {
            cancelled_quantity: 8,
            ..
        })
    ));
    assert_eq!(book.total_volume(Side::Bid), before - 8);
    assert!(book.best_bid().is_none());
    assert_eq!(book.total_orders(), 0);
}

#[test]
fn test_cancel_unknown_id_is_noop() {
    let mut book = validated_book();
    let result = book.cancel(12345);
    assert_eq!(result.cancelled_quantity, 0);
    assert!(result.event.is_none());
}

#[test]
fn test_recancel_is_noop() {
    let mut book = validated_book();
    let id = rest_limit(&mut book, Side::Ask, 100, 5);
    assert_eq!(book.cancel(id).cancelled_quantity, 5);
    assert_eq!(book.cancel(id).cancelled_quantity, 0);
}

#[test]
fn test_cancel_middle_of_queue_preserves_order() {
    let mut book = validated_book();
    let first = rest_limit(&mut book, Side::Ask, 100, 1);
    let second = rest_limit(&mut book, Side::Ask, 100, 2);
    let third = rest_limit(&mut book, Side::Ask, 100, 3);

    assert_eq!(book.cancel(second).cancelled_quantity, 2);
    assert_eq!(book.best_ask(), Some((100, 4)));

    // Remaining orders still fill in their original order.
    let result = book.add_market(Side::Bid, 4).unwrap();
    let makers: Vec<u64> = result.trades.iter().map(|trade| trade.maker_id).collect();
    assert_eq!(makers, vec![first, third]);
}

#[test]
fn test_add_then_cancel_restores_book() {
    let mut book = validated_book();
    rest_limit(&mut book, Side::Bid, 99, 4);
    rest_limit(&mut book, Side::Ask, 101, 4);

    let bids_before = book.depth(Side::Bid, 10);
    let asks_before = book.depth(Side::Ask, 10);
    let orders_before = book.total_orders();

    let id = rest_limit(&mut book, Side::Bid, 100, 6);
    assert_ne!(book.depth(Side::Bid, 10), bids_before);
    book.cancel(id);

    assert_eq!(book.depth(Side::Bid, 10), bids_before);
    assert_eq!(book.depth(Side::Ask, 10), asks_before);
    assert_eq!(book.total_orders(), orders_before);
}

#[test]
fn test_cancel_level_consumes_from_head() {
    let mut book = validated_book();
    let first = rest_limit(&mut book, Side::Bid, 100, 4);
    let second = rest_limit(&mut book, Side::Bid, 100, 4);

    let events = book.cancel_level(Side::Bid, 100, 6);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        L3Event::Cancel { id, cancelled_quantity: 4, .. } if id == first
    ));
    assert!(matches!(
        events[1],
        L3Event::Cancel { id, cancelled_quantity: 2, .. } if id == second
    ));

    // The partially cancelled order remains with reduced quantity.
    assert_eq!(book.best_bid(), Some((100, 2)));
    assert_eq!(book.order(second).unwrap().quantity, 2);
    assert!(book.order(first).is_none());
}

#[test]
fn test_cancel_level_removes_empty_level() {
    let mut book = validated_book();
    rest_limit(&mut book, Side::Ask, 100, 3);
    let events = book.cancel_level(Side::Ask, 100, 10);
    assert_eq!(events.len(), 1);
    assert!(book.best_ask().is_none());
    assert_eq!(book.depth(Side::Ask, 10).len(), 0);
}

#[test]
fn test_cancel_level_missing_level_is_noop() {
    let mut book = validated_book();
    assert!(book.cancel_level(Side::Bid, 42, 10).is_empty());
}
