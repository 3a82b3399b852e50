//! Convenience re-export of the commonly used public surface.
//!
//! ```
//! use lobsim::prelude::*;
//!
//! let mut book = OrderBook::new();
//! book.add_limit(Side::Bid, 9_999, 10).unwrap();
//! assert_eq!(book.best_bid(), Some((9_999, 10)));
//! ```

pub use crate::clock::SimClock;
pub use crate::config::{ConfigError, SimConfig};
pub use crate::orderbook::{
    AddResult, CancelResult, DepthView, L3Event, Order, OrderBook, OrderBookError, OrderId,
    OrderKind, Side, Trade,
};
pub use crate::sim::{GeneratorStats, MarketGenerator, Regime};
pub use crate::stream::{BookSnapshot, SnapshotSampler};
