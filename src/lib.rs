//! # Limit Order Book Trading Simulation
//!
//! A discrete-price, price-time-priority matching engine driven by a
//! regime-switching synthetic market generator, with bounded-depth book
//! snapshots streamed to WebSocket subscribers as MessagePack frames.
//!
//! ## Subsystems
//!
//! - **Order book** ([`OrderBook`]): price levels in ordered maps with
//!   FIFO queues, an order-id index for scan-free cancellation, a cached
//!   top of book, and an ITCH-like L3 event stream (`Add` / `Execute` /
//!   `Cancel`). Market orders sweep the opposite side best-first and drop
//!   any remainder; limit orders match their marketable quantity and rest
//!   the rest. Trades always execute at the maker's resting price.
//!
//! - **Market generator** ([`MarketGenerator`]): advances a latent
//!   jump-diffusion mid price under a three-state regime machine (calm,
//!   normal, stress), shapes the arrival rate with an intraday U-curve,
//!   polls a small population of agents (market maker, momentum, mean
//!   reversion, noise), and mixes in Poisson noise flow of near-touch
//!   limit adds and uniform random cancellations. Given the same seed and
//!   configuration, two runs emit bit-identical event streams.
//!
//! - **Snapshot stream** ([`SnapshotSampler`], [`stream::serve`]): a
//!   coalescing sampler captures the book at a target cadence, encodes
//!   each snapshot once, and fans it out through a latest-wins slot to
//!   one forwarding task per subscriber. Slow subscribers see gapped but
//!   in-order sequence numbers; they never slow anyone else down.
//!
//! ## Concurrency model
//!
//! The generator is the book's only writer and holds the write guard for
//! one tick at a time. The sampler is the only reader, taking a read
//! guard for one bounded depth scan. Subscriber tasks never touch the
//! book at all; they consume encoded frames. This single seam keeps
//! price-time priority cheap and makes the rest of the system
//! embarrassingly concurrent.
//!
//! ## Example
//!
//! Matching a market order against resting liquidity:
//!
//! ```
//! use lobsim::{OrderBook, Side};
//!
//! let mut book = OrderBook::new();
//! book.add_limit(Side::Ask, 10_000, 3).unwrap();
//! book.add_limit(Side::Ask, 10_001, 4).unwrap();
//!
//! let result = book.add_market(Side::Bid, 5).unwrap();
//! let fills: Vec<(i64, u64)> = result
//!     .trades
//!     .iter()
//!     .map(|trade| (trade.price_tick, trade.quantity))
//!     .collect();
//! assert_eq!(fills, vec![(10_000, 3), (10_001, 2)]);
//! assert_eq!(book.best_ask(), Some((10_001, 2)));
//! ```
//!
//! Running the generator deterministically:
//!
//! ```
//! use lobsim::{MarketGenerator, SimConfig};
//!
//! let config = SimConfig { seed: 7, ..SimConfig::default() };
//! let mut generator = MarketGenerator::new(config);
//! generator.seed_book();
//! for _ in 0..100 {
//!     let events = generator.step();
//!     for event in &events {
//!         // Feed events to a downstream consumer.
//!         let _ = event.ts();
//!     }
//! }
//! ```

pub mod clock;
pub mod config;
pub mod orderbook;
pub mod prelude;
pub mod sim;
pub mod stream;

pub use clock::SimClock;
pub use config::{ConfigError, RegimeMatrix, SimConfig};
pub use orderbook::{
    AddResult, CancelResult, DepthView, L3Event, Order, OrderBook, OrderBookError, OrderId,
    OrderKind, Side, Trade,
};
pub use sim::{
    Agent, BookView, GeneratorStats, Intent, MarketGenerator, Regime, RegimeMachine, RegimeParams,
};
pub use stream::{BookSnapshot, SnapshotSampler, WireError};
