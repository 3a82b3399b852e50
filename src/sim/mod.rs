//! Regime-switching synthetic market generator.

mod agents;
mod generator;
mod intraday;
mod midprice;
mod regime;

pub use agents::{Agent, BookView, Intent, MarketMaker, MeanReversion, Momentum, Noise};
pub use generator::{GeneratorStats, MarketGenerator};
pub use intraday::IntradayCurve;
pub use midprice::MidPriceProcess;
pub use regime::{Regime, RegimeMachine, RegimeParams};
