//! Simulation configuration.
//!
//! All tunables live in one immutable [`SimConfig`] value handed to each
//! component at construction time. There is no process-global state; two
//! simulations with different configurations can coexist in one process.

use std::fmt;

/// Default per-side depth cap for snapshots.
pub const DEFAULT_DEPTH: u16 = 50;

/// Default broadcast cadence in snapshots per second.
pub const DEFAULT_TARGET_HZ: u16 = 30;

/// Regime transition matrix: rows are the current regime (calm, normal,
/// stress), columns the next. Each row must sum to 1.
pub type RegimeMatrix = [[f64; 3]; 3];

/// Default regime transition probabilities.
///
/// Expected dwell times are roughly 200 ticks in calm, 100 in normal and a
/// dozen in stress, matching the intended bursty character of the flow.
pub const DEFAULT_REGIME_MATRIX: RegimeMatrix = [
    [0.995, 0.004, 0.001],
    [0.006, 0.990, 0.004],
    [0.020, 0.060, 0.920],
];

/// Immutable simulation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Price quantum: real price = tick * tick_size. Must be positive.
    pub tick_size: f64,
    /// RNG seed. The same seed and configuration reproduce the exact same
    /// event stream.
    pub seed: u64,
    /// Base number of order intents generated per simulation tick.
    pub orders_per_tick: u32,
    /// Fraction of generated intents that are cancellations, in [0, 1].
    pub cancel_ratio: f64,
    /// Per-side depth cap for snapshots.
    pub depth: u16,
    /// Broadcast cadence in snapshots per second.
    pub target_hz: u16,
    /// Maximum concurrent WebSocket subscribers.
    pub max_subscribers: u16,
    /// Regime state-transition probabilities (row-stochastic).
    pub regime_matrix: RegimeMatrix,
    /// Intraday session length in seconds; the activity curve repeats with
    /// this period.
    pub session_length_s: u32,
    /// Run book invariant checks after every mutation. Violations abort.
    pub validate_orders: bool,
    /// Latent mid price at session start, in real price units.
    pub initial_mid: f64,
    /// Number of market-maker agents in the population.
    pub market_makers: usize,
    /// Number of momentum agents in the population.
    pub momentum_agents: usize,
    /// Number of mean-reversion agents in the population.
    pub mean_reversion_agents: usize,
    /// Number of noise agents in the population.
    pub noise_agents: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_size: 0.01,
            seed: 0,
            orders_per_tick: 5,
            cancel_ratio: 0.2,
            depth: DEFAULT_DEPTH,
            target_hz: DEFAULT_TARGET_HZ,
            max_subscribers: 64,
            regime_matrix: DEFAULT_REGIME_MATRIX,
            session_length_s: 23_400,
            validate_orders: false,
            initial_mid: 100.0,
            market_makers: 1,
            momentum_agents: 1,
            mean_reversion_agents: 1,
            noise_agents: 2,
        }
    }
}

impl SimConfig {
    /// Check the configuration for values that cannot drive a simulation.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found. A default configuration
    /// always validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_size > 0.0) || !self.tick_size.is_finite() {
            return Err(ConfigError::InvalidTickSize {
                tick_size: self.tick_size,
            });
        }
        if !(0.0..=1.0).contains(&self.cancel_ratio) {
            return Err(ConfigError::InvalidCancelRatio {
                cancel_ratio: self.cancel_ratio,
            });
        }
        if self.depth == 0 {
            return Err(ConfigError::InvalidDepth { depth: self.depth });
        }
        if self.target_hz == 0 {
            return Err(ConfigError::InvalidTargetHz {
                target_hz: self.target_hz,
            });
        }
        if self.session_length_s == 0 {
            return Err(ConfigError::InvalidSessionLength {
                session_length_s: self.session_length_s,
            });
        }
        if !(self.initial_mid > 0.0) || !self.initial_mid.is_finite() {
            return Err(ConfigError::InvalidInitialMid {
                initial_mid: self.initial_mid,
            });
        }
        for (row_index, row) in self.regime_matrix.iter().enumerate() {
            if row.iter().any(|p| !(0.0..=1.0).contains(p)) {
                return Err(ConfigError::InvalidRegimeMatrix { row: row_index });
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > 1e-9 {
                return Err(ConfigError::InvalidRegimeMatrix { row: row_index });
            }
        }
        Ok(())
    }

    /// Convert a real price to its nearest tick.
    #[must_use]
    #[inline]
    pub fn price_to_tick(&self, price: f64) -> i64 {
        (price / self.tick_size).round() as i64
    }

    /// Convert a tick back to a real price.
    #[must_use]
    #[inline]
    pub fn tick_to_price(&self, tick: i64) -> f64 {
        tick as f64 * self.tick_size
    }
}

/// Errors produced by [`SimConfig::validate`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Tick size must be a finite positive number.
    InvalidTickSize {
        /// The rejected value.
        tick_size: f64,
    },

    /// Cancel ratio must lie in [0, 1].
    InvalidCancelRatio {
        /// The rejected value.
        cancel_ratio: f64,
    },

    /// Snapshot depth must be positive.
    InvalidDepth {
        /// The rejected value.
        depth: u16,
    },

    /// Broadcast rate must be positive.
    InvalidTargetHz {
        /// The rejected value.
        target_hz: u16,
    },

    /// Session length must be positive.
    InvalidSessionLength {
        /// The rejected value.
        session_length_s: u32,
    },

    /// Initial mid price must be a finite positive number.
    InvalidInitialMid {
        /// The rejected value.
        initial_mid: f64,
    },

    /// A regime matrix row does not sum to 1 or contains an out-of-range
    /// probability.
    InvalidRegimeMatrix {
        /// Index of the offending row.
        row: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTickSize { tick_size } => {
                write!(f, "invalid tick size: {tick_size} (must be finite and > 0)")
            }
            ConfigError::InvalidCancelRatio { cancel_ratio } => {
                write!(
                    f,
                    "invalid cancel ratio: {cancel_ratio} (must be within [0, 1])"
                )
            }
            ConfigError::InvalidDepth { depth } => {
                write!(f, "invalid snapshot depth: {depth} (must be > 0)")
            }
            ConfigError::InvalidTargetHz { target_hz } => {
                write!(f, "invalid broadcast rate: {target_hz} Hz (must be > 0)")
            }
            ConfigError::InvalidSessionLength { session_length_s } => {
                write!(
                    f,
                    "invalid session length: {session_length_s} s (must be > 0)"
                )
            }
            ConfigError::InvalidInitialMid { initial_mid } => {
                write!(
                    f,
                    "invalid initial mid price: {initial_mid} (must be finite and > 0)"
                )
            }
            ConfigError::InvalidRegimeMatrix { row } => {
                write!(f, "regime matrix row {row} is not a probability row")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
