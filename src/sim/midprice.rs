//! Latent mid-price process.

use super::regime::RegimeParams;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, StandardNormal};

/// Discrete-time jump-diffusion for the latent mid price.
///
/// Each step applies
/// `mid += mu * dt + sigma * sqrt(dt) * eps + jump`
/// where the drift `mu` combines a momentum term (EWMA of recent returns)
/// with mean reversion toward a slowly adapting anchor, `sigma` is the
/// base volatility scaled by the regime and the price level, and `jump`
/// is a rare signed shock whose probability the regime controls. The mid
/// is clamped strictly positive.
#[derive(Debug, Clone)]
pub struct MidPriceProcess {
    mid: f64,
    anchor: f64,
    /// EWMA of per-step returns; the momentum signal.
    momentum: f64,
    /// Base volatility per sqrt-second, as a fraction of the mid.
    base_vol: f64,
    momentum_coeff: f64,
    reversion_coeff: f64,
    /// Per-second rate at which the anchor tracks the mid.
    anchor_adapt: f64,
    /// Lower clamp keeping the mid strictly positive.
    min_mid: f64,
    jump_size: LogNormal<f64>,
}

impl MidPriceProcess {
    /// Start the process at `initial_mid`, clamped no lower than one tick.
    pub fn new(initial_mid: f64, tick_size: f64) -> Self {
        Self {
            mid: initial_mid,
            anchor: initial_mid,
            momentum: 0.0,
            base_vol: 0.002,
            momentum_coeff: 4.0,
            reversion_coeff: 0.05,
            anchor_adapt: 0.002,
            min_mid: tick_size,
            // Median jump near 0.3% of the mid, with a fat right tail.
            jump_size: LogNormal::new(-5.8, 0.8).expect("valid lognormal parameters"),
        }
    }

    /// Current mid price.
    #[must_use]
    #[inline]
    pub fn mid(&self) -> f64 {
        self.mid
    }

    /// The mean-reversion anchor.
    #[must_use]
    #[inline]
    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    /// Momentum signal: EWMA of recent per-step returns.
    #[must_use]
    #[inline]
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Advance the process by `dt_s` seconds under the given regime and
    /// return the new mid.
    pub fn step(&mut self, dt_s: f64, regime: &RegimeParams, rng: &mut ChaCha8Rng) -> f64 {
        let previous = self.mid;

        let drift = self.momentum_coeff * self.momentum * self.mid
            + self.reversion_coeff * (self.anchor - self.mid);
        let sigma = self.base_vol * regime.vol_mult * self.mid;
        let eps: f64 = StandardNormal.sample(rng);

        let jump = if rng.gen_bool(regime.jump_prob.clamp(0.0, 1.0)) {
            let magnitude = self.jump_size.sample(rng) * self.mid;
            if rng.gen_bool(0.5) { magnitude } else { -magnitude }
        } else {
            0.0
        };

        self.mid = (self.mid + drift * dt_s + sigma * dt_s.sqrt() * eps + jump).max(self.min_mid);

        let step_return = (self.mid - previous) / previous;
        self.momentum = 0.9 * self.momentum + 0.1 * step_return;
        self.anchor += self.anchor_adapt * (self.mid - self.anchor) * dt_s.max(1e-9);

        self.mid
    }
}
