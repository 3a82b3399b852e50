//! Intraday activity curve.

/// U-shaped multiplier on arrival rate over the trading session.
///
/// Activity peaks at the open and close and bottoms out mid-session. The
/// curve is `floor + amplitude * (2x - 1)^2` for session fraction `x`, so
/// it is bounded within `[floor, floor + amplitude]` and always positive.
/// Time past one session length wraps around to the next session.
#[derive(Debug, Clone)]
pub struct IntradayCurve {
    session_length_s: u32,
    floor: f64,
    amplitude: f64,
}

impl IntradayCurve {
    /// Curve with the default shape: 2x activity at the edges, 0.5x in the
    /// middle of the session.
    pub fn new(session_length_s: u32) -> Self {
        Self {
            session_length_s,
            floor: 0.5,
            amplitude: 1.5,
        }
    }

    /// Activity multiplier at the given simulation time.
    #[must_use]
    pub fn activity(&self, now_ns: u64) -> f64 {
        let seconds = now_ns as f64 / 1e9;
        let session = self.session_length_s as f64;
        let fraction = (seconds % session) / session;
        self.floor + self.amplitude * (2.0 * fraction - 1.0).powi(2)
    }
}
