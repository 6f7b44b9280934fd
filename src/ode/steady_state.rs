//! Steady-state termination criterion.

use serde::{Deserialize, Serialize};

/// Stops integration once the vector field is small relative to the state:
/// `rms(f(t, y)) < atol + rtol * rms(y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyStateEvent {
    /// Relative tolerance. Default: 1e-3
    pub rtol: f64,

    /// Absolute tolerance. Default: 1e-3
    pub atol: f64,
}

impl Default for SteadyStateEvent {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-3,
        }
    }
}

impl SteadyStateEvent {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Whether `state` with derivative `derivative` counts as steady.
    pub fn reached(&self, state: &[f64], derivative: &[f64]) -> bool {
        rms_norm(derivative) < self.atol + self.rtol * rms_norm(state)
    }
}

/// Root-mean-square norm; zero for an empty slice.
pub fn rms_norm(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| v * v).sum();
    (sum / values.len() as f64).sqrt()
}
