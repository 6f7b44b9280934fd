//! Adaptive step-size control.
//!
//! The controller turns the scaled error norm of an attempted step into an
//! accept/reject decision and the size of the next step. It is a PID
//! controller in integral-only form, which reduces to the classic
//! `dt * safety * err^(-1/order)` rule.

use serde::{Deserialize, Serialize};

/// Step-size controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepController {
    /// Relative tolerance. Default: 1e-6
    pub rtol: f64,

    /// Absolute tolerance. Default: 1e-6
    pub atol: f64,

    /// Safety factor applied to the optimal step. Default: 0.9
    pub safety: f64,

    /// Smallest allowed shrink factor. Default: 0.2
    pub factor_min: f64,

    /// Largest allowed growth factor. Default: 10.0
    pub factor_max: f64,

    /// Upper bound on the step size, if any. Default: None
    pub dt_max: Option<f64>,

    /// Step sizes below this are treated as a failure. Default: 1e-12
    pub dt_min: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-6,
            safety: 0.9,
            factor_min: 0.2,
            factor_max: 10.0,
            dt_max: None,
            dt_min: 1e-12,
        }
    }
}

/// Outcome of judging one attempted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecision {
    /// Whether the attempted step satisfies the tolerances.
    pub accept: bool,

    /// Step size to use next (for a retry if rejected).
    pub next_dt: f64,
}

impl StepController {
    /// Create a controller with the given tolerances and default factors.
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    /// Decide on a step of size `dt` whose scaled error norm is `err_norm`.
    ///
    /// `order` is the order of the error estimate plus one.
    pub fn decide(&self, dt: f64, err_norm: f64, order: f64) -> StepDecision {
        if !err_norm.is_finite() {
            return StepDecision {
                accept: false,
                next_dt: dt * self.factor_min,
            };
        }

        let accept = err_norm <= 1.0;
        let raw = if err_norm == 0.0 {
            self.factor_max
        } else {
            self.safety * err_norm.powf(-1.0 / order)
        };

        // never grow after a rejection
        let upper = if accept { self.factor_max } else { 1.0 };
        let factor = raw.clamp(self.factor_min, upper);

        let mut next_dt = dt * factor;
        if let Some(dt_max) = self.dt_max {
            next_dt = next_dt.min(dt_max);
        }

        StepDecision { accept, next_dt }
    }
}
