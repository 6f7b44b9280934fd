//! Integration of a single trajectory towards steady state.

use serde::{Deserialize, Serialize};

use super::controller::StepController;
use super::dopri5::{Dopri5, ERROR_ORDER};
use super::steady_state::SteadyStateEvent;
use super::traits::DynamicalSystem;
use crate::error::{CellFitError, Result};

/// Configuration of the steady-state integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Start of the simulation horizon. Default: 0.0
    pub t0: f64,

    /// End of the simulation horizon (hours). Default: 48.0
    pub t1: f64,

    /// Initial step size. Default: 0.1
    pub dt0: f64,

    /// Maximum number of accepted plus rejected steps, if any. Default: None
    pub max_steps: Option<usize>,

    /// Adaptive step-size control. Default: rtol = atol = 1e-6
    pub controller: StepController,

    /// Early termination once steady state is reached. Default: rtol = atol = 1e-3
    pub steady_state: Option<SteadyStateEvent>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            t0: 0.0,
            t1: 48.0,
            dt0: 0.1,
            max_steps: None,
            controller: StepController::default(),
            steady_state: Some(SteadyStateEvent::default()),
        }
    }
}

impl SolverConfig {
    /// Set the simulation horizon.
    pub fn with_time_span(mut self, t0: f64, t1: f64) -> Self {
        self.t0 = t0;
        self.t1 = t1;
        self
    }

    /// Set the initial step size.
    pub fn with_dt0(mut self, dt0: f64) -> Self {
        self.dt0 = dt0;
        self
    }

    /// Set the step budget.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the integration tolerances.
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.controller.rtol = rtol;
        self.controller.atol = atol;
        self
    }

    /// Set (or disable) the steady-state event.
    pub fn with_steady_state(mut self, event: Option<SteadyStateEvent>) -> Self {
        self.steady_state = event;
        self
    }
}

/// How a trajectory ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrajectoryStatus {
    /// The steady-state event fired before the horizon.
    Converged,

    /// The horizon was reached without the event firing. The state is the
    /// last computed one and is still usable.
    HorizonReached,

    /// The integrator gave up. The state is filled with NaN.
    Failed(String),
}

impl TrajectoryStatus {
    /// Returns true if the steady-state event fired.
    pub fn is_converged(&self) -> bool {
        matches!(self, TrajectoryStatus::Converged)
    }

    /// Returns true if the trajectory produced a usable state.
    pub fn is_usable(&self) -> bool {
        !matches!(self, TrajectoryStatus::Failed(_))
    }
}

/// Terminal state of one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteadyStateSolution {
    /// Terminal state (NaN-filled on failure).
    pub state: Vec<f64>,

    /// Time at which integration stopped.
    pub t_final: f64,

    /// Number of accepted steps.
    pub accepted_steps: usize,

    /// Number of rejected steps.
    pub rejected_steps: usize,

    /// How the trajectory ended.
    pub status: TrajectoryStatus,
}

impl SteadyStateSolution {
    fn failed(dim: usize, t: f64, accepted: usize, rejected: usize, reason: String) -> Self {
        Self {
            state: vec![f64::NAN; dim],
            t_final: t,
            accepted_steps: accepted,
            rejected_steps: rejected,
            status: TrajectoryStatus::Failed(reason),
        }
    }

    /// The terminal state, or an error for a failed trajectory.
    pub fn into_state(self) -> Result<Vec<f64>> {
        match self.status {
            TrajectoryStatus::Failed(reason) => Err(CellFitError::IntegrationFailure(format!(
                "{} (t = {})",
                reason, self.t_final
            ))),
            _ => Ok(self.state),
        }
    }
}

/// Integrate `system` from `y0` until steady state or the end of the horizon.
///
/// Never panics on numerical trouble: step-size underflow, non-finite values
/// and an exhausted step budget are reported through
/// [`TrajectoryStatus::Failed`].
pub fn integrate_to_steady_state(
    system: &impl DynamicalSystem,
    y0: &[f64],
    config: &SolverConfig,
) -> SteadyStateSolution {
    let dim = y0.len();
    if dim != system.dimension() {
        return SteadyStateSolution::failed(
            dim,
            config.t0,
            0,
            0,
            format!(
                "initial state has {} entries, system dimension is {}",
                dim,
                system.dimension()
            ),
        );
    }

    let controller = &config.controller;
    let mut stepper = Dopri5::new(dim);
    let mut y = y0.to_vec();
    let mut t = config.t0;
    let mut dt = config.dt0;
    if let Some(dt_max) = controller.dt_max {
        dt = dt.min(dt_max);
    }
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    stepper.prime(system, t, &y);
    if stepper.derivative().iter().any(|v| !v.is_finite()) {
        return SteadyStateSolution::failed(
            dim,
            t,
            0,
            0,
            "non-finite derivative at initial state".to_string(),
        );
    }

    while t < config.t1 {
        if let Some(max_steps) = config.max_steps {
            if accepted + rejected >= max_steps {
                return SteadyStateSolution::failed(
                    dim,
                    t,
                    accepted,
                    rejected,
                    format!("step budget of {} exhausted at t = {}", max_steps, t),
                );
            }
        }
        if dt < controller.dt_min {
            return SteadyStateSolution::failed(
                dim,
                t,
                accepted,
                rejected,
                format!("step size underflow (dt = {:e}) at t = {}", dt, t),
            );
        }

        // land exactly on the horizon
        let last = t + dt >= config.t1;
        let h = if last { config.t1 - t } else { dt };

        let err = stepper.attempt(
            system,
            t,
            &y,
            h,
            controller.rtol,
            controller.atol,
        );
        let decision = controller.decide(h, err, ERROR_ORDER);

        if !decision.accept {
            rejected += 1;
            dt = decision.next_dt;
            continue;
        }

        stepper.accept(&mut y);
        t = if last { config.t1 } else { t + h };
        accepted += 1;
        if !last {
            dt = decision.next_dt;
        }

        if y.iter().any(|v| !v.is_finite()) {
            return SteadyStateSolution::failed(
                dim,
                t,
                accepted,
                rejected,
                format!("non-finite state at t = {}", t),
            );
        }

        if let Some(event) = &config.steady_state {
            if event.reached(&y, stepper.derivative()) {
                return SteadyStateSolution {
                    state: y,
                    t_final: t,
                    accepted_steps: accepted,
                    rejected_steps: rejected,
                    status: TrajectoryStatus::Converged,
                };
            }
        }
    }

    SteadyStateSolution {
        state: y,
        t_final: t,
        accepted_steps: accepted,
        rejected_steps: rejected,
        status: TrajectoryStatus::HorizonReached,
    }
}
