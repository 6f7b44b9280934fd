//! Adaptive ODE integration to steady state.
//!
//! This module provides an explicit Dormand-Prince 5(4) integrator with
//! adaptive step-size control and a steady-state termination event, plus a
//! batched driver that integrates many initial states in parallel.
//!
//! The interface is deliberately narrow: a [`DynamicalSystem`], a batch of
//! initial states and a [`SolverConfig`] go in; one terminal state and one
//! [`TrajectoryStatus`] per trajectory come out.

pub mod batch;
pub mod controller;
pub mod dopri5;
pub mod solve;
pub mod steady_state;
pub mod traits;

// Re-export key types
pub use batch::{integrate_batch, integrate_batch_sequential, BatchSolution};
pub use controller::{StepController, StepDecision};
pub use dopri5::Dopri5;
pub use solve::{integrate_to_steady_state, SolverConfig, SteadyStateSolution, TrajectoryStatus};
pub use steady_state::{rms_norm, SteadyStateEvent};
pub use traits::DynamicalSystem;
