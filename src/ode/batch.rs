//! Batched steady-state integration.
//!
//! Every row of the initial-state matrix is integrated independently on the
//! global rayon pool. Results are gathered in input order, so the output does
//! not depend on how the work was scheduled, and one failing trajectory never
//! affects its siblings.

use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use super::solve::{integrate_to_steady_state, SolverConfig, SteadyStateSolution};
use super::traits::DynamicalSystem;

/// Terminal states of a batch, one row per input row.
#[derive(Debug, Clone)]
pub struct BatchSolution {
    /// Per-trajectory results in input order.
    pub solutions: Vec<SteadyStateSolution>,
}

impl BatchSolution {
    /// Number of trajectories.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Terminal states stacked into a matrix (NaN rows for failures).
    pub fn states(&self) -> Array2<f64> {
        let dim = self.solutions.first().map_or(0, |s| s.state.len());
        let mut states = Array2::zeros((self.solutions.len(), dim));
        for (mut row, solution) in states.axis_iter_mut(Axis(0)).zip(&self.solutions) {
            for (dst, src) in row.iter_mut().zip(&solution.state) {
                *dst = *src;
            }
        }
        states
    }

    /// Per-trajectory convergence flags.
    pub fn converged(&self) -> Vec<bool> {
        self.solutions.iter().map(|s| s.status.is_converged()).collect()
    }

    /// Number of trajectories that failed outright.
    pub fn failure_count(&self) -> usize {
        self.solutions
            .iter()
            .filter(|s| !s.status.is_usable())
            .count()
    }
}

/// Integrate each row of `initial_states` in parallel.
pub fn integrate_batch<S>(system: &S, initial_states: ArrayView2<f64>, config: &SolverConfig) -> BatchSolution
where
    S: DynamicalSystem + Sync,
{
    let rows: Vec<Vec<f64>> = initial_states
        .axis_iter(Axis(0))
        .map(|row| row.to_vec())
        .collect();

    let solutions: Vec<SteadyStateSolution> = rows
        .par_iter()
        .map(|y0| integrate_to_steady_state(system, y0, config))
        .collect();

    for (i, solution) in solutions.iter().enumerate() {
        log::debug!(
            "trajectory {}: {:?} at t = {} ({} accepted, {} rejected)",
            i,
            solution.status,
            solution.t_final,
            solution.accepted_steps,
            solution.rejected_steps
        );
    }

    BatchSolution { solutions }
}

/// Sequential counterpart of [`integrate_batch`], used as a reference.
pub fn integrate_batch_sequential<S>(
    system: &S,
    initial_states: ArrayView2<f64>,
    config: &SolverConfig,
) -> BatchSolution
where
    S: DynamicalSystem,
{
    let solutions = initial_states
        .axis_iter(Axis(0))
        .map(|row| integrate_to_steady_state(system, &row.to_vec(), config))
        .collect();

    BatchSolution { solutions }
}
