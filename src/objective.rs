//! Steady-state fit objective.
//!
//! For a candidate parameter vector the objective re-parameterises the cell
//! model, integrates every experimental setup to steady state, reads off the
//! growth rate and ribosomal mass fraction, and returns the error-weighted sum
//! of squared residuals
//!
//! ```text
//! SOS = Σ_setups Σ_{l, φr} ((predicted − measured) / error)²
//! ```
//!
//! The value is the sum of squares itself, not a log-likelihood. Callers that
//! maximise should use [`SteadyStateObjective::log_likelihood`], which negates
//! it.
//!
//! Trajectories that hit the time horizon without meeting the steady-state
//! criterion are used as they are. A trajectory that fails outright yields NaN
//! observables, so the objective is NaN for that candidate.

use ndarray::{Array1, Array2};

use crate::data::ExperimentalData;
use crate::error::{CellFitError, Result};
use crate::model::CellModel;
use crate::ode::{integrate_batch, BatchSolution, SolverConfig};
use crate::parameters::{apply_log_params, extract_log_params, ParameterSet, FIT_VECTOR_LEN};
use crate::problem::Problem;

/// Model predictions for every setup.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// (growth rate, ribosomal mass fraction) per setup.
    pub observables: Array2<f64>,

    /// Raw integration results.
    pub batch: BatchSolution,
}

/// Error-weighted sum-of-squares objective over steady-state predictions.
#[derive(Debug, Clone)]
pub struct SteadyStateObjective {
    model: CellModel,
    baseline: ParameterSet,
    x0s: Array2<f64>,
    data: ExperimentalData,
    solver: SolverConfig,
}

impl SteadyStateObjective {
    /// Create the objective.
    ///
    /// # Arguments
    ///
    /// * `model` - Cell model carrying the circuit; its parameters are replaced on every evaluation
    /// * `baseline` - Full parameter set into which candidate vectors are substituted
    /// * `x0s` - One initial state per setup, row-aligned with `data`
    /// * `data` - Experimental measurements and error scales
    /// * `solver` - Integrator settings
    pub fn new(
        model: CellModel,
        baseline: ParameterSet,
        x0s: Array2<f64>,
        data: ExperimentalData,
        solver: SolverConfig,
    ) -> Result<Self> {
        if x0s.nrows() != data.len() {
            return Err(CellFitError::DimensionMismatch(format!(
                "{} initial states for {} setups",
                x0s.nrows(),
                data.len()
            )));
        }
        if x0s.ncols() != model.layout().dimension() {
            return Err(CellFitError::DimensionMismatch(format!(
                "initial states have {} entries, model state has {}",
                x0s.ncols(),
                model.layout().dimension()
            )));
        }
        // fail early on an incomplete baseline
        extract_log_params(&baseline)?;

        Ok(Self {
            model,
            baseline,
            x0s,
            data,
            solver,
        })
    }

    pub fn baseline(&self) -> &ParameterSet {
        &self.baseline
    }

    pub fn data(&self) -> &ExperimentalData {
        &self.data
    }

    pub fn initial_states(&self) -> &Array2<f64> {
        &self.x0s
    }

    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    /// The baseline parameters as a log-space candidate vector.
    pub fn default_log_params(&self) -> Result<Array1<f64>> {
        extract_log_params(&self.baseline)
    }

    /// Integrate every setup with `params` and compute the observables.
    pub fn predict(&self, params: &ParameterSet) -> Result<Prediction> {
        let model = self.model.with_parameters(params)?;
        let batch = integrate_batch(&model, self.x0s.view(), &self.solver);

        let failures = batch.failure_count();
        if failures > 0 {
            log::warn!(
                "{} of {} trajectories failed; their observables are NaN",
                failures,
                batch.len()
            );
        }

        let observables = model.observables(batch.states().view());
        Ok(Prediction { observables, batch })
    }

    /// Normalised residuals `(predicted - measured) / error` for a full
    /// parameter set, flattened setup by setup.
    pub fn residuals_for_parameters(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        let prediction = self.predict(params)?;
        let residuals = (&prediction.observables - &self.data.measurements) / &self.data.errors;
        Ok(Array1::from_iter(residuals.iter().copied()))
    }

    /// Sum of squares for a full parameter set, without a log-space round trip.
    pub fn sos_for_parameters(&self, params: &ParameterSet) -> Result<f64> {
        let residuals = self.residuals_for_parameters(params)?;
        let sos: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        if !sos.is_finite() {
            log::warn!("Non-finite sum of squares: {}", sos);
        }
        Ok(sos)
    }

    /// Sum of squares for a log-space candidate vector.
    pub fn sos(&self, log_params: &Array1<f64>) -> Result<f64> {
        self.eval_cost(log_params)
    }

    /// Negated sum of squares, for maximisation-oriented callers.
    pub fn log_likelihood(&self, log_params: &Array1<f64>) -> Result<f64> {
        Ok(-self.sos(log_params)?)
    }
}

impl Problem for SteadyStateObjective {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let full = apply_log_params(&self.baseline, params)?;
        self.residuals_for_parameters(&full)
    }

    fn parameter_count(&self) -> usize {
        FIT_VECTOR_LEN
    }

    fn residual_count(&self) -> usize {
        2 * self.data.len()
    }
}
