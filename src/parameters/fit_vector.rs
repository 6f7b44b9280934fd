//! Log-space candidate parameter vectors
//!
//! The objective function is parameterised by a short ordered vector of
//! log-transformed values extracted from a [`ParameterSet`]. The entries are:
//!
//! | index | meaning | reinjected as |
//! |---|---|---|
//! | 0 | `a_r / a_a` | `a_r = a_a * exp(v)` |
//! | 1 | `K_e` | `K_e = K_nu = exp(v)` |
//! | 2 | `nu_max` | `nu_max = exp(v)` |
//! | 3 | `kcm` | `kcm = exp(v)` |
//!
//! `K_nu` is tied to `K_e` on reinjection.

use crate::error::{CellFitError, Result};
use crate::parameters::ParameterSet;
use ndarray::Array1;

/// Number of entries in a candidate vector.
pub const FIT_VECTOR_LEN: usize = 4;

/// Position of the ribosomal/metabolic transcription-rate ratio.
pub const RIBOSOME_RATIO: usize = 0;
/// Position of the elongation/charging affinity constant.
pub const AFFINITY: usize = 1;
/// Position of the maximum nutrient import (tRNA charging) rate.
pub const MAX_IMPORT_RATE: usize = 2;
/// Position of the chloramphenicol binding constant.
pub const DRUG_BINDING: usize = 3;

/// Human-readable names of the candidate vector entries.
pub const FIT_VECTOR_NAMES: [&str; FIT_VECTOR_LEN] = ["a_r/a_a", "K_e=K_nu", "nu_max", "kcm"];

/// Extract the log-space candidate vector from a full parameter set.
pub fn extract_log_params(params: &ParameterSet) -> Result<Array1<f64>> {
    let ratio = params.get("a_r")? / params.get("a_a")?;
    let values = [ratio, params.get("K_e")?, params.get("nu_max")?, params.get("kcm")?];

    for (name, value) in FIT_VECTOR_NAMES.iter().zip(values.iter()) {
        if !(*value > 0.0) {
            return Err(CellFitError::InvalidParameter(format!(
                "{} must be positive to take its logarithm, got {}",
                name, value
            )));
        }
    }

    Ok(Array1::from_iter(values.iter().map(|v| v.ln())))
}

/// Substitute a log-space candidate vector into a copy of `baseline`.
///
/// The baseline is not modified.
pub fn apply_log_params(baseline: &ParameterSet, log_params: &Array1<f64>) -> Result<ParameterSet> {
    if log_params.len() != FIT_VECTOR_LEN {
        return Err(CellFitError::DimensionMismatch(format!(
            "Expected {} log-parameters, got {}",
            FIT_VECTOR_LEN,
            log_params.len()
        )));
    }

    let linear = log_params.mapv(f64::exp);
    let mut params = baseline.clone();

    let a_a = baseline.get("a_a")?;
    params.set("a_r", a_a * linear[RIBOSOME_RATIO]);
    params.set("K_e", linear[AFFINITY]);
    params.set("K_nu", linear[AFFINITY]);
    params.set("nu_max", linear[MAX_IMPORT_RATE]);
    params.set("kcm", linear[DRUG_BINDING]);

    Ok(params)
}
