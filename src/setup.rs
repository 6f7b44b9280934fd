//! Per-setup initial states.
//!
//! Each experimental setup gets its own copy of the default state vector with
//! the nutrient quality and inducer slots overwritten by the setup's values.

use ndarray::{Array2, ArrayView2};

use crate::error::{CellFitError, Result};
use crate::model::{INDUCER_INDEX, NUTRIENT_QUALITY_INDEX};

/// Build one initial state per setup row, overwriting the host's nutrient
/// quality and inducer slots.
pub fn initial_states(x0_default: &[f64], setups: ArrayView2<f64>) -> Result<Array2<f64>> {
    initial_states_at(x0_default, setups, NUTRIENT_QUALITY_INDEX, INDUCER_INDEX)
}

/// Build one initial state per setup row, writing setup column 0 to
/// `first_index` and column 1 to `second_index`.
///
/// `x0_default` is only read.
pub fn initial_states_at(
    x0_default: &[f64],
    setups: ArrayView2<f64>,
    first_index: usize,
    second_index: usize,
) -> Result<Array2<f64>> {
    let dim = x0_default.len();
    if first_index >= dim || second_index >= dim {
        return Err(CellFitError::DimensionMismatch(format!(
            "setup slots ({}, {}) out of range for a state of length {}",
            first_index, second_index, dim
        )));
    }
    if setups.ncols() != 2 {
        return Err(CellFitError::DimensionMismatch(format!(
            "setups have {} columns, expected 2",
            setups.ncols()
        )));
    }

    let mut x0s = Array2::from_shape_fn((setups.nrows(), dim), |(_, j)| x0_default[j]);
    for (i, setup) in setups.rows().into_iter().enumerate() {
        x0s[[i, first_index]] = setup[0];
        x0s[[i, second_index]] = setup[1];
    }
    Ok(x0s)
}
