//! Least-squares problem trait.
//!
//! This module defines the `Problem` trait: a vector of normalised residuals
//! as a function of a parameter vector, and the sum-of-squares cost built from
//! it. Fitting routines and the grid sweep only ever see this interface.

use ndarray::Array1;

use crate::error::Result;

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the sum of squared residuals at the given parameters.
    ///
    /// Residuals are summed in index order so the result is reproducible
    /// bit for bit.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Shifted;

    impl Problem for Shifted {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            Ok(array![params[0] - 1.0, 2.0 * (params[1] + 1.0)])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_eval_cost() {
        assert_eq!(Shifted.eval_cost(&array![1.0, -1.0]).unwrap(), 0.0);
        assert_eq!(Shifted.eval_cost(&array![3.0, 0.0]).unwrap(), 8.0);
    }
}
