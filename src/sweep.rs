//! Two-parameter grid sweep.
//!
//! A [`GridSweep`] evaluates an objective over the Cartesian product of two
//! axes of log-space values. At cell `(i, j)` the baseline candidate vector is
//! copied, its entries `index_1` and `index_2` are overwritten with
//! `axis_1[i]` and `axis_2[j]`, and the objective value is stored in
//! [`ResultSurface::values`]`[[i, j]]`.
//!
//! Cells share no mutable state, so [`GridSweep::run`] (row-major, sequential)
//! and [`GridSweep::run_parallel`] (rayon) fill identical surfaces. Any error
//! aborts the sweep; partial surfaces are not kept.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CellFitError, Result};

/// Grid of candidate vectors around a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSweep {
    axis_1: Array1<f64>,
    axis_2: Array1<f64>,
    index_1: usize,
    index_2: usize,
    baseline: Array1<f64>,
}

impl GridSweep {
    /// Create a sweep.
    ///
    /// # Arguments
    ///
    /// * `axis_1` - Values written to `baseline[index_1]`, one per surface row
    /// * `axis_2` - Values written to `baseline[index_2]`, one per surface column
    /// * `index_1`, `index_2` - Distinct positions in the candidate vector
    /// * `baseline` - Candidate vector supplying every other entry
    pub fn new(
        axis_1: Array1<f64>,
        axis_2: Array1<f64>,
        index_1: usize,
        index_2: usize,
        baseline: Array1<f64>,
    ) -> Result<Self> {
        if axis_1.is_empty() || axis_2.is_empty() {
            return Err(CellFitError::InvalidInput(
                "grid axes must not be empty".to_string(),
            ));
        }
        if index_1 >= baseline.len() || index_2 >= baseline.len() {
            return Err(CellFitError::DimensionMismatch(format!(
                "sweep indices ({}, {}) out of range for a candidate of length {}",
                index_1,
                index_2,
                baseline.len()
            )));
        }
        if index_1 == index_2 {
            return Err(CellFitError::InvalidInput(format!(
                "both axes overwrite candidate entry {}",
                index_1
            )));
        }

        Ok(Self {
            axis_1,
            axis_2,
            index_1,
            index_2,
            baseline,
        })
    }

    /// Log-space axis `linspace(ln low, ln high, n) + ln default`, i.e. `n`
    /// log-evenly spaced fold changes of `default` between `low` and `high`.
    pub fn fold_change_axis(default: f64, low: f64, high: f64, n: usize) -> Result<Array1<f64>> {
        if !(default > 0.0 && low > 0.0 && high > 0.0) {
            return Err(CellFitError::InvalidParameter(format!(
                "fold-change axis needs positive values, got default={}, low={}, high={}",
                default, low, high
            )));
        }
        if n == 0 {
            return Err(CellFitError::InvalidInput(
                "fold-change axis needs at least one point".to_string(),
            ));
        }

        let shift = default.ln();
        if n == 1 {
            return Ok(Array1::from_elem(1, low.ln() + shift));
        }
        Ok(Array1::linspace(low.ln(), high.ln(), n) + shift)
    }

    pub fn axis_1(&self) -> &Array1<f64> {
        &self.axis_1
    }

    pub fn axis_2(&self) -> &Array1<f64> {
        &self.axis_2
    }

    pub fn baseline(&self) -> &Array1<f64> {
        &self.baseline
    }

    /// Surface shape `(len(axis_1), len(axis_2))`.
    pub fn shape(&self) -> (usize, usize) {
        (self.axis_1.len(), self.axis_2.len())
    }

    /// Candidate vector for cell `(i, j)`.
    pub fn candidate(&self, i: usize, j: usize) -> Array1<f64> {
        let mut candidate = self.baseline.clone();
        candidate[self.index_1] = self.axis_1[i];
        candidate[self.index_2] = self.axis_2[j];
        candidate
    }

    /// Evaluate every cell in row-major order.
    ///
    /// `progress` is called with `(i, j)` after each cell completes.
    pub fn run<F, P>(&self, mut objective: F, mut progress: P) -> Result<ResultSurface>
    where
        F: FnMut(&Array1<f64>) -> Result<f64>,
        P: FnMut(usize, usize),
    {
        let (rows, cols) = self.shape();
        log::info!("Sweeping {}x{} grid sequentially", rows, cols);

        let mut values = Array2::zeros((rows, cols));
        for i in 0..rows {
            for j in 0..cols {
                let value = objective(&self.candidate(i, j))?;
                log::debug!("cell ({}, {}) -> {}", i, j, value);
                values[[i, j]] = value;
                progress(i, j);
            }
        }

        ResultSurface::new(self.axis_1.clone(), self.axis_2.clone(), values)
    }

    /// Evaluate every cell on the rayon pool.
    pub fn run_parallel<F>(&self, objective: F) -> Result<ResultSurface>
    where
        F: Fn(&Array1<f64>) -> Result<f64> + Sync,
    {
        let (rows, cols) = self.shape();
        log::info!("Sweeping {}x{} grid in parallel", rows, cols);

        let flat: Vec<f64> = (0..rows * cols)
            .into_par_iter()
            .map(|k| {
                let (i, j) = (k / cols, k % cols);
                let value = objective(&self.candidate(i, j))?;
                log::debug!("cell ({}, {}) -> {}", i, j, value);
                Ok(value)
            })
            .collect::<Result<Vec<f64>>>()?;

        let values = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| CellFitError::DimensionMismatch(e.to_string()))?;
        ResultSurface::new(self.axis_1.clone(), self.axis_2.clone(), values)
    }
}

/// Objective values over a sweep grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSurface {
    /// Row axis (log-space).
    pub axis_1: Array1<f64>,

    /// Column axis (log-space).
    pub axis_2: Array1<f64>,

    /// `values[[i, j]]` is the objective at `(axis_1[i], axis_2[j])`.
    pub values: Array2<f64>,
}

/// On-disk form of one value. JSON has no literal for NaN or the infinities,
/// so those are written as the strings `"nan"`, `"inf"` and `"-inf"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Finite(f64),
    NonFinite(NonFinite),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum NonFinite {
    #[serde(rename = "nan")]
    Nan,
    #[serde(rename = "inf")]
    PosInf,
    #[serde(rename = "-inf")]
    NegInf,
}

impl From<f64> for StoredValue {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            StoredValue::NonFinite(NonFinite::Nan)
        } else if v == f64::INFINITY {
            StoredValue::NonFinite(NonFinite::PosInf)
        } else if v == f64::NEG_INFINITY {
            StoredValue::NonFinite(NonFinite::NegInf)
        } else {
            StoredValue::Finite(v)
        }
    }
}

impl From<StoredValue> for f64 {
    fn from(v: StoredValue) -> Self {
        match v {
            StoredValue::Finite(v) => v,
            StoredValue::NonFinite(NonFinite::Nan) => f64::NAN,
            StoredValue::NonFinite(NonFinite::PosInf) => f64::INFINITY,
            StoredValue::NonFinite(NonFinite::NegInf) => f64::NEG_INFINITY,
        }
    }
}

fn store(values: impl IntoIterator<Item = f64>) -> Vec<StoredValue> {
    values.into_iter().map(StoredValue::from).collect()
}

fn restore(values: Vec<StoredValue>) -> Vec<f64> {
    values.into_iter().map(f64::from).collect()
}

/// On-disk form of a surface.
#[derive(Serialize, Deserialize)]
struct SurfaceFile {
    axis_1: Vec<StoredValue>,
    axis_2: Vec<StoredValue>,
    values: Vec<Vec<StoredValue>>,
}

impl ResultSurface {
    /// Create a surface, checking that `values` has shape
    /// `(len(axis_1), len(axis_2))`.
    pub fn new(axis_1: Array1<f64>, axis_2: Array1<f64>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (axis_1.len(), axis_2.len()) {
            return Err(CellFitError::DimensionMismatch(format!(
                "surface values have shape {:?}, axes have lengths ({}, {})",
                values.dim(),
                axis_1.len(),
                axis_2.len()
            )));
        }
        Ok(Self {
            axis_1,
            axis_2,
            values,
        })
    }

    /// Smallest finite value and its cell, if any.
    pub fn min(&self) -> Option<((usize, usize), f64)> {
        self.finite_cells()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Largest finite value and its cell, if any.
    pub fn max(&self) -> Option<((usize, usize), f64)> {
        self.finite_cells()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Number of cells holding NaN or an infinity.
    pub fn non_finite_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }

    fn finite_cells(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.values
            .indexed_iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(idx, v)| (idx, *v))
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_file())?)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SurfaceFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Write the surface to `path` as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &self.to_file())?;
        log::info!("Saved {:?} surface to {}", self.values.dim(), path.display());
        Ok(())
    }

    /// Read a surface previously written by [`ResultSurface::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let file: SurfaceFile = serde_json::from_reader(reader)?;
        let surface = Self::from_file(file)?;
        log::info!("Loaded {:?} surface from {}", surface.values.dim(), path.display());
        Ok(surface)
    }

    fn to_file(&self) -> SurfaceFile {
        SurfaceFile {
            axis_1: store(self.axis_1.iter().copied()),
            axis_2: store(self.axis_2.iter().copied()),
            values: self
                .values
                .rows()
                .into_iter()
                .map(|row| store(row.iter().copied()))
                .collect(),
        }
    }

    fn from_file(file: SurfaceFile) -> Result<Self> {
        let rows = file.values.len();
        let cols = file.axis_2.len();
        if let Some((i, row)) = file
            .values
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != cols)
        {
            return Err(CellFitError::DimensionMismatch(format!(
                "surface row {} has {} values, expected {}",
                i,
                row.len(),
                cols
            )));
        }

        let flat = restore(file.values.into_iter().flatten().collect());
        let values = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| CellFitError::DimensionMismatch(e.to_string()))?;

        Self::new(
            Array1::from(restore(file.axis_1)),
            Array1::from(restore(file.axis_2)),
            values,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn quadratic(v: &Array1<f64>) -> Result<f64> {
        Ok(v.iter().enumerate().map(|(k, x)| (k as f64 + 1.0) * x * x).sum())
    }

    fn sweep() -> GridSweep {
        GridSweep::new(
            array![-1.0, 0.0, 1.0],
            array![0.5, 1.5],
            1,
            3,
            array![0.1, 0.2, 0.3, 0.4],
        )
        .unwrap()
    }

    #[test]
    fn test_candidate_substitution() {
        let sweep = sweep();
        let c = sweep.candidate(2, 1);

        assert_eq!(c, array![0.1, 1.0, 0.3, 1.5]);
        // baseline untouched
        assert_eq!(sweep.baseline(), &array![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_run_visits_row_major() {
        let sweep = sweep();
        let mut visited = Vec::new();

        let surface = sweep.run(quadratic, |i, j| visited.push((i, j))).unwrap();

        assert_eq!(
            visited,
            vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
        );
        assert_eq!(surface.values.dim(), (3, 2));
        assert_relative_eq!(
            surface.values[[0, 1]],
            quadratic(&array![0.1, -1.0, 0.3, 1.5]).unwrap()
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sweep = sweep();

        let sequential = sweep.run(quadratic, |_, _| {}).unwrap();
        let parallel = sweep.run_parallel(quadratic).unwrap();

        for (a, b) in sequential.values.iter().zip(parallel.values.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_error_aborts_sweep() {
        let sweep = sweep();
        let mut calls = 0;

        let result = sweep.run(
            |v| {
                if v[1] > 0.5 {
                    Err(CellFitError::Other("boom".to_string()))
                } else {
                    Ok(0.0)
                }
            },
            |_, _| calls += 1,
        );

        assert!(result.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_invalid_indices() {
        let base = array![0.0, 0.0, 0.0, 0.0];
        assert!(GridSweep::new(array![1.0], array![1.0], 1, 1, base.clone()).is_err());
        assert!(GridSweep::new(array![1.0], array![1.0], 0, 4, base.clone()).is_err());
        assert!(GridSweep::new(Array1::zeros(0), array![1.0], 0, 1, base).is_err());
    }

    #[test]
    fn test_fold_change_axis() {
        let axis = GridSweep::fold_change_axis(5800.0, 0.1, 30.0, 51).unwrap();

        assert_eq!(axis.len(), 51);
        assert_relative_eq!(axis[0].exp(), 580.0, max_relative = 1e-12);
        assert_relative_eq!(axis[50].exp(), 174_000.0, max_relative = 1e-12);
        assert!(GridSweep::fold_change_axis(-1.0, 0.1, 30.0, 5).is_err());
    }

    #[test]
    fn test_non_finite_cells_round_trip_through_json() {
        let surface = ResultSurface::new(
            array![0.0, 1.0],
            array![2.0, 3.0],
            array![[f64::NAN, f64::INFINITY], [0.1 + 0.2, f64::NEG_INFINITY]],
        )
        .unwrap();

        let json = surface.to_json().unwrap();
        assert!(json.contains("\"nan\""));
        assert!(json.contains("\"inf\""));
        assert!(json.contains("\"-inf\""));

        let loaded = ResultSurface::from_json(&json).unwrap();
        assert!(loaded.values[[0, 0]].is_nan());
        assert_eq!(loaded.values[[0, 1]], f64::INFINITY);
        assert_eq!(loaded.values[[1, 1]], f64::NEG_INFINITY);
        assert_eq!(loaded.values[[1, 0]].to_bits(), (0.1f64 + 0.2).to_bits());
        assert_eq!(loaded.min(), Some(((1, 0), 0.1 + 0.2)));
        assert_eq!(loaded.non_finite_count(), 3);
    }

    #[test]
    fn test_infinite_cell_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.json");
        let surface =
            ResultSurface::new(array![0.0, 1.0], array![2.0], array![[f64::INFINITY], [1.5]])
                .unwrap();

        surface.save_json(&path).unwrap();
        let loaded = ResultSurface::load_json(&path).unwrap();

        assert_eq!(loaded, surface);
    }

    #[test]
    fn test_unknown_marker_rejected() {
        let json = r#"{"axis_1":[0.0],"axis_2":[0.0],"values":[["infinity"]]}"#;
        assert!(matches!(
            ResultSurface::from_json(json),
            Err(CellFitError::JsonError(_))
        ));
    }

    #[test]
    fn test_ragged_surface_rejected() {
        let json = r#"{"axis_1":[0.0,1.0],"axis_2":[0.0,1.0],"values":[[1.0,2.0],[3.0]]}"#;
        assert!(matches!(
            ResultSurface::from_json(json),
            Err(CellFitError::DimensionMismatch(_))
        ));

        let json = r#"{"axis_1":[0.0],"axis_2":[0.0],"values":[[1.0],[2.0]]}"#;
        assert!(ResultSurface::from_json(json).is_err());
    }
}
