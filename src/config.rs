//! Run configuration.
//!
//! [`RunConfig`] gathers the solver, loader and sweep settings plus the file
//! locations used by the `param_constraints` binary. Every field has a default
//! reproducing the reference analysis, so a missing or partial JSON file is
//! fine.

use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::data::LoaderConfig;
use crate::error::{CellFitError, Result};
use crate::ode::SolverConfig;
use crate::parameters::{AFFINITY, DRUG_BINDING};
use crate::sweep::GridSweep;

/// Grid sweep settings.
///
/// Each axis spans fold changes `low..=high` of the baseline value of its
/// candidate entry, log-evenly spaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Grid points per axis. Default: 51
    pub points: usize,

    /// Smallest fold change. Default: 0.1
    pub low: f64,

    /// Largest fold change. Default: 30.0
    pub high: f64,

    /// Candidate entry swept along rows. Default: K_e (1)
    pub index_1: usize,

    /// Candidate entry swept along columns. Default: kcm (3)
    pub index_2: usize,

    /// Evaluate cells on the rayon pool. Default: false
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            points: 51,
            low: 0.1,
            high: 30.0,
            index_1: AFFINITY,
            index_2: DRUG_BINDING,
            parallel: false,
        }
    }
}

impl SweepConfig {
    /// Set the number of grid points per axis.
    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    /// Set the fold-change range.
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    /// Set the swept candidate entries.
    pub fn with_indices(mut self, index_1: usize, index_2: usize) -> Self {
        self.index_1 = index_1;
        self.index_2 = index_2;
        self
    }

    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the sweep around a log-space baseline candidate.
    pub fn build(&self, baseline: Array1<f64>) -> Result<GridSweep> {
        let default_at = |index: usize| -> Result<f64> {
            baseline.get(index).map(|v| v.exp()).ok_or_else(|| {
                CellFitError::DimensionMismatch(format!(
                    "sweep index {} out of range for a candidate of length {}",
                    index,
                    baseline.len()
                ))
            })
        };

        let axis_1 = GridSweep::fold_change_axis(default_at(self.index_1)?, self.low, self.high, self.points)?;
        let axis_2 = GridSweep::fold_change_axis(default_at(self.index_2)?, self.low, self.high, self.points)?;
        GridSweep::new(axis_1, axis_2, self.index_1, self.index_2, baseline)
    }
}

/// Top-level configuration of a parameter-constraint run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Measurement table.
    pub data_path: PathBuf,

    /// Error and replicate table, row-aligned with `data_path`.
    pub errors_path: PathBuf,

    /// Where the result surface is written (or read with `--load`).
    pub output_path: PathBuf,

    pub solver: SolverConfig,
    pub loader: LoaderConfig,
    pub sweep: SweepConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/growth_rib_fit_notext.csv"),
            errors_path: PathBuf::from("data/growth_rib_fit_errors_notext.csv"),
            output_path: PathBuf::from("fit_outcomes/param_constraints.json"),
            solver: SolverConfig::default(),
            loader: LoaderConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Read a configuration from a JSON file, falling back to defaults if the
    /// file is missing or malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded run configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No configuration at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
