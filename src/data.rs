//! Experimental data loading.
//!
//! The measurement table holds one row per (nutrient, chloramphenicol)
//! condition: column 0 is the growth rate (1/h), column 2 the ribosomal mass
//! fraction and column 3 the chloramphenicol concentration in µM. Rows come in
//! contiguous blocks of fixed size, one block per nutrient quality, ordered
//! from the worst nutrient to the best. The error table is row-aligned with it:
//! columns 0 and 2 are the standard deviations of growth rate and ribosome
//! fraction, columns 4 and 5 the replicate counts.

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{CellFitError, Result};

/// Column of the growth rate in both tables.
pub const GROWTH_RATE_COL: usize = 0;
/// Column of the ribosomal mass fraction in both tables.
pub const RIBOSOME_FRACTION_COL: usize = 2;
/// Column of the inducer concentration (µM) in the measurement table.
pub const INDUCER_COL: usize = 3;
/// Columns of the replicate counts in the error table.
pub const REPLICATE_COLS: (usize, usize) = (4, 5);

/// How measurement errors are turned into residual scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorScaling {
    /// Column means of the whole error table, broadcast to every retained row.
    #[default]
    MeanBroadcast,

    /// Per-row standard deviation divided by the square root of the
    /// replicate count.
    ReplicateScaled,
}

/// Settings of the experimental data loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rows with a growth rate at or below this are dropped. Default: 0.3
    pub growth_rate_cutoff: f64,

    /// Nutrient quality of each row block, worst first.
    /// Default: 6 log-spaced values from 0.08 to 0.5
    pub nutrient_qualities: Vec<f64>,

    /// Number of rows per nutrient quality block. Default: 5
    pub rows_per_quality: usize,

    /// Factor converting the inducer column to model units (µM → nM). Default: 1000
    pub inducer_scale: f64,

    /// Error scaling policy. Default: MeanBroadcast
    pub error_scaling: ErrorScaling,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            growth_rate_cutoff: 0.3,
            nutrient_qualities: Array1::logspace(10.0, 0.08f64.log10(), 0.5f64.log10(), 6).to_vec(),
            rows_per_quality: 5,
            inducer_scale: 1000.0,
            error_scaling: ErrorScaling::MeanBroadcast,
        }
    }
}

impl LoaderConfig {
    /// Set the growth-rate cutoff.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.growth_rate_cutoff = cutoff;
        self
    }

    /// Set the nutrient quality of each row block and the block size.
    pub fn with_nutrient_blocks(mut self, qualities: Vec<f64>, rows_per_quality: usize) -> Self {
        self.nutrient_qualities = qualities;
        self.rows_per_quality = rows_per_quality;
        self
    }

    /// Set the error scaling policy.
    pub fn with_error_scaling(mut self, scaling: ErrorScaling) -> Self {
        self.error_scaling = scaling;
        self
    }
}

/// Fitting-ready experimental tables, one row per retained measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalData {
    /// (nutrient quality, inducer concentration in nM)
    pub setups: Array2<f64>,

    /// (growth rate, ribosomal mass fraction)
    pub measurements: Array2<f64>,

    /// Residual scales for (growth rate, ribosomal mass fraction)
    pub errors: Array2<f64>,

    /// Replicate counts for (growth rate, ribosomal mass fraction)
    pub replicates: Array2<f64>,

    /// Indices of the retained rows in the raw tables.
    pub retained_rows: Vec<usize>,
}

impl ExperimentalData {
    /// Build the tables directly from in-memory values.
    pub fn new(setups: Array2<f64>, measurements: Array2<f64>, errors: Array2<f64>) -> Result<Self> {
        let n = setups.nrows();
        for (name, table) in [("measurements", &measurements), ("errors", &errors)] {
            if table.dim() != (n, 2) {
                return Err(CellFitError::DimensionMismatch(format!(
                    "{} has shape {:?}, expected ({}, 2)",
                    name,
                    table.dim(),
                    n
                )));
            }
        }
        if setups.ncols() != 2 {
            return Err(CellFitError::DimensionMismatch(format!(
                "setups have {} columns, expected 2",
                setups.ncols()
            )));
        }

        Ok(Self {
            setups,
            measurements,
            errors,
            replicates: Array2::ones((n, 2)),
            retained_rows: (0..n).collect(),
        })
    }

    /// Filter and convert raw measurement and error rows.
    pub fn from_rows(
        measurement_rows: &[Vec<f64>],
        error_rows: &[Vec<f64>],
        config: &LoaderConfig,
    ) -> Result<Self> {
        if error_rows.len() < measurement_rows.len() {
            return Err(CellFitError::DimensionMismatch(format!(
                "error table has {} rows, measurement table has {}",
                error_rows.len(),
                measurement_rows.len()
            )));
        }
        if config.rows_per_quality == 0 {
            return Err(CellFitError::InvalidInput(
                "rows_per_quality must be positive".to_string(),
            ));
        }

        let mut setups = Vec::new();
        let mut measurements = Vec::new();
        let mut row_errors = Vec::new();
        let mut replicates = Vec::new();
        let mut retained_rows = Vec::new();

        for (i, row) in measurement_rows.iter().enumerate() {
            let growth_rate = cell(row, i, GROWTH_RATE_COL)?;
            if !(growth_rate > config.growth_rate_cutoff) {
                continue;
            }

            // records start from the worst nutrient quality
            let block = i / config.rows_per_quality;
            let quality = *config.nutrient_qualities.get(block).ok_or_else(|| {
                CellFitError::InvalidInput(format!(
                    "row {} falls in nutrient block {}, but only {} qualities are configured",
                    i,
                    block,
                    config.nutrient_qualities.len()
                ))
            })?;
            let inducer = cell(row, i, INDUCER_COL)? * config.inducer_scale;
            setups.push([quality, inducer]);
            measurements.push([growth_rate, cell(row, i, RIBOSOME_FRACTION_COL)?]);

            let error_row = &error_rows[i];
            row_errors.push([
                cell(error_row, i, GROWTH_RATE_COL)?,
                cell(error_row, i, RIBOSOME_FRACTION_COL)?,
            ]);
            replicates.push([
                cell(error_row, i, REPLICATE_COLS.0)?,
                cell(error_row, i, REPLICATE_COLS.1)?,
            ]);
            retained_rows.push(i);
        }

        let errors = match config.error_scaling {
            ErrorScaling::MeanBroadcast => {
                let mean = column_means(error_rows)?;
                vec![mean; row_errors.len()]
            }
            ErrorScaling::ReplicateScaled => row_errors
                .iter()
                .zip(&replicates)
                .map(|(e, r)| [e[0] / r[0].sqrt(), e[1] / r[1].sqrt()])
                .collect(),
        };

        log::info!(
            "Retained {} of {} experimental rows (growth rate > {})",
            retained_rows.len(),
            measurement_rows.len(),
            config.growth_rate_cutoff
        );

        Ok(Self {
            setups: to_table(&setups),
            measurements: to_table(&measurements),
            errors: to_table(&errors),
            replicates: to_table(&replicates),
            retained_rows,
        })
    }

    /// Load header-less CSV measurement and error tables.
    pub fn from_csv_files<P: AsRef<Path>, Q: AsRef<Path>>(
        measurements_path: P,
        errors_path: Q,
        config: &LoaderConfig,
    ) -> Result<Self> {
        let measurement_rows = read_csv_rows(measurements_path.as_ref())?;
        let error_rows = read_csv_rows(errors_path.as_ref())?;
        Self::from_rows(&measurement_rows, &error_rows, config)
    }

    /// Number of retained setups.
    pub fn len(&self) -> usize {
        self.setups.nrows()
    }

    /// Whether no rows were retained.
    pub fn is_empty(&self) -> bool {
        self.setups.nrows() == 0
    }
}

/// Read a header-less numeric CSV table.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .enumerate()
            .map(|(j, field)| {
                field.trim().parse::<f64>().map_err(|e| {
                    CellFitError::InvalidInput(format!(
                        "{}: row {}, column {}: cannot parse '{}' ({})",
                        path.display(),
                        i,
                        j,
                        field,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn cell(row: &[f64], i: usize, j: usize) -> Result<f64> {
    row.get(j).copied().ok_or_else(|| {
        CellFitError::InvalidInput(format!("row {} has {} columns, need column {}", i, row.len(), j))
    })
}

fn column_means(rows: &[Vec<f64>]) -> Result<[f64; 2]> {
    if rows.is_empty() {
        return Err(CellFitError::InvalidInput("error table is empty".to_string()));
    }
    let mut sums = [0.0; 2];
    for (i, row) in rows.iter().enumerate() {
        sums[0] += cell(row, i, GROWTH_RATE_COL)?;
        sums[1] += cell(row, i, RIBOSOME_FRACTION_COL)?;
    }
    let n = rows.len() as f64;
    Ok([sums[0] / n, sums[1] / n])
}

fn to_table(rows: &[[f64; 2]]) -> Array2<f64> {
    let mut table = Array2::zeros((rows.len(), 2));
    for (i, row) in rows.iter().enumerate() {
        table[[i, 0]] = row[0];
        table[[i, 1]] = row[1];
    }
    table
}
