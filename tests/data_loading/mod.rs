//! Tests for loading experimental tables from CSV files

use approx::assert_relative_eq;
use cellfit_rs::data::{ErrorScaling, ExperimentalData, LoaderConfig};
use cellfit_rs::CellFitError;
use tempfile::tempdir;

use crate::test_helpers::write_csv;

/// Two nutrient blocks of three rows; rows 1 and 4 fall below the cutoff.
fn tables() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let measurements = vec![
        vec![0.45, 9.0, 0.12, 0.0],
        vec![0.25, 9.0, 0.10, 2.0],
        vec![0.40, 9.0, 0.15, 4.0],
        vec![0.95, 9.0, 0.20, 0.0],
        vec![0.30, 9.0, 0.22, 2.0],
        vec![0.80, 9.0, 0.25, 4.0],
    ];
    let errors = vec![
        vec![0.02, 0.0, 0.010, 0.0, 3.0, 4.0],
        vec![0.04, 0.0, 0.020, 0.0, 3.0, 4.0],
        vec![0.06, 0.0, 0.030, 0.0, 3.0, 4.0],
        vec![0.08, 0.0, 0.040, 0.0, 2.0, 2.0],
        vec![0.10, 0.0, 0.050, 0.0, 2.0, 2.0],
        vec![0.12, 0.0, 0.060, 0.0, 2.0, 2.0],
    ];
    (measurements, errors)
}

fn config() -> LoaderConfig {
    LoaderConfig::default().with_nutrient_blocks(vec![0.1, 0.3], 3)
}

#[test]
fn test_retains_rows_above_cutoff_only() {
    let dir = tempdir().unwrap();
    let (measurements, errors) = tables();
    let data_path = dir.path().join("data.csv");
    let errors_path = dir.path().join("errors.csv");
    write_csv(&data_path, &measurements);
    write_csv(&errors_path, &errors);

    let data = ExperimentalData::from_csv_files(&data_path, &errors_path, &config()).unwrap();

    // 0.30 is not strictly above the cutoff
    assert_eq!(data.retained_rows, vec![0, 2, 3, 5]);
    assert_eq!(data.len(), 4);
    for (k, &row) in data.retained_rows.iter().enumerate() {
        assert!(measurements[row][0] > 0.3);
        assert_eq!(data.measurements[[k, 0]], measurements[row][0]);
        assert_eq!(data.measurements[[k, 1]], measurements[row][2]);
    }
    assert!(measurements
        .iter()
        .enumerate()
        .filter(|(_, row)| row[0] > 0.3)
        .all(|(i, _)| data.retained_rows.contains(&i)));
}

#[test]
fn test_nutrient_blocks_and_inducer_units() {
    let (measurements, errors) = tables();
    let data = ExperimentalData::from_rows(&measurements, &errors, &config()).unwrap();

    let qualities: Vec<f64> = data.setups.column(0).to_vec();
    assert_eq!(qualities, vec![0.1, 0.1, 0.3, 0.3]);

    for (k, &row) in data.retained_rows.iter().enumerate() {
        let nanomolar = data.setups[[k, 1]];
        assert_relative_eq!(nanomolar, measurements[row][3] * 1000.0);
        assert_relative_eq!(nanomolar / 1000.0, measurements[row][3], max_relative = 1e-15);
    }
}

#[test]
fn test_mean_error_is_broadcast() {
    let (measurements, errors) = tables();
    let data = ExperimentalData::from_rows(&measurements, &errors, &config()).unwrap();

    // means over all six error rows, including the dropped ones
    for row in data.errors.rows() {
        assert_relative_eq!(row[0], 0.07, max_relative = 1e-12);
        assert_relative_eq!(row[1], 0.035, max_relative = 1e-12);
    }
    assert_eq!(data.replicates.row(0).to_vec(), vec![3.0, 4.0]);
    assert_eq!(data.replicates.row(3).to_vec(), vec![2.0, 2.0]);
}

#[test]
fn test_replicate_scaling_is_opt_in() {
    let (measurements, errors) = tables();
    let config = config().with_error_scaling(ErrorScaling::ReplicateScaled);

    let data = ExperimentalData::from_rows(&measurements, &errors, &config).unwrap();

    assert_relative_eq!(data.errors[[0, 0]], 0.02 / 3.0f64.sqrt(), max_relative = 1e-12);
    assert_relative_eq!(data.errors[[0, 1]], 0.01 / 2.0, max_relative = 1e-12);
    assert_relative_eq!(data.errors[[3, 0]], 0.12 / 2.0f64.sqrt(), max_relative = 1e-12);
}

#[test]
fn test_malformed_tables_are_errors() {
    let dir = tempdir().unwrap();
    let (measurements, errors) = tables();

    // row outside the configured nutrient blocks
    let short_config = LoaderConfig::default().with_nutrient_blocks(vec![0.1], 3);
    assert!(matches!(
        ExperimentalData::from_rows(&measurements, &errors, &short_config),
        Err(CellFitError::InvalidInput(_))
    ));

    // missing inducer column
    let truncated = vec![vec![0.9, 0.0, 0.2]];
    assert!(ExperimentalData::from_rows(&truncated, &errors, &config()).is_err());

    // non-numeric cell
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "0.9,0,0.2,abc\n").unwrap();
    let errors_path = dir.path().join("errors.csv");
    write_csv(&errors_path, &errors);
    assert!(ExperimentalData::from_csv_files(&path, &errors_path, &config()).is_err());

    // missing file
    assert!(matches!(
        ExperimentalData::from_csv_files(dir.path().join("absent.csv"), &errors_path, &config()),
        Err(CellFitError::CsvError(_)) | Err(CellFitError::IoError(_))
    ));
}
