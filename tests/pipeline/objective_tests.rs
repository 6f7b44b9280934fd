//! Tests for the steady-state objective on the full cell model

use approx::assert_relative_eq;
use cellfit_rs::data::{ExperimentalData, LoaderConfig};
use cellfit_rs::ode::{SolverConfig, TrajectoryStatus};
use cellfit_rs::parameters::{apply_log_params, DRUG_BINDING};
use cellfit_rs::Problem;
use ndarray::array;
use tempfile::tempdir;

use crate::test_helpers::{default_observables, objective_for, objective_with_solver, write_csv};

#[test]
fn test_default_steady_state_is_physiological() {
    let setups = array![[0.5, 0.0], [0.5, 4000.0], [0.1, 0.0]];
    let observables = default_observables(&setups);

    for row in observables.rows() {
        let (growth, ribosome_fraction) = (row[0], row[1]);
        assert!(growth > 0.0 && growth < 3.0, "growth rate {}", growth);
        assert!(
            ribosome_fraction > 0.0 && ribosome_fraction < 0.6,
            "ribosome fraction {}",
            ribosome_fraction
        );
    }
    // poorer nutrients slow growth
    assert!(observables[[2, 0]] < observables[[0, 0]]);
}

#[test]
fn test_exact_measurements_give_zero_sos() {
    let dir = tempdir().unwrap();

    // one setup: s = 0.5, h = 10 nM, stored as 0.01 µM
    let simulated = default_observables(&array![[0.5, 10.0]]);
    let (growth, ribosome_fraction) = (simulated[[0, 0]], simulated[[0, 1]]);
    assert!(growth > 0.3);

    let data_path = dir.path().join("data.csv");
    let errors_path = dir.path().join("errors.csv");
    write_csv(&data_path, &[vec![growth, 0.0, ribosome_fraction, 0.01]]);
    write_csv(&errors_path, &[vec![1.0, 0.0, 1.0, 0.0, 3.0, 3.0]]);

    let config = LoaderConfig::default().with_nutrient_blocks(vec![0.5], 1);
    let data = ExperimentalData::from_csv_files(&data_path, &errors_path, &config).unwrap();
    assert_eq!(data.len(), 1);
    assert_relative_eq!(data.setups[[0, 1]], 10.0, max_relative = 1e-12);
    assert_eq!(data.errors.row(0).to_vec(), vec![1.0, 1.0]);

    let objective = objective_for(data);
    let v = objective.default_log_params().unwrap();

    let sos = objective.sos(&v).unwrap();
    assert!(sos < 1e-4, "sos = {}", sos);
    assert_eq!(objective.log_likelihood(&v).unwrap(), -sos);
}

#[test]
fn test_identity_substitution_matches_direct_evaluation() {
    let setups = array![[0.5, 0.0], [0.2, 4000.0]];
    let data = ExperimentalData::new(
        setups,
        array![[1.0, 0.2], [0.6, 0.3]],
        array![[0.05, 0.01], [0.05, 0.01]],
    )
    .unwrap();
    let objective = objective_for(data);

    let via_grid = objective
        .sos(&objective.default_log_params().unwrap())
        .unwrap();
    let direct = objective.sos_for_parameters(objective.baseline()).unwrap();

    assert!(direct > 0.0);
    assert_relative_eq!(via_grid, direct, max_relative = 1e-8);
}

#[test]
fn test_repeated_evaluations_are_identical() {
    let data = ExperimentalData::new(
        array![[0.5, 0.0], [0.3, 2000.0], [0.1, 0.0]],
        array![[1.0, 0.2], [0.7, 0.3], [0.4, 0.1]],
        array![[0.1, 0.02], [0.1, 0.02], [0.1, 0.02]],
    )
    .unwrap();
    let objective = objective_for(data);
    let mut v = objective.default_log_params().unwrap();
    v[DRUG_BINDING] += 1.0;

    let first = objective.sos(&v).unwrap();
    let second = objective.sos(&v).unwrap();

    assert!(first.is_finite());
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn test_residual_layout() {
    let data = ExperimentalData::new(
        array![[0.5, 0.0], [0.2, 0.0]],
        array![[1.0, 0.2], [0.6, 0.3]],
        array![[0.5, 0.25], [0.5, 0.25]],
    )
    .unwrap();
    let objective = objective_for(data);
    let v = objective.default_log_params().unwrap();

    let residuals = objective.eval(&v).unwrap();
    let prediction = objective
        .predict(&apply_log_params(objective.baseline(), &v).unwrap())
        .unwrap();

    assert_eq!(residuals.len(), objective.residual_count());
    // setup by setup, growth rate first
    assert_relative_eq!(
        residuals[2],
        (prediction.observables[[1, 0]] - 0.6) / 0.5,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        residuals[3],
        (prediction.observables[[1, 1]] - 0.3) / 0.25,
        max_relative = 1e-12
    );
}

#[test]
fn test_failed_trajectory_gives_nan() {
    // poor nutrients, so the default state is far from steady
    let data =
        ExperimentalData::new(array![[0.1, 0.0]], array![[1.0, 0.2]], array![[1.0, 1.0]]).unwrap();
    let solver = SolverConfig::default().with_max_steps(Some(2));
    let objective = objective_with_solver(data, solver);

    let prediction = objective.predict(objective.baseline()).unwrap();
    assert!(matches!(
        prediction.batch.solutions[0].status,
        TrajectoryStatus::Failed(_)
    ));

    let sos = objective
        .sos(&objective.default_log_params().unwrap())
        .unwrap();
    assert!(sos.is_nan());
}

#[test]
fn test_horizon_reached_is_used() {
    let data =
        ExperimentalData::new(array![[0.1, 0.0]], array![[1.0, 0.2]], array![[1.0, 1.0]]).unwrap();
    let solver = SolverConfig::default().with_time_span(0.0, 0.5);
    let objective = objective_with_solver(data, solver);

    let prediction = objective.predict(objective.baseline()).unwrap();
    assert_eq!(
        prediction.batch.solutions[0].status,
        TrajectoryStatus::HorizonReached
    );
    assert!(objective
        .sos(&objective.default_log_params().unwrap())
        .unwrap()
        .is_finite());
}
