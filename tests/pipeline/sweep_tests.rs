//! Tests for the grid sweep on the cell model objective

use cellfit_rs::config::SweepConfig;
use cellfit_rs::data::ExperimentalData;
use cellfit_rs::parameters::{AFFINITY, DRUG_BINDING};
use cellfit_rs::ResultSurface;
use ndarray::array;
use tempfile::tempdir;

use crate::test_helpers::objective_for;

fn small_objective() -> cellfit_rs::SteadyStateObjective {
    let data = ExperimentalData::new(
        array![[0.5, 0.0], [0.3, 3000.0]],
        array![[1.0, 0.2], [0.6, 0.3]],
        array![[0.1, 0.02], [0.1, 0.02]],
    )
    .unwrap();
    objective_for(data)
}

#[test]
fn test_sweep_is_order_invariant() {
    let objective = small_objective();
    let grid = SweepConfig::default()
        .with_points(2)
        .with_range(0.5, 2.0)
        .build(objective.default_log_params().unwrap())
        .unwrap();

    let mut visited = 0;
    let sequential = grid.run(|v| objective.sos(v), |_, _| visited += 1).unwrap();
    let parallel = grid.run_parallel(|v| objective.sos(v)).unwrap();

    assert_eq!(visited, 4);
    // reverse order, one cell at a time
    for i in (0..2).rev() {
        for j in (0..2).rev() {
            let direct = objective.sos(&grid.candidate(i, j)).unwrap();
            assert!(direct.is_finite());
            assert_eq!(sequential.values[[i, j]].to_bits(), direct.to_bits());
            assert_eq!(parallel.values[[i, j]].to_bits(), direct.to_bits());
        }
    }
}

#[test]
fn test_sweep_substitutes_the_configured_entries() {
    let objective = small_objective();
    let baseline = objective.default_log_params().unwrap();
    let grid = SweepConfig::default()
        .with_points(3)
        .build(baseline.clone())
        .unwrap();

    let candidate = grid.candidate(2, 0);

    assert_eq!(candidate[AFFINITY], grid.axis_1()[2]);
    assert_eq!(candidate[DRUG_BINDING], grid.axis_2()[0]);
    for k in [0, 2] {
        assert_eq!(candidate[k], baseline[k]);
    }
}

#[test]
fn test_surface_persists_without_loss() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fit_outcomes").join("param_constraints.json");
    let objective = small_objective();
    let grid = SweepConfig::default()
        .with_points(2)
        .with_range(0.2, 5.0)
        .build(objective.default_log_params().unwrap())
        .unwrap();

    let surface = grid.run(|v| objective.sos(v), |_, _| {}).unwrap();
    surface.save_json(&path).unwrap();
    let loaded = ResultSurface::load_json(&path).unwrap();

    assert_eq!(loaded.values.dim(), (2, 2));
    for (a, b) in surface.values.iter().zip(loaded.values.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
    assert_eq!(loaded.axis_1, surface.axis_1);
    assert_eq!(loaded.axis_2, surface.axis_2);
}

#[test]
fn test_zero_error_scale_surface_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("param_constraints.json");
    // a zero error scale turns any mismatch into an infinite objective
    let data = ExperimentalData::new(
        array![[0.5, 0.0]],
        array![[1.0, 0.9]],
        array![[0.1, 0.0]],
    )
    .unwrap();
    let objective = objective_for(data);
    let grid = SweepConfig::default()
        .with_points(2)
        .with_range(0.5, 2.0)
        .build(objective.default_log_params().unwrap())
        .unwrap();

    let surface = grid.run(|v| objective.sos(v), |_, _| {}).unwrap();
    assert!(surface.values.iter().all(|v| *v == f64::INFINITY));

    surface.save_json(&path).unwrap();
    assert_eq!(ResultSurface::load_json(&path).unwrap(), surface);
}
