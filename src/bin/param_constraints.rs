//! Parameter constraint sweep.
//!
//! Evaluates the steady-state fit error of the cell model on a grid of two
//! log-space parameters (by default K_e = K_nu against the chloramphenicol
//! binding constant kcm) and writes the result surface as JSON.
//!
//! Usage:
//!   param_constraints                          # default data paths and grid
//!   param_constraints --points 11 --parallel   # coarse grid, cells in parallel
//!   param_constraints --load                   # report a previously saved surface

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use cellfit_rs::backend;
use cellfit_rs::config::RunConfig;
use cellfit_rs::data::ExperimentalData;
use cellfit_rs::model::{
    add_circuit, default_init_conds, default_params, x0_from_init_conds, CellModel, NoCircuit,
};
use cellfit_rs::parameters::FIT_VECTOR_NAMES;
use cellfit_rs::setup::initial_states;
use cellfit_rs::{Result, ResultSurface, SteadyStateObjective};

#[derive(Parser)]
#[command(name = "param_constraints")]
#[command(about = "Grid sweep of the cell model fit error over two parameters")]
#[command(version)]
struct Cli {
    /// Run configuration (JSON). Missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Measurement table (CSV, no header)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Error and replicate table (CSV, no header)
    #[arg(long)]
    errors: Option<PathBuf>,

    /// Result surface file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reload the surface from --output instead of simulating
    #[arg(long)]
    load: bool,

    /// Grid points per axis
    #[arg(long)]
    points: Option<usize>,

    /// Evaluate grid cells in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    // must precede any other rayon use
    backend::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RunConfig::load_or_default(path),
        None => RunConfig::default(),
    };
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(errors) = cli.errors {
        config.errors_path = errors;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(points) = cli.points {
        config.sweep.points = points;
    }
    config.sweep.parallel |= cli.parallel;

    let surface = if cli.load {
        ResultSurface::load_json(&config.output_path)?
    } else {
        let surface = sweep(&config)?;
        surface.save_json(&config.output_path)?;
        surface
    };

    report(&surface, &config);
    Ok(())
}

fn sweep(config: &RunConfig) -> Result<ResultSurface> {
    let (params, init_conds, layout) =
        add_circuit(&NoCircuit, &default_params(), &default_init_conds());
    let model = CellModel::new(&params, Arc::new(NoCircuit))?;

    let data = ExperimentalData::from_csv_files(
        &config.data_path,
        &config.errors_path,
        &config.loader,
    )?;
    log::info!("{} setups retained for fitting", data.len());

    let x0 = x0_from_init_conds(&init_conds, &layout);
    let x0s = initial_states(&x0, data.setups.view())?;

    let objective = SteadyStateObjective::new(model, params, x0s, data, config.solver.clone())?;
    let grid = config.sweep.build(objective.default_log_params()?)?;
    let (rows, cols) = grid.shape();

    let started = Instant::now();
    let surface = if config.sweep.parallel {
        grid.run_parallel(|v| objective.sos(v))?
    } else {
        let mut done = 0;
        grid.run(
            |v| objective.sos(v),
            |i, j| {
                done += 1;
                log::info!("({}, {}) done, {}/{}", i, j, done, rows * cols);
            },
        )?
    };
    log::info!("Sweep finished in {:.1?}", started.elapsed());

    Ok(surface)
}

fn report(surface: &ResultSurface, config: &RunConfig) {
    let name_1 = FIT_VECTOR_NAMES.get(config.sweep.index_1).unwrap_or(&"axis 1");
    let name_2 = FIT_VECTOR_NAMES.get(config.sweep.index_2).unwrap_or(&"axis 2");

    if let Some(((i, j), value)) = surface.min() {
        log::info!(
            "Best fit SOS {:.6} at {} = {:.6e}, {} = {:.6e}",
            value,
            name_1,
            surface.axis_1[i].exp(),
            name_2,
            surface.axis_2[j].exp()
        );
    }
    if let Some((_, value)) = surface.max() {
        log::info!("Worst fit SOS {:.6}", value);
    }
    let non_finite = surface.non_finite_count();
    if non_finite > 0 {
        log::warn!("{} grid cells have no finite objective value", non_finite);
    }
}
