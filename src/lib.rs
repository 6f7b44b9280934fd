//! # cellfit-rs
//!
//! `cellfit-rs` checks whether pairs of parameters of a coarse-grained
//! bacterial cell model can be constrained jointly by growth-rate and
//! ribosome-fraction data. It evaluates an error-weighted sum of squares on a
//! 2-D grid of log-space parameter values and persists the resulting surface.
//!
//! The library provides:
//! - A resource-aware cell model with a plug-in interface for synthetic circuits
//! - A parallel, adaptive Dormand-Prince integrator that stops at steady state
//! - A loader turning measurement and error tables into fitting-ready arrays
//! - A steady-state sum-of-squares objective implementing [`Problem`]
//! - A grid sweep driver with JSON persistence of its result surface
//!
//! ## Basic Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use cellfit_rs::data::ExperimentalData;
//! use cellfit_rs::model::{add_circuit, default_init_conds, default_params, x0_from_init_conds};
//! use cellfit_rs::model::{CellModel, NoCircuit};
//! use cellfit_rs::ode::SolverConfig;
//! use cellfit_rs::objective::SteadyStateObjective;
//! use cellfit_rs::setup::initial_states;
//! use ndarray::array;
//!
//! let (params, init_conds, layout) =
//!     add_circuit(&NoCircuit, &default_params(), &default_init_conds());
//! let model = CellModel::new(&params, Arc::new(NoCircuit)).unwrap();
//!
//! let data = ExperimentalData::new(
//!     array![[0.5, 0.0]],
//!     array![[1.0, 0.2]],
//!     array![[0.1, 0.01]],
//! )
//! .unwrap();
//! let x0 = x0_from_init_conds(&init_conds, &layout);
//! let x0s = initial_states(&x0, data.setups.view()).unwrap();
//!
//! let objective =
//!     SteadyStateObjective::new(model, params, x0s, data, SolverConfig::default()).unwrap();
//! let v = objective.default_log_params().unwrap();
//! assert!(objective.sos(&v).unwrap().is_finite());
//! ```

// Public modules
pub mod error;

// Process-wide numeric setup
pub mod backend;

// Parameter system
pub mod parameters;

// Cell model and integration
pub mod model;
pub mod ode;

// Fitting pipeline
pub mod config;
pub mod data;
pub mod objective;
pub mod problem;
pub mod setup;
pub mod sweep;

// Re-exports for convenience
pub use error::{CellFitError, Result};
pub use objective::SteadyStateObjective;
pub use problem::Problem;
pub use sweep::{GridSweep, ResultSurface};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
