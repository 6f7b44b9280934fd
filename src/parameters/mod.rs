//! # Parameter System
//!
//! Model parameters live in a [`ParameterSet`], a name → value map covering
//! every constant of the cell model. Fitting routines and the grid sweep do
//! not work on the full set; they work on a short log-space candidate vector
//! that is extracted from, and reinjected into, a baseline set.
//!
//! ## Example Usage
//!
//! ```rust
//! use cellfit_rs::parameters::{apply_log_params, extract_log_params, ParameterSet};
//!
//! let baseline = ParameterSet::new()
//!     .with("a_a", 900.0)
//!     .with("a_r", 1400.0)
//!     .with("K_e", 5800.0)
//!     .with("K_nu", 5800.0)
//!     .with("nu_max", 5700.0)
//!     .with("kcm", 5e-5);
//!
//! let mut candidate = extract_log_params(&baseline).unwrap();
//! candidate[3] += 2.0f64.ln(); // double kcm
//!
//! let updated = apply_log_params(&baseline, &candidate).unwrap();
//! assert!((updated.get("kcm").unwrap() - 1e-4).abs() < 1e-15);
//! ```

pub mod fit_vector;
pub mod set;

pub use fit_vector::{
    apply_log_params, extract_log_params, AFFINITY, DRUG_BINDING, FIT_VECTOR_LEN,
    FIT_VECTOR_NAMES, MAX_IMPORT_RATE, RIBOSOME_RATIO,
};
pub use set::ParameterSet;
