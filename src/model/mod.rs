//! Cell model and circuit plug-ins.
//!
//! [`CellModel`] implements [`crate::ode::DynamicalSystem`] for the host cell
//! plus an optional synthetic [`Circuit`]. Steady states are mapped to the
//! fitted observables (growth rate, ribosomal mass fraction) in closed form by
//! [`CellModel::observables`].

pub mod cell;
pub mod circuit;

pub use cell::{
    add_circuit, core_index, default_init_conds, default_params, x0_from_init_conds, CellModel,
    CellRates,
};
pub use circuit::{
    Circuit, NoCircuit, StateLayout, SynthGeneParams, CORE_SPECIES, INDUCER_INDEX,
    NUTRIENT_QUALITY_INDEX,
};
