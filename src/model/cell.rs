//! Coarse-grained bacterial cell model.
//!
//! The host tracks metabolic and ribosomal mRNAs (`m_a`, `m_r`), metabolic
//! proteins (`p_a`), ribosomes (`R`), charged and uncharged tRNAs (`tc`,
//! `tu`) and chloramphenicol-inactivated ribosomes (`Bcm`). Nutrient quality
//! `s` and chloramphenicol concentration `h` are carried in the state vector
//! as constants.
//!
//! Ribosomes are shared between all genes in proportion to `m_i / k_i`; a
//! fixed fraction `phi_q` of translating ribosomes makes housekeeping
//! proteins. The growth rate follows from mass balance: `l = e * B / M`.
//!
//! Units: concentrations in nM, time in hours, masses in amino acids.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};

use super::circuit::{
    Circuit, StateLayout, SynthGeneParams, CORE_SPECIES, INDUCER_INDEX, NUTRIENT_QUALITY_INDEX,
};
use crate::error::{CellFitError, Result};
use crate::ode::DynamicalSystem;
use crate::parameters::ParameterSet;

/// Default host parameter values.
pub fn default_params() -> ParameterSet {
    ParameterSet::new()
        // cell mass (aa)
        .with("M", 1.19e9)
        // housekeeping share of translating ribosomes
        .with("phi_q", 0.59)
        // translation elongation
        .with("e_max", 20.0 * 3600.0)
        .with("K_e", 5800.0)
        // tRNA charging by metabolic proteins
        .with("nu_max", 5700.0)
        .with("K_nu", 5800.0)
        // ppGpp sensitivity of ribosomal transcription and tRNA synthesis
        .with("tau", 1.0)
        .with("psi_max", 24200.0)
        // protein lengths (aa)
        .with("n_a", 300.0)
        .with("n_r", 7459.0)
        // gene copy numbers, transcription and mRNA decay rates
        .with("c_a", 1.0)
        .with("c_r", 1.0)
        .with("a_a", 924.0)
        .with("a_r", 1470.0)
        .with("b_a", 6.0)
        .with("b_r", 6.0)
        // mRNA-ribosome dissociation constants (nM)
        .with("k_a", 100.0)
        .with("k_r", 100.0)
        // chloramphenicol binding (1/(nM h))
        .with("kcm", 5e-5)
}

/// Default host initial conditions, close to the steady state for `s = 0.5`.
pub fn default_init_conds() -> ParameterSet {
    ParameterSet::new()
        .with("m_a", 132.0)
        .with("m_r", 126.0)
        .with("p_a", 8.3e5)
        .with("R", 3.2e4)
        .with("tc", 8700.0)
        .with("tu", 5800.0)
        .with("Bcm", 0.0)
        .with("s", 0.5)
        .with("h", 0.0)
}

/// Merge a circuit's defaults into the host defaults.
///
/// Returns the combined parameters, the combined initial conditions and the
/// state layout (name → index decoder, gene and misc counts).
pub fn add_circuit(
    circuit: &dyn Circuit,
    params: &ParameterSet,
    init_conds: &ParameterSet,
) -> (ParameterSet, ParameterSet, StateLayout) {
    let mut all_params = params.clone();
    all_params.extend(&circuit.default_params());

    let mut all_init_conds = init_conds.clone();
    all_init_conds.extend(&circuit.default_init_conds());

    log::info!(
        "Loaded circuit '{}' ({} genes, {} misc species)",
        circuit.name(),
        circuit.genes().len(),
        circuit.miscs().len()
    );

    (all_params, all_init_conds, StateLayout::for_circuit(circuit))
}

/// Assemble the initial state vector from named initial conditions.
///
/// Species without an entry start at zero.
pub fn x0_from_init_conds(init_conds: &ParameterSet, layout: &StateLayout) -> Vec<f64> {
    let mut x0 = vec![0.0; layout.dimension()];
    for (name, value) in init_conds.iter() {
        if let Some(i) = layout.index(name) {
            x0[i] = *value;
        }
    }
    x0
}

/// Host constants extracted from a parameter set for fast evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HostParams {
    m: f64,
    phi_q: f64,
    e_max: f64,
    k_e: f64,
    nu_max: f64,
    k_nu: f64,
    tau: f64,
    psi_max: f64,
    n_a: f64,
    n_r: f64,
    c_a: f64,
    c_r: f64,
    a_a: f64,
    a_r: f64,
    b_a: f64,
    b_r: f64,
    k_a: f64,
    k_r: f64,
    kcm: f64,
}

impl HostParams {
    fn from_parameters(params: &ParameterSet) -> Result<Self> {
        let host = Self {
            m: params.get("M")?,
            phi_q: params.get("phi_q")?,
            e_max: params.get("e_max")?,
            k_e: params.get("K_e")?,
            nu_max: params.get("nu_max")?,
            k_nu: params.get("K_nu")?,
            tau: params.get("tau")?,
            psi_max: params.get("psi_max")?,
            n_a: params.get("n_a")?,
            n_r: params.get("n_r")?,
            c_a: params.get("c_a")?,
            c_r: params.get("c_r")?,
            a_a: params.get("a_a")?,
            a_r: params.get("a_r")?,
            b_a: params.get("b_a")?,
            b_r: params.get("b_r")?,
            k_a: params.get("k_a")?,
            k_r: params.get("k_r")?,
            kcm: params.get("kcm")?,
        };

        if !(host.phi_q >= 0.0 && host.phi_q < 1.0) {
            return Err(CellFitError::InvalidParameter(format!(
                "phi_q must lie in [0, 1), got {}",
                host.phi_q
            )));
        }
        for (name, value) in [("M", host.m), ("k_a", host.k_a), ("k_r", host.k_r)] {
            if value <= 0.0 {
                return Err(CellFitError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(host)
    }
}

/// Rates derived from one state vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRates {
    /// Translation elongation rate (aa/h)
    pub e: f64,
    /// tRNA charging rate per metabolic protein (1/h)
    pub nu: f64,
    /// Regulation of ribosomal gene transcription
    pub f_r: f64,
    /// tRNA synthesis rate (nM/h)
    pub psi: f64,
    /// Ribosome competition denominator
    pub d: f64,
    /// Translating ribosomes (nM)
    pub b: f64,
    /// Growth rate (1/h)
    pub l: f64,
}

/// The host cell with an optional synthetic circuit, ready for integration.
#[derive(Clone)]
pub struct CellModel {
    host: HostParams,
    genes: SynthGeneParams,
    layout: StateLayout,
    circuit: Arc<dyn Circuit>,
}

impl std::fmt::Debug for CellModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellModel")
            .field("host", &self.host)
            .field("genes", &self.genes)
            .field("circuit", &self.circuit.name())
            .finish()
    }
}

impl CellModel {
    /// Build a model from a full parameter set.
    pub fn new(params: &ParameterSet, circuit: Arc<dyn Circuit>) -> Result<Self> {
        let layout = StateLayout::for_circuit(circuit.as_ref());
        let genes = SynthGeneParams::from_parameters(params, layout.genes())?;
        Ok(Self {
            host: HostParams::from_parameters(params)?,
            genes,
            layout,
            circuit,
        })
    }

    /// Same circuit, different parameters.
    pub fn with_parameters(&self, params: &ParameterSet) -> Result<Self> {
        Self::new(params, Arc::clone(&self.circuit))
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn synth_gene_params(&self) -> &SynthGeneParams {
        &self.genes
    }

    /// Rates at state `x`.
    pub fn rates(&self, x: &[f64]) -> CellRates {
        let p = &self.host;
        let (m_a, m_r, r, tc, tu, s) = (x[0], x[1], x[3], x[4], x[5], x[NUTRIENT_QUALITY_INDEX]);

        let t_ratio = tc / tu;
        let e = p.e_max * tc / (tc + p.k_e);
        let nu = p.nu_max * s * tu / (tu + p.k_nu);
        let f_r = t_ratio / (t_ratio + p.tau);
        let psi = p.psi_max * t_ratio / (t_ratio + p.tau);

        let mut weight = m_a / p.k_a + m_r / p.k_r;
        for (i, k) in self.genes.dissociation_constants.iter().enumerate() {
            weight += x[self.layout.mrna(i)] / k;
        }
        let d = 1.0 + weight / (1.0 - p.phi_q);
        let b = r * (1.0 - 1.0 / d);
        let l = e * b / p.m;

        CellRates {
            e,
            nu,
            f_r,
            psi,
            d,
            b,
            l,
        }
    }

    /// Growth rate and ribosomal mass fraction at state `x`.
    pub fn growth_and_ribosome_fraction(&self, x: &[f64]) -> (f64, f64) {
        let rates = self.rates(x);
        let phi_r = self.host.n_r * (x[3] + x[6]) / self.host.m;
        (rates.l, phi_r)
    }

    /// Observables for a batch of states: one `(l, phi_r)` row per state row.
    pub fn observables(&self, states: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((states.nrows(), 2));
        for (i, row) in states.axis_iter(Axis(0)).enumerate() {
            let (l, phi_r) = match row.as_slice() {
                Some(x) => self.growth_and_ribosome_fraction(x),
                None => self.growth_and_ribosome_fraction(&row.to_vec()),
            };
            out[[i, 0]] = l;
            out[[i, 1]] = phi_r;
        }
        out
    }
}

impl DynamicalSystem for CellModel {
    fn dimension(&self) -> usize {
        self.layout.dimension()
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        let p = &self.host;
        let rates = self.rates(x);
        let CellRates {
            e,
            nu,
            f_r,
            psi,
            d,
            b,
            l,
        } = rates;
        let (m_a, m_r, p_a, r, tc, tu, bcm, h) =
            (x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[INDUCER_INDEX]);

        // free ribosomes available to each mRNA species
        let r_free = r / d;
        let drug_binding = p.kcm * h * b;

        out[0] = p.c_a * p.a_a - (p.b_a + l) * m_a;
        out[1] = f_r * p.c_r * p.a_r - (p.b_r + l) * m_r;
        out[2] = (e / p.n_a) * (m_a / p.k_a) * r_free - l * p_a;
        out[3] = (e / p.n_r) * (m_r / p.k_r) * r_free - l * r - drug_binding;
        out[4] = nu * p_a - e * b - l * tc;
        out[5] = psi - l * tu - nu * p_a + e * b;
        out[6] = drug_binding - l * bcm;
        out[NUTRIENT_QUALITY_INDEX] = 0.0;
        out[INDUCER_INDEX] = 0.0;

        let num_genes = self.layout.num_genes();
        if num_genes > 0 {
            // regulation factors go into the mRNA slots first, then get replaced
            let mrnas = self.layout.mrna(0)..self.layout.mrna(0) + num_genes;
            self.circuit
                .regulation(t, x, &self.layout, &mut out[mrnas]);
            for i in 0..num_genes {
                let (mi, pi) = (self.layout.mrna(i), self.layout.protein(i));
                let g = &self.genes;
                let regulation = out[mi];
                out[mi] = regulation * g.copy_numbers[i] * g.transcription_rates[i]
                    - (g.mrna_decay_rates[i] + l) * x[mi];
                out[pi] = (e / g.protein_lengths[i]) * (x[mi] / g.dissociation_constants[i]) * r_free
                    - l * x[pi];
            }
        }

        let offset = self.layout.misc_offset();
        if self.layout.num_miscs() > 0 {
            self.circuit
                .misc_rhs(t, x, &self.layout, l, &mut out[offset..]);
        }
    }
}

/// Index of a host species by name.
pub fn core_index(name: &str) -> Option<usize> {
    CORE_SPECIES.iter().position(|s| *s == name)
}
