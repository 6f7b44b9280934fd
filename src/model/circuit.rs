//! Synthetic gene circuit plug-ins.
//!
//! A circuit adds heterologous genes (one mRNA and one protein species each)
//! and optional miscellaneous species to the host cell model. The host takes
//! care of transcription, translation and dilution; the circuit only supplies
//! its regulation functions and the dynamics of its miscellaneous species.

use crate::error::{CellFitError, Result};
use crate::parameters::ParameterSet;
use std::collections::HashMap;

/// Names of the host cell's state entries, in state-vector order.
pub const CORE_SPECIES: [&str; 9] = ["m_a", "m_r", "p_a", "R", "tc", "tu", "Bcm", "s", "h"];

/// State index of the nutrient quality.
pub const NUTRIENT_QUALITY_INDEX: usize = 7;

/// State index of the inducer (chloramphenicol) concentration.
pub const INDUCER_INDEX: usize = 8;

/// A heterologous gene circuit hosted by the cell model.
pub trait Circuit: Send + Sync {
    /// Circuit name used in logs.
    fn name(&self) -> &str;

    /// Names of the synthetic genes, in state-vector order.
    fn genes(&self) -> Vec<String>;

    /// Names of the miscellaneous species, in state-vector order.
    fn miscs(&self) -> Vec<String>;

    /// Default gene parameters (`c_<g>`, `a_<g>`, `b_<g>`, `k_<g>`, `n_<g>`)
    /// and any circuit-specific constants.
    fn default_params(&self) -> ParameterSet;

    /// Default initial values keyed by species name (`m_<g>`, `p_<g>`, misc names).
    fn default_init_conds(&self) -> ParameterSet;

    /// Transcription regulation factor of every gene, in [0, 1].
    fn regulation(&self, t: f64, x: &[f64], layout: &StateLayout, out: &mut [f64]);

    /// Time derivatives of the miscellaneous species.
    fn misc_rhs(&self, _t: f64, _x: &[f64], _layout: &StateLayout, _growth_rate: f64, out: &mut [f64]) {
        for v in out.iter_mut() {
            *v = 0.0;
        }
    }
}

/// The host cell without any heterologous genes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCircuit;

impl Circuit for NoCircuit {
    fn name(&self) -> &str {
        "no_het"
    }

    fn genes(&self) -> Vec<String> {
        Vec::new()
    }

    fn miscs(&self) -> Vec<String> {
        Vec::new()
    }

    fn default_params(&self) -> ParameterSet {
        ParameterSet::new()
    }

    fn default_init_conds(&self) -> ParameterSet {
        ParameterSet::new()
    }

    fn regulation(&self, _t: f64, _x: &[f64], _layout: &StateLayout, _out: &mut [f64]) {}
}

/// Positions of every species in the state vector.
///
/// Layout: host species, then circuit mRNAs, circuit proteins, circuit
/// miscellaneous species.
#[derive(Debug, Clone, PartialEq)]
pub struct StateLayout {
    genes: Vec<String>,
    miscs: Vec<String>,
    name2pos: HashMap<String, usize>,
}

impl StateLayout {
    pub fn new(genes: Vec<String>, miscs: Vec<String>) -> Self {
        let mut name2pos = HashMap::new();
        for (i, name) in CORE_SPECIES.iter().enumerate() {
            name2pos.insert(name.to_string(), i);
        }
        let offset = CORE_SPECIES.len();
        for (i, gene) in genes.iter().enumerate() {
            name2pos.insert(format!("m_{}", gene), offset + i);
            name2pos.insert(format!("p_{}", gene), offset + genes.len() + i);
        }
        for (j, misc) in miscs.iter().enumerate() {
            name2pos.insert(misc.clone(), offset + 2 * genes.len() + j);
        }

        Self {
            genes,
            miscs,
            name2pos,
        }
    }

    /// Layout for a given circuit.
    pub fn for_circuit(circuit: &dyn Circuit) -> Self {
        Self::new(circuit.genes(), circuit.miscs())
    }

    /// Length of the state vector.
    pub fn dimension(&self) -> usize {
        CORE_SPECIES.len() + 2 * self.genes.len() + self.miscs.len()
    }

    pub fn num_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn num_miscs(&self) -> usize {
        self.miscs.len()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn miscs(&self) -> &[String] {
        &self.miscs
    }

    /// State index of a species, if present.
    pub fn index(&self, name: &str) -> Option<usize> {
        self.name2pos.get(name).copied()
    }

    /// The full name → index decoder.
    pub fn name2pos(&self) -> &HashMap<String, usize> {
        &self.name2pos
    }

    /// Index of the `i`-th gene's mRNA.
    pub fn mrna(&self, i: usize) -> usize {
        CORE_SPECIES.len() + i
    }

    /// Index of the `i`-th gene's protein.
    pub fn protein(&self, i: usize) -> usize {
        CORE_SPECIES.len() + self.genes.len() + i
    }

    /// Index of the first miscellaneous species.
    pub fn misc_offset(&self) -> usize {
        CORE_SPECIES.len() + 2 * self.genes.len()
    }
}

/// Per-gene parameters of the synthetic genes, as flat arrays in gene order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthGeneParams {
    /// Gene copy numbers (nM)
    pub copy_numbers: Vec<f64>,
    /// Maximum transcription rates (1/h)
    pub transcription_rates: Vec<f64>,
    /// mRNA degradation rates (1/h)
    pub mrna_decay_rates: Vec<f64>,
    /// mRNA-ribosome dissociation constants (nM)
    pub dissociation_constants: Vec<f64>,
    /// Protein lengths (aa)
    pub protein_lengths: Vec<f64>,
}

impl SynthGeneParams {
    /// Collect the parameters of `genes` from a parameter set.
    pub fn from_parameters(params: &ParameterSet, genes: &[String]) -> Result<Self> {
        let mut out = Self::default();
        for gene in genes {
            out.copy_numbers.push(params.get(&format!("c_{}", gene))?);
            out.transcription_rates.push(params.get(&format!("a_{}", gene))?);
            out.mrna_decay_rates.push(params.get(&format!("b_{}", gene))?);

            let k = params.get(&format!("k_{}", gene))?;
            if k <= 0.0 {
                return Err(CellFitError::InvalidParameter(format!(
                    "k_{} must be positive, got {}",
                    gene, k
                )));
            }
            out.dissociation_constants.push(k);
            out.protein_lengths.push(params.get(&format!("n_{}", gene))?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_circuit_layout() {
        let layout = StateLayout::for_circuit(&NoCircuit);

        assert_eq!(layout.dimension(), 9);
        assert_eq!(layout.index("s"), Some(NUTRIENT_QUALITY_INDEX));
        assert_eq!(layout.index("h"), Some(INDUCER_INDEX));
        assert_eq!(layout.index("m_xyz"), None);
    }

    #[test]
    fn test_gene_layout() {
        let layout = StateLayout::new(
            vec!["xtra".to_string(), "ofp".to_string()],
            vec!["inducer_bound".to_string()],
        );

        assert_eq!(layout.dimension(), 14);
        assert_eq!(layout.index("m_xtra"), Some(9));
        assert_eq!(layout.index("m_ofp"), Some(10));
        assert_eq!(layout.index("p_xtra"), Some(11));
        assert_eq!(layout.index("p_ofp"), Some(12));
        assert_eq!(layout.index("inducer_bound"), Some(13));
        assert_eq!(layout.protein(1), 12);
        assert_eq!(layout.misc_offset(), 13);
    }

    #[test]
    fn test_synth_gene_params_missing() {
        let params = ParameterSet::new().with("c_xtra", 1.0);
        let result = SynthGeneParams::from_parameters(&params, &["xtra".to_string()]);

        assert!(matches!(result, Err(CellFitError::ParameterNotFound(_))));
    }
}
