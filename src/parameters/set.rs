//! Named parameter collection
//!
//! A [`ParameterSet`] maps parameter names to scalar values. It holds every
//! constant of the cell model (rates, Michaelis constants, binding constants)
//! and is treated as immutable during an evaluation: updates produce a new set.

use crate::error::{CellFitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A collection of named model parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Map of parameter names to values
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    /// Create a new empty parameter set
    ///
    /// # Examples
    ///
    /// ```
    /// use cellfit_rs::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::new();
    /// assert!(params.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Insert or overwrite a parameter value
    ///
    /// # Examples
    ///
    /// ```
    /// use cellfit_rs::parameters::ParameterSet;
    ///
    /// let mut params = ParameterSet::new();
    /// params.set("K_e", 5800.0);
    /// assert_eq!(params.get("K_e").unwrap(), 5800.0);
    /// ```
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Builder-style variant of [`ParameterSet::set`]
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Get a parameter value
    ///
    /// # Returns
    ///
    /// The value, or `ParameterNotFound` if no parameter has that name
    pub fn get(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| CellFitError::ParameterNotFound(name.to_string()))
    }

    /// Number of parameters in the set
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Iterate over (name, value) pairs in sorted name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.values.iter()
    }

    /// Copy all entries of `other` into this set, overwriting duplicates
    pub fn extend(&mut self, other: &ParameterSet) {
        for (name, value) in other.iter() {
            self.values.insert(name.clone(), *value);
        }
    }

    /// Serialize the parameter set to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a parameter set from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
