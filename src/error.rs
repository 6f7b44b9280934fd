use thiserror::Error;

/// Error types for the cellfit-rs library.
#[derive(Error, Debug)]
pub enum CellFitError {
    /// Error indicating a mismatch in vector or table dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid parameter values.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Parameter not found in a parameter set.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Invalid input data (malformed rows, out-of-range indices).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error raised by the ODE integrator outside of a batch.
    #[error("Integration failed: {0}")]
    IntegrationFailure(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cellfit-rs operations.
pub type Result<T> = std::result::Result<T, CellFitError>;

impl From<String> for CellFitError {
    fn from(s: String) -> Self {
        CellFitError::Other(s)
    }
}

impl From<&str> for CellFitError {
    fn from(s: &str) -> Self {
        CellFitError::Other(s.to_string())
    }
}
