//! Validation Error Types

use thiserror::Error;

/// Errors raised before any computation touches a batch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Batch has no samples or no features
    #[error("Batch is empty: {samples} samples x {features} features")]
    Empty { samples: usize, features: usize },

    /// NaN or infinity in the batch
    #[error("Non-finite value at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },

    /// Wrong number of columns
    #[error("Expected {expected} features per sample, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    /// Batch and target disagree on the sample count
    #[error("Found {samples} samples but {targets} targets")]
    SampleMismatch { samples: usize, targets: usize },

    /// Too few samples for the requested operation
    #[error("Need at least {min} samples, got {actual}")]
    TooFewSamples { min: usize, actual: usize },

    /// Array could not be interpreted with the requested shape
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}
