//! Estimators
//!
//! Adapters that fit learners on feature matrices produced by
//! `volume-features`:
//! - logistic regression on confidence-vector targets, scored by rank correlation
//! - kernel-form least squares regression with optional diagnostics output
//! - multi-layer perceptron regression
//! - a column-mean baseline

mod diagnostics;
mod estimator;
mod kernel;
mod logistic;
mod mean_predictor;
mod mlp;
pub mod learner;
pub mod spearman;

pub use diagnostics::{DiagnosticSink, FileDiagnostics};
pub use estimator::Estimator;
pub use kernel::KernelEstimator;
pub use logistic::{LogisticConfig, LogisticRegression};
pub use mean_predictor::MeanPredictor;
pub use mlp::{MlpRegressor, DEFAULT_HIDDEN_LAYERS};

use data_validator::ValidationError;
use thiserror::Error;

/// Errors during fitting, prediction or scoring
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0} is not fitted yet; call fit first")]
    NotFitted(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Linear algebra failure: {0}")]
    Linalg(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Diagnostics output failed: {0}")]
    Diagnostics(String),
}
