//! Volume Feature Pipeline
//!
//! Loads run settings, installs logging, builds transformers by feature kind
//! and chains a transformer with an estimator.

mod logging;
mod pipeline;
mod settings;

pub use logging::init_logging;
pub use pipeline::{build_transformer, FeatureKind, Pipeline};
pub use settings::{LoggingSettings, Settings, ENV_PREFIX};

use estimators::EstimatorError;
use thiserror::Error;
use volume_features::FeatureError;

/// Errors from settings, logging or either pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Feature extraction failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("Estimator failed: {0}")]
    Estimator(#[from] EstimatorError),
}
