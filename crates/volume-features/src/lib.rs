//! Volume Feature Extraction
//!
//! Turns batches of flattened 3D volumes into feature matrices:
//! - per-cell intensity histogram, mean, median and mean gradient
//! - the mean and median blocks side by side
//! - per-slice keypoint coordinates

pub mod config;
mod composite;
mod grid;
mod keypoints;
mod statistics;
mod transformer;
mod volume;

pub use composite::IntensityMeanAndMedian;
pub use config::{GradientConfig, GridConfig, HistogramConfig, KeypointConfig, VolumeGeometry};
pub use grid::{cell_edges, Cell, GridSpec};
pub use keypoints::{FastCornerDetector, KeypointDetector, SiftDetectorXY};
pub use statistics::{
    CellStatistic, GradientStatistic, HistogramStatistic, MeanStatistic, MedianStatistic,
};
pub use transformer::{
    CellFeatureTransformer, IntensityHistogram, IntensityMean, IntensityMedian,
    MeanIntensityGradient, Transformer,
};
pub use volume::{volumes, VolumeView};

use data_validator::ValidationError;
use thiserror::Error;

/// Errors during feature extraction
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape error: {0}")]
    Shape(String),
}
