//! Transformer and estimator chaining

use std::fmt;
use std::str::FromStr;

use estimators::Estimator;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use volume_features::{
    IntensityHistogram, IntensityMean, IntensityMeanAndMedian, IntensityMedian,
    MeanIntensityGradient, SiftDetectorXY, Transformer,
};

use crate::settings::Settings;
use crate::PipelineError;

/// Feature families a pipeline can be built around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Histogram,
    Mean,
    Median,
    Gradient,
    MeanAndMedian,
    Keypoints,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::Histogram,
        FeatureKind::Mean,
        FeatureKind::Median,
        FeatureKind::Gradient,
        FeatureKind::MeanAndMedian,
        FeatureKind::Keypoints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Histogram => "histogram",
            FeatureKind::Mean => "mean",
            FeatureKind::Median => "median",
            FeatureKind::Gradient => "gradient",
            FeatureKind::MeanAndMedian => "mean_and_median",
            FeatureKind::Keypoints => "keypoints",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown feature kind: {s}"))
    }
}

/// Transformer for `kind` configured from `settings`
pub fn build_transformer(
    settings: &Settings,
    kind: FeatureKind,
) -> Result<Box<dyn Transformer>, PipelineError> {
    let (geometry, grid) = (settings.volume, settings.grid);
    let transformer: Box<dyn Transformer> = match kind {
        FeatureKind::Histogram => {
            Box::new(IntensityHistogram::new(geometry, grid, settings.histogram)?)
        }
        FeatureKind::Mean => Box::new(IntensityMean::new(geometry, grid)?),
        FeatureKind::Median => Box::new(IntensityMedian::new(geometry, grid)?),
        FeatureKind::Gradient => {
            Box::new(MeanIntensityGradient::new(geometry, grid, settings.gradient)?)
        }
        FeatureKind::MeanAndMedian => Box::new(IntensityMeanAndMedian::new(geometry, grid)?),
        FeatureKind::Keypoints => Box::new(SiftDetectorXY::new(geometry, settings.keypoints)?),
    };
    debug!(%kind, width = transformer.output_width(), "built transformer");
    Ok(transformer)
}

/// One transformer feeding one estimator
#[derive(Debug)]
pub struct Pipeline<T, E> {
    transformer: T,
    estimator: E,
}

impl<T: Transformer, E: Estimator> Pipeline<T, E> {
    pub fn new(transformer: T, estimator: E) -> Self {
        Self {
            transformer,
            estimator,
        }
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// `fit_transform` the volumes, then fit the estimator on the features
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &E::Target) -> Result<(), PipelineError> {
        let features = self.transformer.fit_transform(x)?;
        info!(
            transformer = self.transformer.name(),
            estimator = self.estimator.name(),
            samples = features.nrows(),
            features = features.ncols(),
            "fitting pipeline"
        );
        self.estimator.fit(features.view(), y)?;
        Ok(())
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<E::Prediction, PipelineError> {
        let features = self.transformer.transform(x)?;
        Ok(self.estimator.predict(features.view())?)
    }

    pub fn score(&self, x: ArrayView2<'_, f64>, y: &E::Target) -> Result<f64, PipelineError> {
        let features = self.transformer.transform(x)?;
        Ok(self.estimator.score(features.view(), y)?)
    }
}
