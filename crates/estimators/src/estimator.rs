//! Estimator contract

use ndarray::ArrayView2;

use crate::EstimatorError;

/// Supervised model over a feature matrix
pub trait Estimator {
    /// Training and scoring target
    type Target;
    /// Output of `predict`
    type Prediction;

    fn name(&self) -> &'static str;

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &Self::Target) -> Result<(), EstimatorError>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Self::Prediction, EstimatorError>;

    /// Higher or lower is better depending on the estimator
    fn score(&self, x: ArrayView2<'_, f64>, y: &Self::Target) -> Result<f64, EstimatorError>;
}
