//! Multi-layer perceptron regression adapter

use data_validator::{check_x_y, ValidationConfig, Validator};
use ndarray::{Array1, ArrayView2};
use tracing::info;

use crate::estimator::Estimator;
use crate::learner::{Mlp, MlpConfig};
use crate::EstimatorError;

/// Hidden layers used unless a config overrides them
pub const DEFAULT_HIDDEN_LAYERS: [usize; 6] = [10000, 5000, 1000, 500, 100, 20];

/// MLP regressor with a deep default architecture
#[derive(Debug, Clone)]
pub struct MlpRegressor {
    config: MlpConfig,
    model: Option<Mlp>,
}

impl Default for MlpRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl MlpRegressor {
    pub fn new() -> Self {
        Self::with_config(MlpConfig {
            hidden_layer_sizes: DEFAULT_HIDDEN_LAYERS.to_vec(),
            ..Default::default()
        })
    }

    pub fn with_config(config: MlpConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    pub fn loss_curve(&self) -> Option<&[f64]> {
        self.model.as_ref().map(Mlp::loss_curve)
    }
}

/// Coefficient of determination; a constant target scores 1 when matched
/// exactly and 0 otherwise
fn r2_score(truth: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let mean = truth.mean().unwrap_or(0.0);
    let ss_res: f64 = (truth - predicted).mapv(|r| r * r).sum();
    let ss_tot: f64 = truth.mapv(|t| (t - mean) * (t - mean)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

impl Estimator for MlpRegressor {
    type Target = Array1<f64>;
    type Prediction = Array1<f64>;

    fn name(&self) -> &'static str {
        "MlpRegressor"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &Array1<f64>) -> Result<(), EstimatorError> {
        check_x_y(x, y.len())?;
        if !y.iter().all(|v| v.is_finite()) {
            return Err(EstimatorError::InvalidTarget("non-finite target".to_string()));
        }
        info!(
            samples = x.nrows(),
            features = x.ncols(),
            layers = ?self.config.hidden_layer_sizes,
            "fitting mlp regressor"
        );
        self.model = Some(Mlp::fit(&self.config, x, y.view()));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, EstimatorError> {
        let model = self
            .model
            .as_ref()
            .ok_or(EstimatorError::NotFitted("MlpRegressor"))?;
        Validator::new(ValidationConfig::with_features(model.n_features())).validate_batch(x)?;
        Ok(model.predict(x))
    }

    fn score(&self, x: ArrayView2<'_, f64>, y: &Array1<f64>) -> Result<f64, EstimatorError> {
        check_x_y(x, y.len())?;
        Ok(r2_score(y, &self.predict(x)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn small() -> MlpRegressor {
        MlpRegressor::with_config(MlpConfig {
            hidden_layer_sizes: vec![8],
            learning_rate: 0.01,
            max_iter: 300,
            batch_size: Some(8),
            ..Default::default()
        })
    }

    #[test]
    fn test_default_architecture() {
        let model = MlpRegressor::new();
        assert_eq!(model.config().hidden_layer_sizes, DEFAULT_HIDDEN_LAYERS.to_vec());
        assert_eq!(model.config().max_iter, 200);
        assert!(model.loss_curve().is_none());
    }

    #[test]
    fn test_r2_score() {
        let truth = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&truth, &truth), 1.0);
        assert!((r2_score(&truth, &array![2.0, 2.0, 2.0])).abs() < 1e-12);
        assert_eq!(r2_score(&array![1.0, 1.0], &array![1.0, 1.0]), 1.0);
        assert_eq!(r2_score(&array![1.0, 1.0], &array![1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_fit_and_score() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 40.0);
        let y = x.column(0).mapv(|v| 3.0 * v - 1.0);
        let mut model = small();
        model.fit(x.view(), &y).unwrap();
        assert_eq!(model.predict(x.view()).unwrap().len(), 40);
        assert!(model.score(x.view(), &y).unwrap() > 0.8);
    }

    #[test]
    fn test_not_fitted() {
        let model = small();
        assert!(matches!(
            model.predict(array![[1.0]].view()),
            Err(EstimatorError::NotFitted("MlpRegressor"))
        ));
    }
}
