//! Logistic regression on confidence-vector targets

use data_validator::{check_array, check_x_y, ValidationConfig, Validator};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::estimator::Estimator;
use crate::learner::{SoftmaxConfig, SoftmaxRegression};
use crate::spearman::mean_row_spearman;
use crate::EstimatorError;

/// Logistic regression parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularisation strength
    #[serde(rename = "C")]
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        let learner = SoftmaxConfig::default();
        Self {
            c: learner.c,
            max_iter: learner.max_iter,
            tol: learner.tol,
        }
    }
}

impl LogisticConfig {
    /// `C` must be positive and finite, `tol` non-negative
    pub fn validate(&self) -> Result<(), EstimatorError> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(EstimatorError::InvalidConfig(format!(
                "C must be positive and finite, got {}",
                self.c
            )));
        }
        if self.tol.is_nan() || self.tol < 0.0 {
            return Err(EstimatorError::InvalidConfig(format!(
                "tol must be non-negative, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

impl From<LogisticConfig> for SoftmaxConfig {
    fn from(config: LogisticConfig) -> Self {
        Self {
            c: config.c,
            max_iter: config.max_iter,
            tol: config.tol,
        }
    }
}

/// Multinomial logistic regression trained on the arg-max of each
/// confidence row.
///
/// Predictions are the class probabilities, one column per confidence
/// column, and `score` is the mean per-sample Spearman correlation between
/// the true confidences and those probabilities.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticConfig,
    model: Option<SoftmaxRegression>,
}

/// Index of the first maximum in `row`
fn argmax(row: ArrayView1<'_, f64>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max {
                (i, v)
            } else {
                (best, max)
            }
        })
        .0
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Result<Self, EstimatorError> {
        config.validate()?;
        Ok(Self {
            config,
            model: None,
        })
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    fn model(&self) -> Result<&SoftmaxRegression, EstimatorError> {
        self.model
            .as_ref()
            .ok_or(EstimatorError::NotFitted("LogisticRegression"))
    }

    /// Class probabilities, one row per sample
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EstimatorError> {
        let model = self.model()?;
        Validator::new(ValidationConfig::with_features(model.n_features())).validate_batch(x)?;
        Ok(model.predict_proba(x))
    }

    /// Most probable class per sample
    pub fn predict_labels(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, EstimatorError> {
        Ok(self.predict_proba(x)?.outer_iter().map(argmax).collect())
    }
}

impl Estimator for LogisticRegression {
    type Target = Array2<f64>;
    type Prediction = Array2<f64>;

    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &Array2<f64>) -> Result<(), EstimatorError> {
        check_x_y(x, y.nrows())?;
        check_array(y.view())?;
        let classes = y.ncols();
        if classes < 2 {
            return Err(EstimatorError::InvalidTarget(format!(
                "confidence matrix needs at least 2 columns, got {classes}"
            )));
        }

        let labels: Vec<usize> = y.outer_iter().map(argmax).collect();
        info!(
            samples = x.nrows(),
            features = x.ncols(),
            classes,
            "fitting logistic regression"
        );
        self.model = Some(SoftmaxRegression::fit(
            &self.config.into(),
            x,
            &labels,
            classes,
        ));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EstimatorError> {
        self.predict_proba(x)
    }

    fn score(&self, x: ArrayView2<'_, f64>, y: &Array2<f64>) -> Result<f64, EstimatorError> {
        check_x_y(x, y.nrows())?;
        check_array(y.view())?;
        let proba = self.predict_proba(x)?;
        if proba.ncols() != y.ncols() {
            return Err(EstimatorError::InvalidTarget(format!(
                "expected {} confidence columns, got {}",
                proba.ncols(),
                y.ncols()
            )));
        }
        Ok(mean_row_spearman(y.view(), proba.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn clusters() -> (Array2<f64>, Array2<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [3.0, 3.1],
            [2.9, 3.0],
            [0.1, 3.0],
            [0.0, 2.8]
        ];
        let y = array![
            [0.7, 0.1, 0.2],
            [0.8, 0.05, 0.15],
            [0.1, 0.6, 0.3],
            [0.2, 0.7, 0.1],
            [0.2, 0.1, 0.7],
            [0.1, 0.2, 0.7]
        ];
        (x, y)
    }

    #[test]
    fn test_argmax_first_maximum() {
        assert_eq!(argmax(array![0.2, 0.4, 0.4].view()), 1);
        assert_eq!(argmax(array![1.0].view()), 0);
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = clusters();
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        let proba = model.predict(x.view()).unwrap();
        assert_eq!(proba.dim(), (6, 3));
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_labels_follow_confidence_argmax() {
        let (x, y) = clusters();
        let mut model = LogisticRegression::new(LogisticConfig {
            c: 100.0,
            max_iter: 500,
            ..Default::default()
        })
        .unwrap();
        model.fit(x.view(), &y).unwrap();
        assert_eq!(model.predict_labels(x.view()).unwrap(), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_score_is_mean_spearman() {
        let (x, y) = clusters();
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        let score = model.score(x.view(), &y).unwrap();
        let expected = mean_row_spearman(y.view(), model.predict(x.view()).unwrap().view());
        assert_eq!(score, expected);
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn test_rejects_single_column_target() {
        let mut model = LogisticRegression::default();
        let x = array![[1.0], [2.0]];
        let y = array![[1.0], [1.0]];
        assert!(matches!(
            model.fit(x.view(), &y),
            Err(EstimatorError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_rejects_bad_config() {
        for c in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                LogisticRegression::new(LogisticConfig {
                    c,
                    ..Default::default()
                }),
                Err(EstimatorError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            LogisticRegression::new(LogisticConfig {
                tol: -1e-4,
                ..Default::default()
            }),
            Err(EstimatorError::InvalidConfig(_))
        ));
        assert!(LogisticRegression::new(LogisticConfig::default()).is_ok());
    }

    #[test]
    fn test_score_rejects_nan_confidence() {
        let (x, mut y) = clusters();
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        y[[2, 1]] = f64::NAN;
        assert!(matches!(
            model.score(x.view(), &y),
            Err(EstimatorError::Validation(_))
        ));
    }

    #[test]
    fn test_not_fitted() {
        let model = LogisticRegression::default();
        assert!(matches!(
            model.predict(array![[1.0]].view()),
            Err(EstimatorError::NotFitted("LogisticRegression"))
        ));
    }

    #[test]
    fn test_config_serializes_c() {
        let json = serde_json::to_string(&LogisticConfig::default()).unwrap();
        assert!(json.contains("\"C\":1.0"));
    }
}
