//! Kernel-form least squares regression

use std::path::PathBuf;

use data_validator::{check_x_y, ValidationConfig, Validator};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView2};
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticSink, FileDiagnostics};
use crate::estimator::Estimator;
use crate::EstimatorError;

const COEF_HISTOGRAM_BINS: usize = 50;

#[derive(Debug, Clone)]
struct KernelFit {
    coef: Array1<f64>,
    y_mean: f64,
}

/// Linear regression solved in the dual.
///
/// `fit` centers `y`, solves `(X Xᵀ) α = y - mean(y)` by least squares and
/// keeps `coef = Xᵀ α`. `predict` returns `X coef + mean(y)`.
#[derive(Debug, Default)]
pub struct KernelEstimator {
    fitted: Option<KernelFit>,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl KernelEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write diagnostics as files under `dir`
    pub fn with_save_path(dir: impl Into<PathBuf>) -> Self {
        Self {
            fitted: None,
            sink: Some(Box::new(FileDiagnostics::new(dir))),
        }
    }

    pub fn with_sink(sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            fitted: None,
            sink: Some(sink),
        }
    }

    /// Replace the diagnostics directory; `None` disables diagnostics
    pub fn set_save_path(&mut self, dir: Option<PathBuf>) {
        self.sink = dir.map(|d| Box::new(FileDiagnostics::new(d)) as Box<dyn DiagnosticSink>);
    }

    pub fn coef(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.coef)
    }

    pub fn y_mean(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.y_mean)
    }

    fn fitted(&self) -> Result<&KernelFit, EstimatorError> {
        self.fitted.as_ref().ok_or(EstimatorError::NotFitted("KernelEstimator"))
    }
}

/// Minimum-norm least squares solution of `a x = b`
fn lstsq(a: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>, EstimatorError> {
    let size = a.nrows().max(a.ncols());
    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    // singular values below this are treated as zero
    let eps = f64::EPSILON * size as f64 * largest;
    svd.solve(&b, eps)
        .map_err(|e| EstimatorError::Linalg(e.to_string()))
}

impl Estimator for KernelEstimator {
    type Target = Array1<f64>;
    type Prediction = Array1<f64>;

    fn name(&self) -> &'static str {
        "KernelEstimator"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &Array1<f64>) -> Result<(), EstimatorError> {
        check_x_y(x, y.len())?;
        let (samples, features) = x.dim();
        info!(samples, features, "fitting kernel estimator");

        let y_mean = y.mean().unwrap_or(0.0);
        let centered = y - y_mean;
        let gram = x.dot(&x.t());

        let alpha = lstsq(
            DMatrix::from_fn(samples, samples, |i, j| gram[[i, j]]),
            DVector::from_iterator(samples, centered.iter().copied()),
        )?;
        let coef = x.t().dot(&Array1::from_iter(alpha.iter().copied()));

        if !coef.iter().all(|c| c.is_finite()) {
            return Err(EstimatorError::Linalg(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        if let Some(sink) = &self.sink {
            let nonzero: Vec<f64> = coef.iter().copied().filter(|&c| c != 0.0).collect();
            sink.histogram("KernelEstimatorCoef", &nonzero, COEF_HISTOGRAM_BINS)?;
        }

        debug!(y_mean, coefficients = coef.len(), "kernel estimator fitted");
        self.fitted = Some(KernelFit { coef, y_mean });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, EstimatorError> {
        let fit = self.fitted()?;
        Validator::new(ValidationConfig::with_features(fit.coef.len())).validate_batch(x)?;

        let prediction = x.dot(&fit.coef) + fit.y_mean;

        if let Some(sink) = &self.sink {
            sink.points("KernelEstimatorPrediction", &prediction.to_vec())?;
        }
        Ok(prediction)
    }

    /// Sum over samples of `(prediction - y)² / n`
    fn score(&self, x: ArrayView2<'_, f64>, y: &Array1<f64>) -> Result<f64, EstimatorError> {
        check_x_y(x, y.len())?;
        let n = y.len() as f64;
        let scores = (self.predict(x)? - y).mapv(|r| r * r / n);
        let score = scores.sum();

        if let Some(sink) = &self.sink {
            let values = scores.to_vec();
            sink.points("KernelEstimatorScore", &values)?;
            sink.table("KernelEstimatorScore", "score", &values)?;
        }

        debug!(score, samples = y.len(), "kernel estimator scored");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct RecordingSink {
        calls: RefCell<Vec<String>>,
    }

    impl DiagnosticSink for std::rc::Rc<RecordingSink> {
        fn histogram(&self, name: &str, _values: &[f64], bins: usize) -> Result<(), EstimatorError> {
            self.calls.borrow_mut().push(format!("histogram:{name}:{bins}"));
            Ok(())
        }

        fn points(&self, name: &str, _values: &[f64]) -> Result<(), EstimatorError> {
            self.calls.borrow_mut().push(format!("points:{name}"));
            Ok(())
        }

        fn table(&self, name: &str, column: &str, _values: &[f64]) -> Result<(), EstimatorError> {
            self.calls.borrow_mut().push(format!("table:{name}:{column}"));
            Ok(())
        }
    }

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        // constant first column keeps the centered target in the row space
        let x = Array2::from_shape_fn((6, 10), |(i, j)| {
            if j == 0 {
                1.0
            } else {
                ((i * 7 + j * 3) % 11) as f64 - 5.0
            }
        });
        let w = Array1::from_shape_fn(10, |j| 0.5 - j as f64 * 0.1);
        let y = x.dot(&w) + 3.0;
        (x, y)
    }

    #[test]
    fn test_recovers_linear_function() {
        let (x, y) = linear_data();
        let mut est = KernelEstimator::new();
        est.fit(x.view(), &y).unwrap();
        let prediction = est.predict(x.view()).unwrap();
        for (p, t) in prediction.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-6, "{p} vs {t}");
        }
        assert!(est.score(x.view(), &y).unwrap() < 1e-10);
    }

    #[test]
    fn test_score_formula() {
        // rank-one system: y ≈ 0.2 x + 2 after centering
        let mut est = KernelEstimator::new();
        let x = array![[1.0], [2.0]];
        est.fit(x.view(), &array![1.0, 3.0]).unwrap();
        assert!((est.coef().unwrap()[0] - 0.2).abs() < 1e-12);
        assert_eq!(est.y_mean(), Some(2.0));

        // ((2.2 - 1)² + (2.4 - 3)²) / 2
        let score = est.score(x.view(), &array![1.0, 3.0]).unwrap();
        assert!((score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_not_fitted() {
        let est = KernelEstimator::new();
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            est.predict(x.view()),
            Err(EstimatorError::NotFitted("KernelEstimator"))
        ));
    }

    #[test]
    fn test_feature_mismatch_after_fit() {
        let (x, y) = linear_data();
        let mut est = KernelEstimator::new();
        est.fit(x.view(), &y).unwrap();
        let narrow = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            est.predict(narrow.view()),
            Err(EstimatorError::Validation(_))
        ));
    }

    #[test]
    fn test_singular_system_still_solves() {
        // duplicate rows make X Xᵀ singular
        let x = array![[1.0, 2.0], [1.0, 2.0], [0.0, 1.0]];
        let y = array![2.0, 2.0, 1.0];
        let mut est = KernelEstimator::new();
        est.fit(x.view(), &y).unwrap();
        let prediction = est.predict(x.view()).unwrap();
        assert!((prediction[0] - 2.0).abs() < 1e-8);
        assert!((prediction[2] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_diagnostics_keys() {
        let sink = std::rc::Rc::new(RecordingSink::default());
        let mut est = KernelEstimator::with_sink(Box::new(sink.clone()));
        let (x, y) = linear_data();
        est.fit(x.view(), &y).unwrap();
        est.score(x.view(), &y).unwrap();
        assert_eq!(
            *sink.calls.borrow(),
            vec![
                "histogram:KernelEstimatorCoef:50".to_string(),
                "points:KernelEstimatorPrediction".to_string(),
                "points:KernelEstimatorScore".to_string(),
                "table:KernelEstimatorScore:score".to_string(),
            ]
        );
    }

    #[test]
    fn test_set_save_path_writes_files() {
        let dir = std::env::temp_dir().join(format!("kernel-estimator-{}", std::process::id()));
        let mut est = KernelEstimator::new();
        est.set_save_path(Some(dir.clone()));
        let (x, y) = linear_data();
        est.fit(x.view(), &y).unwrap();
        est.score(x.view(), &y).unwrap();
        for file in [
            "KernelEstimatorCoef.png",
            "KernelEstimatorPrediction.png",
            "KernelEstimatorScore.png",
            "KernelEstimatorScore.csv",
        ] {
            assert!(dir.join(file).exists(), "{file} missing");
        }
        std::fs::remove_dir_all(dir).ok();
    }
}
