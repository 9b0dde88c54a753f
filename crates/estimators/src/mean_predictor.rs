//! Column-mean baseline

use data_validator::{check_array, check_x_y};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::debug;

use crate::estimator::Estimator;
use crate::spearman::mean_row_spearman;
use crate::EstimatorError;

/// Predicts the training mean of every confidence column, ignoring `x`
#[derive(Debug, Clone, Default)]
pub struct MeanPredictor {
    mean: Option<Array1<f64>>,
}

impl MeanPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }
}

impl Estimator for MeanPredictor {
    type Target = Array2<f64>;
    type Prediction = Array2<f64>;

    fn name(&self) -> &'static str {
        "MeanPredictor"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &Array2<f64>) -> Result<(), EstimatorError> {
        check_x_y(x, y.nrows())?;
        check_array(y.view())?;
        let mean = y
            .mean_axis(Axis(0))
            .ok_or_else(|| EstimatorError::InvalidTarget("empty target".to_string()))?;
        debug!(columns = mean.len(), "mean predictor fitted");
        self.mean = Some(mean);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EstimatorError> {
        check_array(x)?;
        let mean = self
            .mean
            .as_ref()
            .ok_or(EstimatorError::NotFitted("MeanPredictor"))?;
        let columns = mean.len();
        Ok(mean
            .broadcast((x.nrows(), columns))
            .map(|b| b.to_owned())
            .unwrap_or_else(|| Array2::zeros((x.nrows(), columns))))
    }

    fn score(&self, x: ArrayView2<'_, f64>, y: &Array2<f64>) -> Result<f64, EstimatorError> {
        check_x_y(x, y.nrows())?;
        check_array(y.view())?;
        let predicted = self.predict(x)?;
        Ok(mean_row_spearman(y.view(), predicted.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::ValidationError;
    use ndarray::array;

    #[test]
    fn test_predicts_column_means() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = array![[0.2, 0.8], [0.4, 0.6], [0.6, 0.4]];
        let mut model = MeanPredictor::new();
        model.fit(x.view(), &y).unwrap();

        let prediction = model.predict(Array2::zeros((2, 7)).view()).unwrap();
        assert_eq!(prediction.dim(), (2, 2));
        for row in prediction.outer_iter() {
            assert!((row[0] - 0.4).abs() < 1e-12);
            assert!((row[1] - 0.6).abs() < 1e-12);
        }
    }

    #[test]
    fn test_score_rewards_shared_ranking() {
        let x = Array2::<f64>::zeros((2, 1));
        let y = array![[0.1, 0.3, 0.6], [0.2, 0.3, 0.5]];
        let mut model = MeanPredictor::new();
        model.fit(x.view(), &y).unwrap();
        assert!((model.score(x.view(), &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_validates_input() {
        let mut model = MeanPredictor::new();
        model
            .fit(Array2::zeros((2, 1)).view(), &array![[0.2, 0.8], [0.4, 0.6]])
            .unwrap();
        assert!(matches!(
            model.predict(array![[f64::NAN]].view()),
            Err(EstimatorError::Validation(ValidationError::NonFinite { row: 0, col: 0 }))
        ));
        assert!(matches!(
            model.predict(Array2::zeros((0, 0)).view()),
            Err(EstimatorError::Validation(ValidationError::Empty { .. }))
        ));
    }

    #[test]
    fn test_score_rejects_nan_confidence() {
        let x = Array2::<f64>::zeros((2, 1));
        let mut model = MeanPredictor::new();
        model.fit(x.view(), &array![[0.2, 0.8], [0.4, 0.6]]).unwrap();
        assert!(matches!(
            model.score(x.view(), &array![[0.2, f64::NAN], [0.4, 0.6]]),
            Err(EstimatorError::Validation(_))
        ));
    }

    #[test]
    fn test_not_fitted() {
        let model = MeanPredictor::new();
        assert!(matches!(
            model.predict(Array2::zeros((1, 1)).view()),
            Err(EstimatorError::NotFitted("MeanPredictor"))
        ));
    }
}
