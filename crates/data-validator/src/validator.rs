//! Batch Validator

use crate::error::ValidationError;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject NaN and infinite values
    pub ensure_finite: bool,
    /// Minimum number of rows
    pub min_samples: usize,
    /// Required number of columns, if fixed
    pub expected_features: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ensure_finite: true,
            min_samples: 1,
            expected_features: None,
        }
    }
}

impl ValidationConfig {
    /// Require every sample to have exactly `features` columns
    pub fn with_features(features: usize) -> Self {
        Self {
            expected_features: Some(features),
            ..Default::default()
        }
    }
}

/// Validator for sample batches
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Access the configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a batch of samples (rows) by features (columns)
    pub fn validate_batch(&self, x: ArrayView2<'_, f64>) -> Result<(), ValidationError> {
        let (samples, features) = x.dim();
        trace!(samples, features, "validating batch");

        if features == 0 || samples == 0 {
            return Err(ValidationError::Empty { samples, features });
        }

        if samples < self.config.min_samples {
            return Err(ValidationError::TooFewSamples {
                min: self.config.min_samples,
                actual: samples,
            });
        }

        if let Some(expected) = self.config.expected_features {
            if features != expected {
                return Err(ValidationError::FeatureMismatch {
                    expected,
                    actual: features,
                });
            }
        }

        if self.config.ensure_finite {
            if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
                return Err(ValidationError::NonFinite { row, col });
            }
        }

        Ok(())
    }

    /// Validate a batch together with the number of targets supplied for it
    pub fn validate_with_targets(
        &self,
        x: ArrayView2<'_, f64>,
        targets: usize,
    ) -> Result<(), ValidationError> {
        self.validate_batch(x)?;
        let samples = x.nrows();
        if samples != targets {
            return Err(ValidationError::SampleMismatch { samples, targets });
        }
        Ok(())
    }
}

/// Check a batch with the default rules
pub fn check_array(x: ArrayView2<'_, f64>) -> Result<(), ValidationError> {
    Validator::default().validate_batch(x)
}

/// Check a batch and its target length with the default rules
pub fn check_x_y(x: ArrayView2<'_, f64>, targets: usize) -> Result<(), ValidationError> {
    Validator::default().validate_with_targets(x, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_valid_batch() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(check_array(x.view()).is_ok());
    }

    #[test]
    fn test_empty_batch() {
        let x = Array2::<f64>::zeros((0, 4));
        assert_eq!(
            check_array(x.view()),
            Err(ValidationError::Empty {
                samples: 0,
                features: 4
            })
        );
    }

    #[test]
    fn test_non_finite() {
        let x = array![[1.0, 2.0], [f64::NAN, 4.0]];
        assert_eq!(
            check_array(x.view()),
            Err(ValidationError::NonFinite { row: 1, col: 0 })
        );

        let x = array![[1.0, f64::INFINITY]];
        assert!(check_array(x.view()).is_err());
    }

    #[test]
    fn test_non_finite_allowed() {
        let validator = Validator::new(ValidationConfig {
            ensure_finite: false,
            ..Default::default()
        });
        let x = array![[f64::NAN]];
        assert!(validator.validate_batch(x.view()).is_ok());
    }

    #[test]
    fn test_feature_mismatch() {
        let validator = Validator::new(ValidationConfig::with_features(3));
        let x = array![[1.0, 2.0]];
        assert_eq!(
            validator.validate_batch(x.view()),
            Err(ValidationError::FeatureMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_min_samples() {
        let validator = Validator::new(ValidationConfig {
            min_samples: 2,
            ..Default::default()
        });
        let x = array![[1.0]];
        assert!(matches!(
            validator.validate_batch(x.view()),
            Err(ValidationError::TooFewSamples { min: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_target_mismatch() {
        let x = array![[1.0], [2.0], [3.0]];
        assert!(check_x_y(x.view(), 3).is_ok());
        assert_eq!(
            check_x_y(x.view(), 2),
            Err(ValidationError::SampleMismatch {
                samples: 3,
                targets: 2
            })
        );
    }
}
