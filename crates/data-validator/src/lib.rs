//! Batch Validation
//!
//! Shared input checks for feature transformers and estimators: every batch is
//! a 2D array of finite values, optionally with a fixed column count and a
//! target with one entry per sample.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{check_array, check_x_y, ValidationConfig, Validator};
