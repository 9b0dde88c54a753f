//! Learners wrapped by the estimator adapters

mod network;
mod softmax;

pub use network::{Mlp, MlpConfig};
pub use softmax::{SoftmaxConfig, SoftmaxRegression};
