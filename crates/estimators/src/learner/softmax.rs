//! Multinomial logistic regression

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Training parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxConfig {
    /// Inverse L2 regularisation strength
    pub c: f64,
    /// Gradient steps before giving up
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this
    pub tol: f64,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
        }
    }
}

/// Softmax classifier with an unpenalised intercept.
///
/// Minimises the mean cross-entropy plus `‖W‖² / (2 C n)` by gradient descent
/// with a backtracking line search.
#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
    weights: Array2<f64>,
    intercept: Array1<f64>,
    n_iter: usize,
}

struct Evaluation {
    loss: f64,
    grad_w: Array2<f64>,
    grad_b: Array1<f64>,
}

/// Row-wise softmax, stabilised by subtracting each row maximum
fn softmax(mut logits: Array2<f64>) -> Array2<f64> {
    for mut row in logits.outer_iter_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let total = row.sum();
        row /= total;
    }
    logits
}

struct Problem<'a, 'b> {
    x: ArrayView2<'b, f64>,
    onehot: Array2<f64>,
    labels: &'a [usize],
    penalty: f64,
}

impl Problem<'_, '_> {
    fn logits(&self, w: &Array2<f64>, b: &Array1<f64>) -> Array2<f64> {
        self.x.dot(w) + b
    }

    fn loss(&self, w: &Array2<f64>, b: &Array1<f64>) -> f64 {
        let logits = self.logits(w, b);
        let n = self.x.nrows() as f64;
        let nll: f64 = logits
            .outer_iter()
            .zip(self.labels)
            .map(|(row, &label)| {
                let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let lse = max + row.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
                lse - row[label]
            })
            .sum();
        nll / n + 0.5 * self.penalty * w.mapv(|v| v * v).sum()
    }

    fn evaluate(&self, w: &Array2<f64>, b: &Array1<f64>) -> Evaluation {
        let n = self.x.nrows() as f64;
        let residual = softmax(self.logits(w, b)) - &self.onehot;
        Evaluation {
            loss: self.loss(w, b),
            grad_w: self.x.t().dot(&residual) / n + &(w * self.penalty),
            grad_b: residual.sum_axis(Axis(0)) / n,
        }
    }
}

impl SoftmaxRegression {
    /// Fit on class indices `labels`, each below `n_classes`
    pub fn fit(
        config: &SoftmaxConfig,
        x: ArrayView2<'_, f64>,
        labels: &[usize],
        n_classes: usize,
    ) -> Self {
        let (samples, features) = x.dim();
        let mut onehot = Array2::zeros((samples, n_classes));
        for (i, &label) in labels.iter().enumerate() {
            onehot[[i, label]] = 1.0;
        }
        let problem = Problem {
            x,
            onehot,
            labels,
            penalty: 1.0 / (config.c * samples as f64),
        };

        let mut w = Array2::zeros((features, n_classes));
        let mut b = Array1::zeros(n_classes);
        let mut step = 1.0;
        let mut n_iter = 0;

        while n_iter < config.max_iter {
            let eval = problem.evaluate(&w, &b);
            let grad_sq = eval.grad_w.mapv(|g| g * g).sum() + eval.grad_b.mapv(|g| g * g).sum();
            trace!(iteration = n_iter, loss = eval.loss, grad = grad_sq.sqrt(), "softmax step");
            if grad_sq.sqrt() < config.tol {
                break;
            }

            // Armijo backtracking
            let accepted = loop {
                let w_next = &w - &(&eval.grad_w * step);
                let b_next = &b - &(&eval.grad_b * step);
                if problem.loss(&w_next, &b_next) <= eval.loss - 0.5 * step * grad_sq {
                    break Some((w_next, b_next));
                }
                step *= 0.5;
                if step < 1e-12 {
                    break None;
                }
            };

            n_iter += 1;
            match accepted {
                Some((w_next, b_next)) => {
                    w = w_next;
                    b = b_next;
                    step *= 2.0;
                }
                None => break,
            }
        }

        debug!(
            iterations = n_iter,
            loss = problem.loss(&w, &b),
            classes = n_classes,
            "softmax regression fitted"
        );
        Self {
            weights: w,
            intercept: b,
            n_iter,
        }
    }

    /// Class probabilities, one row per sample
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        softmax(x.dot(&self.weights) + &self.intercept)
    }

    pub fn n_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_classes(&self) -> usize {
        self.weights.ncols()
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}
