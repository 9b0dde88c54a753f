//! Multi-layer perceptron regressor

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Width of each hidden layer, input side first
    pub hidden_layer_sizes: Vec<usize>,
    /// L2 penalty on the weights
    pub alpha: f64,
    /// Adam step size
    pub learning_rate: f64,
    /// Maximum number of epochs
    pub max_iter: usize,
    /// Mini-batch size; `None` uses `min(200, n_samples)`
    pub batch_size: Option<usize>,
    /// Minimum loss improvement that resets the patience counter
    pub tol: f64,
    /// Epochs without improvement before stopping
    pub n_iter_no_change: usize,
    /// Seed for weight initialisation and shuffling
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: vec![100],
            alpha: 1e-4,
            learning_rate: 1e-3,
            max_iter: 200,
            batch_size: None,
            tol: 1e-4,
            n_iter_no_change: 10,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

/// First and second moment estimates for one layer
#[derive(Debug, Clone)]
struct Moments {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;

/// ReLU hidden layers and a single linear output, trained on squared loss
/// with Adam.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Layer>,
    loss_curve: Vec<f64>,
}

impl Mlp {
    pub fn fit(config: &MlpConfig, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Self {
        let (samples, features) = x.dim();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut sizes = Vec::with_capacity(config.hidden_layer_sizes.len() + 2);
        sizes.push(features);
        sizes.extend(&config.hidden_layer_sizes);
        sizes.push(1);

        // Glorot uniform initialisation
        let mut layers: Vec<Layer> = sizes
            .windows(2)
            .map(|w| {
                let (fan_in, fan_out) = (w[0], w[1]);
                let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
                Layer {
                    weights: Array2::from_shape_fn((fan_in, fan_out), |_| {
                        rng.random_range(-bound..bound)
                    }),
                    bias: Array1::from_shape_fn(fan_out, |_| rng.random_range(-bound..bound)),
                }
            })
            .collect();
        let mut moments: Vec<Moments> = layers
            .iter()
            .map(|l| Moments {
                m_w: Array2::zeros(l.weights.raw_dim()),
                v_w: Array2::zeros(l.weights.raw_dim()),
                m_b: Array1::zeros(l.bias.len()),
                v_b: Array1::zeros(l.bias.len()),
            })
            .collect();

        let batch_size = config.batch_size.unwrap_or(200).clamp(1, samples.max(1));
        let mut order: Vec<usize> = (0..samples).collect();
        let mut loss_curve = Vec::new();
        let mut best_loss = f64::INFINITY;
        let mut stale_epochs = 0;
        let mut t = 0;

        for epoch in 0..config.max_iter {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for chunk in order.chunks(batch_size) {
                let xb = x.select(Axis(0), chunk);
                let yb = y.select(Axis(0), chunk);
                let (loss, grads) = backprop(&layers, xb.view(), yb.view(), config.alpha);
                epoch_loss += loss * chunk.len() as f64;

                t += 1;
                adam_step(&mut layers, &mut moments, grads, config.learning_rate, t);
            }

            let epoch_loss = epoch_loss / samples as f64;
            trace!(epoch, loss = epoch_loss, "mlp epoch");
            loss_curve.push(epoch_loss);

            if epoch_loss > best_loss - config.tol {
                stale_epochs += 1;
            } else {
                stale_epochs = 0;
            }
            best_loss = best_loss.min(epoch_loss);
            if stale_epochs > config.n_iter_no_change {
                debug!(epoch, "mlp training stopped early");
                break;
            }
        }

        debug!(
            epochs = loss_curve.len(),
            loss = loss_curve.last().copied().unwrap_or(f64::NAN),
            "mlp fitted"
        );
        Self { layers, loss_curve }
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let (activations, _) = forward(&self.layers, x);
        let output = activations.last().cloned().unwrap_or_else(|| x.to_owned());
        output.column(0).to_owned()
    }

    pub fn n_features(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weights.nrows())
    }

    /// Mean training loss per epoch
    pub fn loss_curve(&self) -> &[f64] {
        &self.loss_curve
    }
}

/// Activations of every layer (input first) and hidden pre-activations
fn forward(layers: &[Layer], x: ArrayView2<'_, f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
    let mut activations = vec![x.to_owned()];
    let mut pre = Vec::with_capacity(layers.len());
    for (i, layer) in layers.iter().enumerate() {
        let z = activations[i].dot(&layer.weights) + &layer.bias;
        let a = if i + 1 < layers.len() {
            z.mapv(|v| v.max(0.0))
        } else {
            z.clone()
        };
        pre.push(z);
        activations.push(a);
    }
    (activations, pre)
}

/// Half mean squared error plus L2 term, and gradients per layer
fn backprop(
    layers: &[Layer],
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    alpha: f64,
) -> (f64, Vec<(Array2<f64>, Array1<f64>)>) {
    let n = x.nrows() as f64;
    let (activations, pre) = forward(layers, x);
    let output = &activations[layers.len()];

    let mut delta = output - &y.insert_axis(Axis(1));
    let squared: f64 = delta.mapv(|d| d * d).sum();
    let l2: f64 = layers.iter().map(|l| l.weights.mapv(|w| w * w).sum()).sum();
    let loss = squared / (2.0 * n) + alpha * l2 / (2.0 * n);

    delta /= n;
    let mut grads = Vec::with_capacity(layers.len());
    for i in (0..layers.len()).rev() {
        let grad_w = activations[i].t().dot(&delta) + &(&layers[i].weights * (alpha / n));
        let grad_b = delta.sum_axis(Axis(0));
        if i > 0 {
            let mut next = delta.dot(&layers[i].weights.t());
            next.zip_mut_with(&pre[i - 1], |d, &z| {
                if z <= 0.0 {
                    *d = 0.0;
                }
            });
            delta = next;
        }
        grads.push((grad_w, grad_b));
    }
    grads.reverse();
    (loss, grads)
}

fn adam_step(
    layers: &mut [Layer],
    moments: &mut [Moments],
    grads: Vec<(Array2<f64>, Array1<f64>)>,
    learning_rate: f64,
    t: i32,
) {
    let step = learning_rate * (1.0 - BETA2.powi(t)).sqrt() / (1.0 - BETA1.powi(t));
    for ((layer, m), (grad_w, grad_b)) in layers.iter_mut().zip(moments.iter_mut()).zip(grads) {
        m.m_w = &m.m_w * BETA1 + &(&grad_w * (1.0 - BETA1));
        m.v_w = &m.v_w * BETA2 + &(grad_w.mapv(|g| g * g) * (1.0 - BETA2));
        m.m_b = &m.m_b * BETA1 + &(&grad_b * (1.0 - BETA1));
        m.v_b = &m.v_b * BETA2 + &(grad_b.mapv(|g| g * g) * (1.0 - BETA2));

        Zip::from(&mut layer.weights)
            .and(&m.m_w)
            .and(&m.v_w)
            .for_each(|w, &mw, &vw| *w -= step * mw / (vw.sqrt() + ADAM_EPS));
        Zip::from(&mut layer.bias)
            .and(&m.m_b)
            .and(&m.v_b)
            .for_each(|b, &mb, &vb| *b -= step * mb / (vb.sqrt() + ADAM_EPS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((80, 2), |(i, j)| {
            if j == 0 {
                (i % 10) as f64 / 10.0
            } else {
                (i / 10) as f64 / 8.0
            }
        });
        let y = x.column(0).mapv(|v| 2.0 * v) + &x.column(1) - 0.5;
        (x, y)
    }

    #[test]
    fn test_fits_linear_target() {
        let (x, y) = ramp();
        let config = MlpConfig {
            hidden_layer_sizes: vec![16],
            learning_rate: 0.01,
            max_iter: 400,
            batch_size: Some(16),
            ..Default::default()
        };
        let mlp = Mlp::fit(&config, x.view(), y.view());
        let curve = mlp.loss_curve();
        assert!(curve.last().unwrap() < &curve[0]);

        let prediction = mlp.predict(x.view());
        let mse = (&prediction - &y).mapv(|r| r * r).mean().unwrap();
        assert!(mse < 0.05, "mse {mse}");
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (x, y) = ramp();
        let config = MlpConfig {
            hidden_layer_sizes: vec![4, 3],
            max_iter: 5,
            ..Default::default()
        };
        let a = Mlp::fit(&config, x.view(), y.view()).predict(x.view());
        let b = Mlp::fit(&config, x.view(), y.view()).predict(x.view());
        assert_eq!(a, b);
        assert_eq!(a.len(), 80);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let (x, y) = ramp();
        let config = MlpConfig {
            hidden_layer_sizes: vec![3],
            max_iter: 0,
            ..Default::default()
        };
        let mut layers = Mlp::fit(&config, x.view(), y.view()).layers;
        let (_, grads) = backprop(&layers, x.view(), y.view(), 1e-3);

        let h = 1e-6;
        let analytic = grads[0].0[[1, 2]];
        layers[0].weights[[1, 2]] += h;
        let (up, _) = backprop(&layers, x.view(), y.view(), 1e-3);
        layers[0].weights[[1, 2]] -= 2.0 * h;
        let (down, _) = backprop(&layers, x.view(), y.view(), 1e-3);
        let numeric = (up - down) / (2.0 * h);
        assert!((analytic - numeric).abs() < 1e-5, "{analytic} vs {numeric}");
    }
}
