//! Per-cell statistics
//!
//! Each statistic maps one cell block to a fixed number of values. The grid
//! walk is shared by every transformer; only the statistic varies.

use ndarray::{ArrayView1, ArrayView3, ArrayViewMut1, Axis};

use crate::FeatureError;

/// Statistic computed over the voxels of one cell
pub trait CellStatistic {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Number of values written per cell
    fn width(&self) -> usize;

    /// Write `width()` values for `block` into `out`
    fn compute(&self, block: ArrayView3<'_, f64>, out: ArrayViewMut1<'_, f64>);
}

/// Arithmetic mean of the cell
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanStatistic;

impl CellStatistic for MeanStatistic {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn width(&self) -> usize {
        1
    }

    fn compute(&self, block: ArrayView3<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        out[0] = block.mean().unwrap_or(0.0);
    }
}

/// Median of the cell, averaging the middle pair for even counts
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianStatistic;

impl CellStatistic for MedianStatistic {
    fn name(&self) -> &'static str {
        "median"
    }

    fn width(&self) -> usize {
        1
    }

    fn compute(&self, block: ArrayView3<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        let mut values: Vec<f64> = block.iter().copied().collect();
        out[0] = median(&mut values);
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Voxel counts in equal-width bins over `[0, value_max]`.
///
/// Values outside the range are ignored; `value_max` itself lands in the last
/// bin.
#[derive(Debug, Clone, Copy)]
pub struct HistogramStatistic {
    bins: usize,
    value_max: f64,
}

impl HistogramStatistic {
    pub fn new(bins: usize, value_max: f64) -> Result<Self, FeatureError> {
        if bins == 0 {
            return Err(FeatureError::InvalidConfig(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if !(value_max.is_finite() && value_max > 0.0) {
            return Err(FeatureError::InvalidConfig(format!(
                "histogram range must be positive, got {value_max}"
            )));
        }
        Ok(Self { bins, value_max })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Lower edge of bin `i`
    fn edge(&self, i: usize) -> f64 {
        i as f64 * (self.value_max / self.bins as f64)
    }

    fn bin_of(&self, value: f64) -> Option<usize> {
        if !(0.0..=self.value_max).contains(&value) {
            return None;
        }
        let norm = self.bins as f64 / self.value_max;
        let mut bin = ((value * norm) as usize).min(self.bins - 1);
        // the scaled index can be off by one next to an edge
        if value < self.edge(bin) {
            bin -= 1;
        } else if bin + 1 < self.bins && value >= self.edge(bin + 1) {
            bin += 1;
        }
        Some(bin)
    }
}

impl CellStatistic for HistogramStatistic {
    fn name(&self) -> &'static str {
        "histogram"
    }

    fn width(&self) -> usize {
        self.bins
    }

    fn compute(&self, block: ArrayView3<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        out.fill(0.0);
        for bin in block.iter().filter_map(|&v| self.bin_of(v)) {
            out[bin] += 1.0;
        }
    }
}

/// Mean of the discrete gradient along X, Y and Z.
///
/// The gradient uses central differences inside the cell and one-sided
/// differences on its border; an axis only one voxel thick has zero gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientStatistic;

impl CellStatistic for GradientStatistic {
    fn name(&self) -> &'static str {
        "gradient"
    }

    fn width(&self) -> usize {
        3
    }

    fn compute(&self, block: ArrayView3<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        let count = block.len();
        for axis in 0..3 {
            out[axis] = if count == 0 {
                0.0
            } else {
                let total: f64 = block.lanes(Axis(axis)).into_iter().map(lane_gradient_sum).sum();
                total / count as f64
            };
        }
    }
}

/// Sum of the gradient along one lane
fn lane_gradient_sum(lane: ArrayView1<'_, f64>) -> f64 {
    let n = lane.len();
    if n < 2 {
        return 0.0;
    }
    let edges = (lane[1] - lane[0]) + (lane[n - 1] - lane[n - 2]);
    let interior: f64 = (1..n - 1).map(|i| (lane[i + 1] - lane[i - 1]) / 2.0).sum();
    edges + interior
}
