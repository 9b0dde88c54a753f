//! Spearman rank correlation

use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

/// 1-based ranks, ties sharing the average of their positions
pub fn rank(values: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = Array1::zeros(values.len());
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold equal values
        let average = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        start = end;
    }
    ranks
}

/// Rank correlation of two equally long vectors.
///
/// Returns `None` when either side is constant or shorter than two.
pub fn spearman(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    pearson(rank(a).view(), rank(b).view())
}

fn pearson(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Option<f64> {
    let mean_a = a.mean()?;
    let mean_b = b.mean()?;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    Zip::from(a).and(b).for_each(|&x, &y| {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    });
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a * var_b).sqrt())
}

/// Mean over rows of the rank correlation between `truth` and `predicted`.
///
/// Rows where the correlation is undefined contribute 0.
pub fn mean_row_spearman(truth: ArrayView2<'_, f64>, predicted: ArrayView2<'_, f64>) -> f64 {
    let rows = truth.nrows();
    if rows == 0 {
        return 0.0;
    }
    let total: f64 = truth
        .outer_iter()
        .zip(predicted.outer_iter())
        .map(|(t, p)| spearman(t, p).unwrap_or(0.0))
        .sum();
    total / rows as f64
}
