//! Diagnostic artifacts written by estimators
//!
//! Each artifact is keyed by an operation name such as
//! `KernelEstimatorScore`; file sinks turn that into `<dir>/<name>.png` or
//! `<dir>/<name>.csv`.

use std::fmt;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::EstimatorError;

const IMAGE_SIZE: (u32, u32) = (640, 480);

/// Destination for estimator diagnostics
pub trait DiagnosticSink: fmt::Debug {
    /// Density histogram of `values`
    fn histogram(&self, name: &str, values: &[f64], bins: usize) -> Result<(), EstimatorError>;

    /// `values` plotted against their index
    fn points(&self, name: &str, values: &[f64]) -> Result<(), EstimatorError>;

    /// One indexed column of values
    fn table(&self, name: &str, column: &str, values: &[f64]) -> Result<(), EstimatorError>;
}

/// Writes PNG plots and CSV tables into a directory
#[derive(Debug, Clone)]
pub struct FileDiagnostics {
    dir: PathBuf,
}

impl FileDiagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str, extension: &str) -> Result<PathBuf, EstimatorError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            EstimatorError::Diagnostics(format!("cannot create {}: {e}", self.dir.display()))
        })?;
        Ok(self.dir.join(format!("{name}.{extension}")))
    }
}

fn plot_error<E: fmt::Display>(e: E) -> EstimatorError {
    EstimatorError::Diagnostics(format!("plot failed: {e}"))
}

/// Range that plotters can draw even for empty or constant data
fn axis_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 0.5)..(hi + 0.5);
    }
    lo..hi
}

/// Bin edges and densities, each bar integrating to its share of the data
fn density(values: &[f64], bins: usize) -> (f64, f64, Vec<f64>) {
    let range = axis_range(values.iter().copied());
    let width = (range.end - range.start) / bins as f64;
    let mut counts = vec![0.0; bins];
    for &v in values {
        let bin = (((v - range.start) / width) as usize).min(bins - 1);
        counts[bin] += 1.0;
    }
    let scale = if values.is_empty() {
        0.0
    } else {
        1.0 / (values.len() as f64 * width)
    };
    counts.iter_mut().for_each(|c| *c *= scale);
    (range.start, width, counts)
}

impl DiagnosticSink for FileDiagnostics {
    fn histogram(&self, name: &str, values: &[f64], bins: usize) -> Result<(), EstimatorError> {
        let path = self.path(name, "png")?;
        let bins = bins.max(1);
        let (start, width, heights) = density(values, bins);
        let top = heights.iter().copied().fold(0.0, f64::max).max(f64::MIN_POSITIVE);

        let root = BitMapBackend::new(&path, IMAGE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        {
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .build_cartesian_2d(start..start + width * bins as f64, 0.0..top * 1.05)
                .map_err(plot_error)?;
            chart
                .draw_series(heights.iter().enumerate().map(|(i, &h)| {
                    let left = start + width * i as f64;
                    Rectangle::new([(left, 0.0), (left + width, h)], BLUE.mix(0.6).filled())
                }))
                .map_err(plot_error)?;
        }
        root.present().map_err(plot_error)?;
        debug!(path = %path.display(), values = values.len(), bins, "wrote histogram");
        Ok(())
    }

    fn points(&self, name: &str, values: &[f64]) -> Result<(), EstimatorError> {
        let path = self.path(name, "png")?;
        let x_range = 0.0..(values.len().max(1) as f64);
        let y_range = axis_range(values.iter().copied());

        let root = BitMapBackend::new(&path, IMAGE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        {
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .build_cartesian_2d(x_range, y_range)
                .map_err(plot_error)?;
            chart
                .draw_series(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, &v)| Circle::new((i as f64, v), 3, BLUE.filled())),
                )
                .map_err(plot_error)?;
        }
        root.present().map_err(plot_error)?;
        debug!(path = %path.display(), values = values.len(), "wrote point plot");
        Ok(())
    }

    fn table(&self, name: &str, column: &str, values: &[f64]) -> Result<(), EstimatorError> {
        let path = self.path(name, "csv")?;
        let csv_error = |e: csv::Error| EstimatorError::Diagnostics(format!("csv failed: {e}"));

        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        writer.write_record(["", column]).map_err(csv_error)?;
        for (i, v) in values.iter().enumerate() {
            writer
                .write_record([i.to_string(), v.to_string()])
                .map_err(csv_error)?;
        }
        writer
            .flush()
            .map_err(|e| EstimatorError::Diagnostics(format!("csv flush failed: {e}")))?;
        debug!(path = %path.display(), rows = values.len(), "wrote table");
        Ok(())
    }
}
