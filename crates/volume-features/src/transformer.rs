//! Grid-cell feature transformers

use data_validator::{ValidationConfig, Validator};
use ndarray::{s, Array2, ArrayView2};
use tracing::{debug, info};

use crate::config::{GradientConfig, GridConfig, HistogramConfig, VolumeGeometry};
use crate::grid::GridSpec;
use crate::statistics::{
    CellStatistic, GradientStatistic, HistogramStatistic, MeanStatistic, MedianStatistic,
};
use crate::volume::volumes;
use crate::FeatureError;

/// Batch feature transformer: `fit` checks the input, `transform` maps
/// `(N, features_in)` to `(N, output_width())`.
pub trait Transformer {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Number of output columns per sample
    fn output_width(&self) -> usize;

    /// Validate a training batch. Transformers keep no learned state.
    fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<(), FeatureError>;

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError>;

    fn fit_transform(&mut self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError> {
        self.fit(x)?;
        self.transform(x)
    }
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn output_width(&self) -> usize {
        (**self).output_width()
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<(), FeatureError> {
        (**self).fit(x)
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError> {
        (**self).transform(x)
    }
}

/// Splits every volume into a grid and writes one statistic per cell.
///
/// Output columns are the row-major flattening of an
/// `(x_cells, y_cells, z_cells, statistic.width())` tensor.
#[derive(Debug, Clone)]
pub struct CellFeatureTransformer<S> {
    name: &'static str,
    geometry: VolumeGeometry,
    grid: GridConfig,
    spec: GridSpec,
    statistic: S,
    validator: Validator,
}

/// Per-cell intensity histogram
pub type IntensityHistogram = CellFeatureTransformer<HistogramStatistic>;
/// Per-cell mean intensity
pub type IntensityMean = CellFeatureTransformer<MeanStatistic>;
/// Per-cell median intensity
pub type IntensityMedian = CellFeatureTransformer<MedianStatistic>;
/// Per-cell mean gradient along X, Y and Z
pub type MeanIntensityGradient = CellFeatureTransformer<GradientStatistic>;

impl<S: CellStatistic> CellFeatureTransformer<S> {
    /// Build a transformer around any cell statistic
    pub fn with_statistic(
        name: &'static str,
        geometry: VolumeGeometry,
        grid: GridConfig,
        statistic: S,
    ) -> Result<Self, FeatureError> {
        geometry.validate()?;
        grid.validate(&geometry)?;
        Ok(Self {
            name,
            geometry,
            grid,
            spec: GridSpec::new(&grid, &geometry),
            statistic,
            validator: Validator::new(ValidationConfig::with_features(geometry.voxel_count())),
        })
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn grid_spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn statistic(&self) -> &S {
        &self.statistic
    }
}

impl IntensityHistogram {
    pub fn new(
        geometry: VolumeGeometry,
        grid: GridConfig,
        histogram: HistogramConfig,
    ) -> Result<Self, FeatureError> {
        let statistic = HistogramStatistic::new(histogram.bins, geometry.value_max)?;
        Self::with_statistic("IntensityHistogram", geometry, grid, statistic)
    }
}

impl IntensityMean {
    pub fn new(geometry: VolumeGeometry, grid: GridConfig) -> Result<Self, FeatureError> {
        Self::with_statistic("IntensityMean", geometry, grid, MeanStatistic)
    }
}

impl IntensityMedian {
    pub fn new(geometry: VolumeGeometry, grid: GridConfig) -> Result<Self, FeatureError> {
        Self::with_statistic("IntensityMedian", geometry, grid, MedianStatistic)
    }
}

impl MeanIntensityGradient {
    /// `gradient.bins` is carried for configuration compatibility only
    pub fn new(
        geometry: VolumeGeometry,
        grid: GridConfig,
        gradient: GradientConfig,
    ) -> Result<Self, FeatureError> {
        debug!(bins = gradient.bins, "gradient bin count is not used by the mean gradient");
        Self::with_statistic("MeanIntensityGradient", geometry, grid, GradientStatistic)
    }
}

impl<S: CellStatistic> Transformer for CellFeatureTransformer<S> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn output_width(&self) -> usize {
        self.spec.cell_count() * self.statistic.width()
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<(), FeatureError> {
        info!(
            transformer = self.name,
            x_cells = self.grid.x_cells,
            y_cells = self.grid.y_cells,
            z_cells = self.grid.z_cells,
            width = self.statistic.width(),
            "fit"
        );
        self.validator.validate_batch(x)?;
        Ok(())
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError> {
        self.validator.validate_batch(x)?;
        debug!(
            transformer = self.name,
            samples = x.nrows(),
            features = x.ncols(),
            "transform input"
        );

        let batch = x.as_standard_layout();
        let width = self.statistic.width();
        let mut features = Array2::zeros((x.nrows(), self.output_width()));

        for (volume, mut row) in volumes(batch.view(), &self.geometry)?
            .into_iter()
            .zip(features.outer_iter_mut())
        {
            for (k, cell) in self.spec.cells().enumerate() {
                let out = row.slice_mut(s![k * width..(k + 1) * width]);
                self.statistic.compute(cell.block(volume), out);
            }
        }

        debug!(
            transformer = self.name,
            statistic = self.statistic.name(),
            samples = features.nrows(),
            features = features.ncols(),
            "transform output"
        );
        Ok(features)
    }
}
