//! Mean and median features side by side

use ndarray::{concatenate, Array2, ArrayView2, Axis};
use tracing::{debug, info};

use crate::config::{GridConfig, VolumeGeometry};
use crate::transformer::{IntensityMean, IntensityMedian, Transformer};
use crate::FeatureError;

/// Mean block followed by median block, both on the same grid
#[derive(Debug, Clone)]
pub struct IntensityMeanAndMedian {
    mean: IntensityMean,
    median: IntensityMedian,
}

impl IntensityMeanAndMedian {
    pub fn new(geometry: VolumeGeometry, grid: GridConfig) -> Result<Self, FeatureError> {
        Ok(Self {
            mean: IntensityMean::new(geometry, grid)?,
            median: IntensityMedian::new(geometry, grid)?,
        })
    }

    pub fn mean(&self) -> &IntensityMean {
        &self.mean
    }

    pub fn median(&self) -> &IntensityMedian {
        &self.median
    }
}

impl Transformer for IntensityMeanAndMedian {
    fn name(&self) -> &'static str {
        "IntensityMeanAndMedian"
    }

    fn output_width(&self) -> usize {
        self.mean.output_width() + self.median.output_width()
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<(), FeatureError> {
        let grid = self.mean.grid();
        info!(
            transformer = self.name(),
            x_cells = grid.x_cells,
            y_cells = grid.y_cells,
            z_cells = grid.z_cells,
            "fit"
        );
        self.mean.fit(x)?;
        self.median.fit(x)
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError> {
        let means = self.mean.transform(x)?;
        let medians = self.median.transform(x)?;
        let features = concatenate(Axis(1), &[means.view(), medians.view()])
            .map_err(|e| FeatureError::Shape(e.to_string()))?;
        debug!(
            transformer = self.name(),
            samples = features.nrows(),
            features = features.ncols(),
            "transform output"
        );
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array2};

    #[test]
    fn test_blocks_match_standalone() {
        let geometry = VolumeGeometry {
            dim_x: 6,
            dim_y: 4,
            dim_z: 5,
            value_max: 200.0,
        };
        let grid = GridConfig {
            x_cells: 3,
            y_cells: 2,
            z_cells: 2,
        };
        let mut both = IntensityMeanAndMedian::new(geometry, grid).unwrap();
        let x = Array2::from_shape_fn((4, 120), |(i, j)| ((i * 31 + j * j) % 200) as f64);

        let combined = both.fit_transform(x.view()).unwrap();
        let mean = IntensityMean::new(geometry, grid).unwrap().transform(x.view()).unwrap();
        let median = IntensityMedian::new(geometry, grid).unwrap().transform(x.view()).unwrap();

        assert_eq!(combined.ncols(), mean.ncols() + median.ncols());
        assert_eq!(combined.ncols(), both.output_width());
        assert_eq!(combined.slice(s![.., ..12]), mean);
        assert_eq!(combined.slice(s![.., 12..]), median);
    }

    #[test]
    fn test_propagates_validation() {
        let both = IntensityMeanAndMedian::new(VolumeGeometry::cube(4, 1.0), GridConfig::uniform(2))
            .unwrap();
        let x = Array2::from_elem((1, 10), 0.0);
        assert!(matches!(both.transform(x.view()), Err(FeatureError::Validation(_))));
    }
}
