//! Per-slice keypoint extraction
//!
//! Every Z slice of a volume is scaled to an 8-bit image and handed to a 2D
//! keypoint detector. The first `per_layer` detections are kept in detector
//! order; missing slots stay zero.

use data_validator::{ValidationConfig, Validator};
use image::{GrayImage, Luma};
use imageproc::corners::corners_fast9;
use ndarray::{Array2, Array4, ArrayView2, ArrayView3};
use tracing::{debug, info, trace};

use crate::config::{KeypointConfig, VolumeGeometry};
use crate::transformer::Transformer;
use crate::volume::volumes;
use crate::FeatureError;

/// 2D keypoint detector over an 8-bit slice
pub trait KeypointDetector {
    /// Keypoint locations as `(column, row)` in detector order
    fn detect(&self, image: &GrayImage) -> Vec<(f64, f64)>;
}

/// FAST-9 corner detector
#[derive(Debug, Clone, Copy)]
pub struct FastCornerDetector {
    threshold: u8,
}

impl FastCornerDetector {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl KeypointDetector for FastCornerDetector {
    fn detect(&self, image: &GrayImage) -> Vec<(f64, f64)> {
        corners_fast9(image, self.threshold)
            .into_iter()
            .map(|corner| (f64::from(corner.x), f64::from(corner.y)))
            .collect()
    }
}

/// Keypoint coordinates for every XY plane of a volume.
///
/// The slice image has one row per X index and one column per Y index.
#[derive(Debug, Clone)]
pub struct SiftDetectorXY<D = FastCornerDetector> {
    geometry: VolumeGeometry,
    config: KeypointConfig,
    detector: D,
    validator: Validator,
}

impl SiftDetectorXY<FastCornerDetector> {
    pub fn new(geometry: VolumeGeometry, config: KeypointConfig) -> Result<Self, FeatureError> {
        let detector = FastCornerDetector::new(config.threshold);
        Self::with_detector(geometry, config, detector)
    }
}

impl<D: KeypointDetector> SiftDetectorXY<D> {
    pub fn with_detector(
        geometry: VolumeGeometry,
        config: KeypointConfig,
        detector: D,
    ) -> Result<Self, FeatureError> {
        geometry.validate()?;
        if config.per_layer == 0 {
            return Err(FeatureError::InvalidConfig(
                "keypoints per layer must be at least one".to_string(),
            ));
        }
        if u32::try_from(geometry.dim_x).is_err() || u32::try_from(geometry.dim_y).is_err() {
            return Err(FeatureError::InvalidConfig(format!(
                "slice {}x{} is too large for an image",
                geometry.dim_x, geometry.dim_y
            )));
        }
        Ok(Self {
            geometry,
            config,
            detector,
            validator: Validator::new(ValidationConfig::with_features(geometry.voxel_count())),
        })
    }

    pub fn config(&self) -> &KeypointConfig {
        &self.config
    }

    /// Keypoints as an `(N, Z, per_layer, 2)` tensor
    pub fn keypoints(&self, x: ArrayView2<'_, f64>) -> Result<Array4<f64>, FeatureError> {
        self.validator.validate_batch(x)?;
        let batch = x.as_standard_layout();
        let k = self.config.per_layer;
        let mut out = Array4::zeros((x.nrows(), self.geometry.dim_z, k, 2));

        for (i, volume) in volumes(batch.view(), &self.geometry)?.into_iter().enumerate() {
            for z in 0..self.geometry.dim_z {
                let image = self.slice_image(volume, z);
                let detected = self.detector.detect(&image);
                trace!(sample = i, slice = z, detected = detected.len(), "slice keypoints");

                for (slot, (px, py)) in detected.into_iter().take(k).enumerate() {
                    out[[i, z, slot, 0]] = px;
                    out[[i, z, slot, 1]] = py;
                }
            }
        }
        Ok(out)
    }

    /// Z slice scaled from `[0, value_max]` to `[0, 255]`
    fn slice_image(&self, volume: ArrayView3<'_, f64>, z: usize) -> GrayImage {
        let scale = 255.0 / self.geometry.value_max;
        // dimensions were checked against u32 at construction
        let width = self.geometry.dim_y as u32;
        let height = self.geometry.dim_x as u32;
        GrayImage::from_fn(width, height, |col, row| {
            let value = volume[[row as usize, col as usize, z]] * scale;
            Luma([value.clamp(0.0, 255.0) as u8])
        })
    }
}

impl<D: KeypointDetector> Transformer for SiftDetectorXY<D> {
    fn name(&self) -> &'static str {
        "SiftDetectorXY"
    }

    fn output_width(&self) -> usize {
        self.geometry.dim_z * self.config.per_layer * 2
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<(), FeatureError> {
        info!(
            transformer = self.name(),
            per_layer = self.config.per_layer,
            samples = x.nrows(),
            "fit"
        );
        self.validator.validate_batch(x)?;
        Ok(())
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError> {
        debug!(
            transformer = self.name(),
            samples = x.nrows(),
            features = x.ncols(),
            "transform input"
        );
        let tensor = self.keypoints(x)?;
        let samples = tensor.shape()[0];
        let features = tensor
            .into_shape_with_order((samples, self.output_width()))
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
