//! Feature extraction configuration

use serde::{Deserialize, Serialize};

use crate::FeatureError;

/// Fixed dimensions and intensity range shared by every volume in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeGeometry {
    /// Voxels along X (slowest varying in the flattened layout)
    pub dim_x: usize,

    /// Voxels along Y
    pub dim_y: usize,

    /// Voxels along Z (fastest varying)
    pub dim_z: usize,

    /// Upper end of the intensity range
    pub value_max: f64,
}

impl Default for VolumeGeometry {
    fn default() -> Self {
        Self {
            dim_x: 176,
            dim_y: 208,
            dim_z: 176,
            value_max: 4000.0,
        }
    }
}

impl VolumeGeometry {
    /// Cube of side `dim`
    pub fn cube(dim: usize, value_max: f64) -> Self {
        Self {
            dim_x: dim,
            dim_y: dim,
            dim_z: dim,
            value_max,
        }
    }

    /// Shape as an (X, Y, Z) tuple
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.dim_x, self.dim_y, self.dim_z)
    }

    /// Length of one flattened sample
    pub fn voxel_count(&self) -> usize {
        self.dim_x * self.dim_y * self.dim_z
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.dim_x == 0 || self.dim_y == 0 || self.dim_z == 0 {
            return Err(FeatureError::InvalidConfig(format!(
                "volume dimensions must be non-zero, got {}x{}x{}",
                self.dim_x, self.dim_y, self.dim_z
            )));
        }
        if !(self.value_max.is_finite() && self.value_max > 0.0) {
            return Err(FeatureError::InvalidConfig(format!(
                "value_max must be positive, got {}",
                self.value_max
            )));
        }
        Ok(())
    }
}

/// Number of cells along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub x_cells: usize,
    pub y_cells: usize,
    pub z_cells: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_cells: 8,
            y_cells: 8,
            z_cells: 8,
        }
    }
}

impl GridConfig {
    /// Same cell count on every axis
    pub fn uniform(cells: usize) -> Self {
        Self {
            x_cells: cells,
            y_cells: cells,
            z_cells: cells,
        }
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.x_cells * self.y_cells * self.z_cells
    }

    /// Every axis needs at least one cell and no more cells than voxels
    pub fn validate(&self, geometry: &VolumeGeometry) -> Result<(), FeatureError> {
        let axes = [
            ("x", self.x_cells, geometry.dim_x),
            ("y", self.y_cells, geometry.dim_y),
            ("z", self.z_cells, geometry.dim_z),
        ];
        for (axis, cells, dim) in axes {
            if cells == 0 || cells > dim {
                return Err(FeatureError::InvalidConfig(format!(
                    "{axis} cell count {cells} must be in 1..={dim}"
                )));
            }
        }
        Ok(())
    }
}

/// Intensity histogram settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Equal-width bins spanning [0, value_max]
    pub bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { bins: 45 }
    }
}

/// Gradient settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    /// Reserved for a gradient histogram; the mean gradient ignores it
    pub bins: usize,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self { bins: 8 }
    }
}

/// Slice keypoint settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointConfig {
    /// Keypoints kept per Z slice
    pub per_layer: usize,

    /// FAST corner intensity threshold on the 8-bit slice
    pub threshold: u8,
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self {
            per_layer: 50,
            threshold: 20,
        }
    }
}
