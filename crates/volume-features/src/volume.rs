//! Flattened sample to 3D volume reinterpretation

use data_validator::ValidationError;
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::config::VolumeGeometry;
use crate::FeatureError;

/// A single volume indexed as `[x, y, z]`
pub type VolumeView<'a> = ArrayView3<'a, f64>;

/// View every row of `batch` as an (X, Y, Z) volume.
///
/// Rows are read in row-major order, so the flat index of voxel `(x, y, z)` is
/// `(x * Y + y) * Z + z`. `batch` must be in standard layout.
pub fn volumes<'a>(
    batch: ArrayView2<'a, f64>,
    geometry: &VolumeGeometry,
) -> Result<Vec<VolumeView<'a>>, FeatureError> {
    let expected = geometry.voxel_count();
    if batch.ncols() != expected {
        return Err(ValidationError::FeatureMismatch {
            expected,
            actual: batch.ncols(),
        }
        .into());
    }

    (0..batch.nrows())
        .map(|i| {
            batch
                .index_axis_move(Axis(0), i)
                .into_shape_with_order(geometry.shape())
                .map_err(|e| FeatureError::Shape(format!("sample {i}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_row_major_layout() {
        let geometry = VolumeGeometry {
            dim_x: 2,
            dim_y: 3,
            dim_z: 4,
            value_max: 100.0,
        };
        let batch = Array2::from_shape_fn((2, 24), |(i, j)| (i * 100 + j) as f64);
        let vols = volumes(batch.view(), &geometry).unwrap();
        assert_eq!(vols.len(), 2);
        assert_eq!(vols[0].dim(), (2, 3, 4));
        assert_eq!(vols[0][[1, 2, 3]], 23.0);
        assert_eq!(vols[1][[0, 1, 2]], 106.0);
    }

    #[test]
    fn test_length_mismatch() {
        let geometry = VolumeGeometry::cube(2, 1.0);
        let batch = Array2::<f64>::zeros((1, 7));
        assert!(matches!(
            volumes(batch.view(), &geometry),
            Err(FeatureError::Validation(ValidationError::FeatureMismatch {
                expected: 8,
                actual: 7
            }))
        ));
    }
}
