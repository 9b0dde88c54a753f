//! Grid partitioning of a volume into axis-aligned cells

use std::ops::Range;

use ndarray::{s, ArrayView3};

use crate::config::{GridConfig, VolumeGeometry};

/// Split `[0, dim]` into `cells` intervals.
///
/// Returns `cells + 1` edges at `round(i * dim / cells)`. When `cells` does not
/// divide `dim` the intervals differ in length by one voxel.
pub fn cell_edges(dim: usize, cells: usize) -> Vec<usize> {
    if cells == 0 {
        return vec![0];
    }
    // round half up, in integers
    (0..=cells)
        .map(|i| (2 * i * dim + cells) / (2 * cells))
        .collect()
}

/// One sub-block of the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// (xi, yi, zi) position in the grid
    pub index: (usize, usize, usize),
    pub x: Range<usize>,
    pub y: Range<usize>,
    pub z: Range<usize>,
}

impl Cell {
    /// Number of voxels covered
    pub fn voxel_count(&self) -> usize {
        self.x.len() * self.y.len() * self.z.len()
    }

    /// View of the voxels inside this cell
    pub fn block<'a>(&self, volume: ArrayView3<'a, f64>) -> ArrayView3<'a, f64> {
        volume.slice_move(s![
            self.x.start..self.x.end,
            self.y.start..self.y.end,
            self.z.start..self.z.end
        ])
    }
}

/// Cell edges along the three axes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSpec {
    pub x_edges: Vec<usize>,
    pub y_edges: Vec<usize>,
    pub z_edges: Vec<usize>,
}

impl GridSpec {
    pub fn new(grid: &GridConfig, geometry: &VolumeGeometry) -> Self {
        Self {
            x_edges: cell_edges(geometry.dim_x, grid.x_cells),
            y_edges: cell_edges(geometry.dim_y, grid.y_cells),
            z_edges: cell_edges(geometry.dim_z, grid.z_cells),
        }
    }

    /// Cell counts as (nx, ny, nz)
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.x_edges.len() - 1,
            self.y_edges.len() - 1,
            self.z_edges.len() - 1,
        )
    }

    pub fn cell_count(&self) -> usize {
        let (nx, ny, nz) = self.shape();
        nx * ny * nz
    }

    /// Cells with X outermost and Z innermost, matching the row-major
    /// flattening of an (nx, ny, nz) tensor.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (nx, ny, nz) = self.shape();
        (0..nx).flat_map(move |xi| {
            (0..ny).flat_map(move |yi| {
                (0..nz).map(move |zi| Cell {
                    index: (xi, yi, zi),
                    x: self.x_edges[xi]..self.x_edges[xi + 1],
                    y: self.y_edges[yi]..self.y_edges[yi + 1],
                    z: self.z_edges[zi]..self.z_edges[zi + 1],
                })
            })
        })
    }
}
