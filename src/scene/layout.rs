//! Row-major grid placement for the cube set.
//!
//! Cubes fill rows of at most [`MAX_CUBES_PER_ROW`], each row centered on
//! x = 0 and the block of rows centered on y = 0. Adding one cube can move
//! every later cube to a different row, so the layout is always recomputed
//! in full from the count.

use glam::Vec3;

/// Maximum number of cubes in one row.
pub const MAX_CUBES_PER_ROW: usize = 25;
/// Horizontal distance between neighbouring cube centers.
pub const CUBE_SPACING: f32 = 2.0;
/// Vertical distance between row centers.
pub const ROW_SPACING: f32 = 2.5;

/// Grid geometry for a given cube count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    cube_count: usize,
}

impl GridLayout {
    /// Layout for `cube_count` cubes (clamped to at least one).
    #[must_use]
    pub fn new(cube_count: usize) -> Self {
        Self {
            cube_count: cube_count.max(1),
        }
    }

    /// Number of cubes placed.
    #[must_use]
    pub fn cube_count(&self) -> usize {
        self.cube_count
    }

    /// `ceil(cube_count / 25)`.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.cube_count.div_ceil(MAX_CUBES_PER_ROW)
    }

    /// Cubes in row `row`; zero past the last row.
    #[must_use]
    pub fn cubes_in_row(&self, row: usize) -> usize {
        self.cube_count
            .saturating_sub(row * MAX_CUBES_PER_ROW)
            .min(MAX_CUBES_PER_ROW)
    }

    /// Width of the widest row (always the first).
    #[must_use]
    pub fn max_cubes_in_row(&self) -> usize {
        self.cube_count.min(MAX_CUBES_PER_ROW)
    }

    /// Center-to-center width of the widest row.
    #[must_use]
    pub fn total_width(&self) -> f32 {
        (self.max_cubes_in_row() - 1) as f32 * CUBE_SPACING
    }

    /// Center-to-center height of the row block.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        (self.num_rows() - 1) as f32 * ROW_SPACING
    }

    /// World position of cube `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Vec3 {
        let row = index / MAX_CUBES_PER_ROW;
        let col = index % MAX_CUBES_PER_ROW;

        let in_row = self.cubes_in_row(row).max(1);
        let start_x = -((in_row - 1) as f32 * CUBE_SPACING) / 2.0;
        let x = start_x + col as f32 * CUBE_SPACING;

        let half_rows = (self.num_rows() - 1) as f32 / 2.0;
        let y = half_rows * ROW_SPACING - row as f32 * ROW_SPACING;

        Vec3::new(x, y, 0.0)
    }

    /// Positions of every cube in index order.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.cube_count).map(|i| self.position(i))
    }
}
