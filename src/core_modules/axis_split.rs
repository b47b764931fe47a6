// THEORY:
// Splitting a grid into cells is done one axis at a time. Along an axis of
// `matrix_len` samples divided into `grid_len` cells, every cell is either
// `floor_size` or `ceil_size` long, and exactly `num_ceil` of them get the larger
// size. The larger cells are always laid out first, so the same inputs always
// produce the same spans.

use crate::core_modules::ceil_div::ceil_div;

/// Partition geometry for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSplit {
    /// Number of samples along the axis.
    pub matrix_len: usize,
    /// Number of cells along the axis.
    pub grid_len: usize,
    /// Length of the larger cells.
    pub ceil_size: usize,
    /// Length of the smaller cells.
    pub floor_size: usize,
    /// How many cells (counted from the start of the axis) get `ceil_size`.
    pub num_ceil: usize,
}

impl AxisSplit {
    /// Requires `1 <= grid_len <= matrix_len`. Callers validate first; see
    /// `cell_splitter::split_cells`.
    pub fn new(matrix_len: usize, grid_len: usize) -> Self {
        assert!(
            grid_len >= 1 && grid_len <= matrix_len,
            "AxisSplit: cannot split {matrix_len} samples into {grid_len} cells"
        );

        let ceil_size = ceil_div(matrix_len, grid_len);
        let floor_size = matrix_len / grid_len;
        let num_ceil = matrix_len - grid_len * floor_size;

        Self {
            matrix_len,
            grid_len,
            ceil_size,
            floor_size,
            num_ceil,
        }
    }

    /// Length of the cell at `index` along this axis.
    #[inline]
    pub fn cell_len(&self, index: usize) -> usize {
        if index < self.num_ceil {
            self.ceil_size
        } else {
            self.floor_size
        }
    }

    /// `(offset, len)` of every cell along the axis, in order.
    pub fn spans(self) -> impl Iterator<Item = (usize, usize)> {
        (0..self.grid_len).scan(0usize, move |offset, index| {
            let len = self.cell_len(index);
            let start = *offset;
            *offset += len;
            Some((start, len))
        })
    }
}
