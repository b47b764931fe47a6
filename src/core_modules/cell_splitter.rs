// THEORY:
// The cell splitter is the heart of the crate. It divides a `Grid` into a
// `grid_width` x `grid_height` arrangement of axis-aligned cells and reduces each
// cell to a single integer with a caller-supplied aggregator.
//
// Key architectural principles:
// 1.  **Balanced Tiling**: Each axis is split independently (`AxisSplit`). Cell
//     sizes along an axis differ by at most one sample and the cells tile the grid
//     exactly: no gaps, no overlaps.
// 2.  **Deterministic Layout**: Larger cells always come first along each axis, so
//     identical inputs always produce identical cells and identical results.
// 3.  **Reduction Agnostic**: The aggregator is anything implementing
//     `Aggregator`. Every `Fn(&G, x0, y0, width, height) -> i64` does, so
//     `cell_median`, sums, means and custom closures plug in the same way.
// 4.  **Validate Once**: Grid dimensions are checked before the first aggregator
//     call. Once they pass, every cell is non-empty and in bounds, so aggregators
//     never see an invalid rectangle.
//
// Results come back row-major: cell (0, 0) first, then left to right, top to bottom.

use crate::core_modules::axis_split::AxisSplit;
use crate::core_modules::grid::Grid;
use crate::error::GridError;

/// One cell of a partition and the source rectangle it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    /// Column of the cell in the cell grid.
    pub grid_x: usize,
    /// Row of the cell in the cell grid.
    pub grid_y: usize,
    /// Left edge in source samples.
    pub x0: usize,
    /// Top edge in source samples.
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

/// A reduction of one rectangular region of a `G` to a single value.
///
/// Implemented for every `Fn(&G, x0, y0, width, height) -> i64`, which covers
/// plain function items like `cell_median` as well as closures.
pub trait Aggregator<G: Grid + ?Sized> {
    /// Reduces the `width` x `height` rectangle at (`x0`, `y0`). Only called with
    /// non-empty rectangles inside `grid`.
    fn aggregate(&self, grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64;
}

impl<G, F> Aggregator<G> for F
where
    G: Grid + ?Sized,
    F: Fn(&G, usize, usize, usize, usize) -> i64,
{
    fn aggregate(&self, grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
        self(grid, x0, y0, width, height)
    }
}

fn validated_splits(
    matrix_width: usize,
    matrix_height: usize,
    grid_width: usize,
    grid_height: usize,
) -> Result<(AxisSplit, AxisSplit), GridError> {
    if grid_width == 0 || grid_height == 0 {
        return Err(GridError::ZeroGridDimension {
            grid_width,
            grid_height,
        });
    }
    if grid_width > matrix_width || grid_height > matrix_height {
        return Err(GridError::GridLargerThanFrame {
            grid_width,
            grid_height,
            frame_width: matrix_width,
            frame_height: matrix_height,
        });
    }
    Ok((
        AxisSplit::new(matrix_width, grid_width),
        AxisSplit::new(matrix_height, grid_height),
    ))
}

/// Splits `grid` into `grid_width` x `grid_height` cells and runs `aggregator` on
/// each one, returning the results in row-major order.
///
/// # Errors
///
/// Returns `GridError::ZeroGridDimension` if either cell count is zero and
/// `GridError::GridLargerThanFrame` if the cell grid has more columns or rows
/// than `grid` has samples. The aggregator is not called in either case.
pub fn split_cells<G, A>(
    grid: &G,
    grid_width: usize,
    grid_height: usize,
    aggregator: A,
) -> Result<Vec<i64>, GridError>
where
    G: Grid + ?Sized,
    A: Aggregator<G>,
{
    let (split_x, split_y) = validated_splits(grid.width(), grid.height(), grid_width, grid_height)?;

    let mut values = Vec::with_capacity(grid_width * grid_height);

    let mut matrix_y = 0;
    for grid_y in 0..grid_height {
        let cell_height = split_y.cell_len(grid_y);

        let mut matrix_x = 0;
        for grid_x in 0..grid_width {
            let cell_width = split_x.cell_len(grid_x);

            values.push(aggregator.aggregate(grid, matrix_x, matrix_y, cell_width, cell_height));
            matrix_x += cell_width;
        }
        matrix_y += cell_height;
    }

    Ok(values)
}

/// The cells `split_cells` would visit for a `width` x `height` source, in the
/// same row-major order.
pub fn cell_rects(
    width: usize,
    height: usize,
    grid_width: usize,
    grid_height: usize,
) -> Result<Vec<CellRect>, GridError> {
    let (split_x, split_y) = validated_splits(width, height, grid_width, grid_height)?;

    let mut rects = Vec::with_capacity(grid_width * grid_height);
    for (grid_y, (y0, cell_height)) in split_y.spans().enumerate() {
        for (grid_x, (x0, cell_width)) in split_x.spans().enumerate() {
            rects.push(CellRect {
                grid_x,
                grid_y,
                x0,
                y0,
                width: cell_width,
                height: cell_height,
            });
        }
    }
    Ok(rects)
}
