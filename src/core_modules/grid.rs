// THEORY:
// `Grid` is the one capability the partitioner and its aggregators need from a
// data source: fixed dimensions and read-only integer samples addressed by
// (x, y). Decoded video frames, `image` gray buffers and plain in-memory
// matrices all implement it, so the partitioning code never depends on a
// concrete pixel representation.
//
// Samples are widened to `i64` so that sums over large regions and negative
// test data are representable without the caller choosing a type.

use crate::error::GridError;
use image::GrayImage;

/// A read-only 2D buffer of integer samples.
pub trait Grid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Sample at column `x`, row `y`. Only valid for `x < width()`, `y < height()`.
    fn sample(&self, x: usize, y: usize) -> i64;
}

impl<G: Grid + ?Sized> Grid for &G {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }

    fn sample(&self, x: usize, y: usize) -> i64 {
        (**self).sample(x, y)
    }
}

impl Grid for GrayImage {
    fn width(&self) -> usize {
        self.dimensions().0 as usize
    }

    fn height(&self) -> usize {
        self.dimensions().1 as usize
    }

    fn sample(&self, x: usize, y: usize) -> i64 {
        self.get_pixel(x as u32, y as u32).0[0] as i64
    }
}

/// Collects every sample of the `width` x `height` rectangle at (`x0`, `y0`),
/// row by row.
///
/// Panics if the rectangle is empty or leaves the grid; aggregators are only
/// ever handed rectangles produced by the partitioner.
pub fn region_samples<G: Grid + ?Sized>(
    grid: &G,
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
) -> Vec<i64> {
    assert!(width > 0 && height > 0, "region must not be empty");
    assert!(
        x0 + width <= grid.width() && y0 + height <= grid.height(),
        "region ({x0}, {y0}) {width}x{height} exceeds {}x{} grid",
        grid.width(),
        grid.height()
    );

    let mut values = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            values.push(grid.sample(x0 + x, y0 + y));
        }
    }
    values
}

/// A simple row-major matrix of `i64` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    width: usize,
    height: usize,
    data: Vec<i64>,
}

impl Matrix {
    pub fn new(width: usize, height: usize, data: Vec<i64>) -> Result<Self, GridError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(GridError::MatrixShape {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a matrix from rows of equal length.
    pub fn from_rows(rows: &[&[i64]]) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(width * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: row_index,
                    expected: width,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(width, rows.len(), data)
    }

    pub fn data(&self) -> &[i64] {
        &self.data
    }
}

impl Grid for Matrix {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn sample(&self, x: usize, y: usize) -> i64 {
        self.data[y * self.width + x]
    }
}
