use crate::core_modules::grid::{Grid, region_samples};

/// Median of every sample in the `width` x `height` rectangle at (`x0`, `y0`).
///
/// For an even number of samples this is the mean of the middle two, using
/// integer division that truncates toward zero (so `[1, 5, 6, 9]` gives 5, and
/// `[-3, -2]` gives -2). It does not round. The middle two are added in `i128`,
/// so samples anywhere in the `i64` range are fine.
///
/// Panics if the rectangle is empty or not inside `grid`.
pub fn cell_median<G: Grid + ?Sized>(grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
    let mut values = region_samples(grid, x0, y0, width, height);
    values.sort_unstable();

    let middle = values.len() / 2;
    if values.len() % 2 == 1 {
        values[middle]
    } else {
        ((i128::from(values[middle - 1]) + i128::from(values[middle])) / 2) as i64
    }
}
