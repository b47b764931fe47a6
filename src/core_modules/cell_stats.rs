// THEORY:
// The median is only one way to summarize a cell. These are the other reductions
// the partitioner ships with, all with the same aggregator signature, plus the
// `Statistic` selector the pipelines use to pick one at runtime. `Statistic` is
// itself an `Aggregator`, so it can be handed straight to `split_cells`.

use crate::core_modules::cell_median::cell_median;
use crate::core_modules::cell_splitter::Aggregator;
use crate::core_modules::grid::{Grid, region_samples};
use std::fmt;

fn wide_sum<G: Grid + ?Sized>(grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i128 {
    region_samples(grid, x0, y0, width, height)
        .into_iter()
        .map(i128::from)
        .sum()
}

/// Sum of every sample in the rectangle, saturating at `i64::MIN` / `i64::MAX`.
pub fn cell_sum<G: Grid + ?Sized>(grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
    let sum = wide_sum(grid, x0, y0, width, height);
    sum.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Integer mean of the rectangle, truncated toward zero. Exact for any `i64`
/// samples.
pub fn cell_mean<G: Grid + ?Sized>(grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
    // A mean always lies between the smallest and largest sample.
    (wide_sum(grid, x0, y0, width, height) / (width * height) as i128) as i64
}

pub fn cell_min<G: Grid + ?Sized>(grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
    // region_samples never returns an empty Vec.
    region_samples(grid, x0, y0, width, height)
        .into_iter()
        .min()
        .unwrap_or_default()
}

pub fn cell_max<G: Grid + ?Sized>(grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
    region_samples(grid, x0, y0, width, height)
        .into_iter()
        .max()
        .unwrap_or_default()
}

/// The per-cell reduction a pipeline applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Statistic {
    #[default]
    Median,
    Mean,
    Sum,
    Min,
    Max,
}

impl Statistic {
    /// Applies this statistic to one cell.
    pub fn aggregate<G: Grid + ?Sized>(
        self,
        grid: &G,
        x0: usize,
        y0: usize,
        width: usize,
        height: usize,
    ) -> i64 {
        match self {
            Statistic::Median => cell_median(grid, x0, y0, width, height),
            Statistic::Mean => cell_mean(grid, x0, y0, width, height),
            Statistic::Sum => cell_sum(grid, x0, y0, width, height),
            Statistic::Min => cell_min(grid, x0, y0, width, height),
            Statistic::Max => cell_max(grid, x0, y0, width, height),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Statistic::Median => "median",
            Statistic::Mean => "mean",
            Statistic::Sum => "sum",
            Statistic::Min => "min",
            Statistic::Max => "max",
        }
    }
}

impl<G: Grid + ?Sized> Aggregator<G> for Statistic {
    fn aggregate(&self, grid: &G, x0: usize, y0: usize, width: usize, height: usize) -> i64 {
        Statistic::aggregate(*self, grid, x0, y0, width, height)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cell_splitter::split_cells;
    use crate::core_modules::grid::Matrix;

    fn sample_matrix() -> Matrix {
        Matrix::from_rows(&[&[8, 3, 5], &[9, 9, 5], &[2, 1, 6]]).unwrap()
    }

    #[test]
    fn reductions_over_a_region() {
        let m = sample_matrix();
        assert_eq!(cell_sum(&m, 0, 0, 3, 3), 48);
        assert_eq!(cell_mean(&m, 0, 0, 3, 3), 5);
        assert_eq!(cell_min(&m, 0, 0, 3, 3), 1);
        assert_eq!(cell_max(&m, 0, 0, 3, 3), 9);
        assert_eq!(cell_mean(&m, 1, 1, 2, 2), 5);
    }

    #[test]
    fn mean_truncates_toward_zero() {
        let m = Matrix::from_rows(&[&[-1, -2]]).unwrap();
        assert_eq!(cell_mean(&m, 0, 0, 2, 1), -1);
    }

    #[test]
    fn extreme_samples_do_not_overflow() {
        let m = Matrix::from_rows(&[&[i64::MAX, i64::MAX - 2], &[i64::MIN, i64::MIN + 2]]).unwrap();
        assert_eq!(cell_mean(&m, 0, 0, 2, 1), i64::MAX - 1);
        assert_eq!(cell_mean(&m, 0, 1, 2, 1), i64::MIN + 1);
        assert_eq!(cell_mean(&m, 0, 0, 2, 2), 0);

        assert_eq!(cell_sum(&m, 0, 0, 2, 1), i64::MAX);
        assert_eq!(cell_sum(&m, 0, 1, 2, 1), i64::MIN);
        assert_eq!(cell_sum(&m, 0, 0, 2, 2), -2);
    }

    #[test]
    fn statistic_dispatches_to_matching_reduction() {
        let m = sample_matrix();
        let all = [
            (Statistic::Median, 5),
            (Statistic::Mean, 5),
            (Statistic::Sum, 48),
            (Statistic::Min, 1),
            (Statistic::Max, 9),
        ];
        for (statistic, expected) in all {
            assert_eq!(statistic.aggregate(&m, 0, 0, 3, 3), expected, "{statistic}");
        }
    }

    #[test]
    fn statistic_plugs_into_the_splitter() {
        let m = Matrix::from_rows(&[&[0, 1, 2, 3], &[4, 5, 6, 7], &[8, 9, 0, 1], &[2, 3, 4, 5]]).unwrap();
        assert_eq!(split_cells(&m, 2, 2, Statistic::Max).unwrap(), vec![5, 7, 9, 5]);
        assert_eq!(split_cells(&m, 2, 2, Statistic::Sum).unwrap(), vec![10, 18, 22, 10]);
    }

    #[test]
    fn default_is_median() {
        assert_eq!(Statistic::default(), Statistic::Median);
        assert_eq!(Statistic::default().to_string(), "median");
    }
}
