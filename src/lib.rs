// THEORY:
// This file is the main entry point for the `gridmedian` library crate. It exposes
// the balanced grid partitioner and its aggregators (`core_modules`), the frame
// sources that feed it, the CSV record writer that consumes it, and the two
// pipelines (sequential and worker-pool) that tie them together for the binary.
//
// The partitioner itself knows nothing about video. Anything that can report a
// width, a height and an integer sample at (x, y) is a `Grid`, and anything that
// reduces a rectangle of a grid to one integer is an aggregator.

pub mod core_modules;
pub mod dimensions;
pub mod error;
pub mod frame_source;
pub mod output;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::cell_median::cell_median;
pub use core_modules::cell_splitter::{Aggregator, CellRect, cell_rects, split_cells};
pub use core_modules::cell_stats::Statistic;
pub use core_modules::ceil_div::ceil_div;
pub use core_modules::grid::{Grid, Matrix};
pub use core_modules::luma_frame::LumaFrame;
pub use dimensions::GridDimensions;
pub use error::{DimensionsError, FrameSourceError, GridError, PipelineError};
