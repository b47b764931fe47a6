//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;

/// Invalid arguments handed to the partitioner or to `Matrix` constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {grid_width}x{grid_height}")]
    ZeroGridDimension {
        grid_width: usize,
        grid_height: usize,
    },

    #[error(
        "Invalid dimensions. Given dimensions {grid_width}x{grid_height} are bigger than frame dimensions {frame_width}x{frame_height}"
    )]
    GridLargerThanFrame {
        grid_width: usize,
        grid_height: usize,
        frame_width: usize,
        frame_height: usize,
    },

    #[error("matrix data holds {actual} samples, expected {expected}")]
    MatrixShape { expected: usize, actual: usize },

    #[error("matrix row {row} has {actual} samples, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Failure to parse a `WIDTHxHEIGHT` argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimensionsError {
    #[error("Invalid dimensions '{0}': expected WIDTHxHEIGHT, e.g. 3x3")]
    Malformed(String),

    #[error("Invalid dimensions '{0}': width and height must be positive")]
    Zero(String),
}

/// Errors raised while producing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameSourceError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("frame dimensions must be positive, got {width}x{height}")]
    EmptyFrame { width: usize, height: usize },

    #[error("frame buffer holds {actual} bytes, expected {expected} for a {width}x{height} frame")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSizeChanged {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("no decodable images found in {}", .0.display())]
    EmptySequence(PathBuf),

    #[error("frames per second must be positive and finite, got {0}")]
    InvalidFrameRate(f64),

    #[error("failed to open video file {}", .0.display())]
    VideoOpen(PathBuf),

    #[cfg(feature = "opencv")]
    #[error("video backend error: {0}")]
    Video(#[from] opencv::Error),
}

/// Errors raised while running a pipeline end to end.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Source(#[from] FrameSourceError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to dump frame to {}: {source}", .path.display())]
    Dump {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("worker pool stopped before returning a result")]
    WorkerPoolClosed,
}
