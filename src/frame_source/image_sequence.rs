use crate::core_modules::grid::Grid;
use crate::error::FrameSourceError;
use crate::frame_source::{FrameSource, SourceFrame, load_image};
use image::ImageFormat;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// A directory of still images treated as consecutive key frames.
///
/// Files are ordered by name and timestamped as `index / fps`. Files whose
/// extension is not a known image format are ignored. Every frame must have the
/// same dimensions as the first one.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    fps: f64,
    next_index: usize,
    dimensions: Option<(usize, usize)>,
}

impl ImageSequenceSource {
    pub fn open(directory: &Path, fps: f64) -> Result<Self, FrameSourceError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(FrameSourceError::InvalidFrameRate(fps));
        }

        let io_error = |source| FrameSourceError::Io {
            path: directory.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(directory).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if !path.is_file() {
                continue;
            }
            if ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            } else {
                warn!("ignoring {}: not a recognized image file", path.display());
            }
        }

        if paths.is_empty() {
            return Err(FrameSourceError::EmptySequence(directory.to_path_buf()));
        }
        paths.sort();
        debug!("found {} frames in {}", paths.len(), directory.display());

        Ok(Self {
            paths,
            fps,
            next_index: 0,
            dimensions: None,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        let index = self.next_index;
        let Some(path) = self.paths.get(index) else {
            return Ok(None);
        };

        let frame = load_image(path)?;
        let size = (frame.width(), frame.height());
        match self.dimensions {
            None => self.dimensions = Some(size),
            Some((expected_width, expected_height)) if size != (expected_width, expected_height) => {
                return Err(FrameSourceError::FrameSizeChanged {
                    index,
                    width: size.0,
                    height: size.1,
                    expected_width,
                    expected_height,
                });
            }
            Some(_) => {}
        }

        self.next_index += 1;
        Ok(Some(SourceFrame {
            frame,
            time_seconds: index as f64 / self.fps,
            is_key_frame: true,
        }))
    }
}
