// THEORY:
// A `FrameSource` is the boundary between whatever decodes pixels and the grid
// pipeline. It yields `SourceFrame`s in presentation order; each carries a luma
// plane, its timestamp and whether the decoder considered it a key frame. The
// pipelines only ever ask for key frames, so sources that cannot tell simply mark
// every frame as one.
//
// Implementations:
// - `ImageSequenceSource`: a directory of still images, one per key frame.
// - `SingleImageSource`: one still image.
// - `VideoFileSource` (feature `opencv`): a video file decoded with OpenCV.

pub mod image_sequence;
#[cfg(feature = "opencv")]
pub mod video_file;

pub use image_sequence::ImageSequenceSource;
#[cfg(feature = "opencv")]
pub use video_file::VideoFileSource;

use crate::core_modules::luma_frame::LumaFrame;
use crate::error::FrameSourceError;
use log::trace;
use std::path::{Path, PathBuf};

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub frame: LumaFrame,
    /// Presentation time in seconds from the start of the stream.
    pub time_seconds: f64,
    pub is_key_frame: bool,
}

pub trait FrameSource {
    /// Next frame in presentation order, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError>;

    /// Next key frame, skipping everything else.
    fn next_key_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        while let Some(frame) = self.next_frame()? {
            if frame.is_key_frame {
                return Ok(Some(frame));
            }
            trace!("skipping non-key frame at {:.2}s", frame.time_seconds);
        }
        Ok(None)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        (**self).next_frame()
    }

    fn next_key_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        (**self).next_key_frame()
    }
}

/// Decodes a still image into a luma frame.
pub fn load_image(path: &Path) -> Result<LumaFrame, FrameSourceError> {
    let image = image::open(path).map_err(|source| FrameSourceError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    LumaFrame::from_image(&image)
}

/// A single still image, reported as one key frame at time zero.
#[derive(Debug)]
pub struct SingleImageSource {
    path: Option<PathBuf>,
}

impl SingleImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl FrameSource for SingleImageSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        let Some(path) = self.path.take() else {
            return Ok(None);
        };
        Ok(Some(SourceFrame {
            frame: load_image(&path)?,
            time_seconds: 0.0,
            is_key_frame: true,
        }))
    }
}

/// Frames held in memory, mostly useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: std::collections::VecDeque<SourceFrame>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = SourceFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_at(time_seconds: f64, is_key_frame: bool) -> SourceFrame {
        SourceFrame {
            frame: LumaFrame::new(1, 1, vec![0]).unwrap(),
            time_seconds,
            is_key_frame,
        }
    }

    #[test]
    fn key_frames_skip_the_rest() {
        let mut source = MemorySource::new([
            frame_at(0.0, true),
            frame_at(0.5, false),
            frame_at(1.0, false),
            frame_at(1.5, true),
        ]);
        let times: Vec<f64> = std::iter::from_fn(|| source.next_key_frame().unwrap())
            .map(|f| f.time_seconds)
            .collect();
        assert_eq!(times, vec![0.0, 1.5]);
    }

    #[test]
    fn boxed_sources_delegate() {
        let mut source: Box<dyn FrameSource> =
            Box::new(MemorySource::new([frame_at(0.0, false), frame_at(2.0, true)]));
        let frame = source.next_key_frame().unwrap().unwrap();
        assert_eq!(frame.time_seconds, 2.0);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn single_image_yields_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        image::GrayImage::from_pixel(3, 2, image::Luma([42])).save(&path).unwrap();

        let mut source = SingleImageSource::new(&path);
        let frame = source.next_key_frame().unwrap().unwrap();
        assert_eq!(frame.frame.data(), &[42; 6]);
        assert_eq!(frame.time_seconds, 0.0);
        assert!(source.next_key_frame().unwrap().is_none());
    }

    #[test]
    fn unreadable_image_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        let err = SingleImageSource::new(&path).next_frame().unwrap_err();
        assert!(err.to_string().contains("missing.png"), "{err}");
    }
}
