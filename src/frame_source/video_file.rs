// OpenCV-backed video decoding, enabled with the `opencv` feature.
//
// OpenCV hands back decoded BGR frames and does not expose the codec's key frame
// flag, so key frames are chosen by position: every `key_frame_stride`-th decoded
// frame, starting with the first.

use crate::core_modules::luma_frame::LumaFrame;
use crate::error::FrameSourceError;
use crate::frame_source::{FrameSource, SourceFrame};
use log::debug;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

pub struct VideoFileSource {
    capture: VideoCapture,
    key_frame_stride: usize,
    frame_index: usize,
}

impl VideoFileSource {
    pub fn open(path: &Path, key_frame_stride: usize) -> Result<Self, FrameSourceError> {
        let capture = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(FrameSourceError::VideoOpen(path.to_path_buf()));
        }

        debug!(
            "opened {} ({}x{} @ {:.2} fps)",
            path.display(),
            capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?,
            capture.get(videoio::CAP_PROP_FPS)?
        );

        Ok(Self {
            capture,
            key_frame_stride: key_frame_stride.max(1),
            frame_index: 0,
        })
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameSourceError> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        let time_seconds = self.capture.get(videoio::CAP_PROP_POS_MSEC)? / 1000.0;

        let mut gray = Mat::default();
        imgproc::cvt_color(&frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
        let width = gray.cols() as usize;
        let height = gray.rows() as usize;
        let luma = LumaFrame::new(width, height, gray.data_bytes()?.to_vec())?;

        let is_key_frame = self.frame_index % self.key_frame_stride == 0;
        self.frame_index += 1;

        Ok(Some(SourceFrame {
            frame: luma,
            time_seconds,
            is_key_frame,
        }))
    }
}
