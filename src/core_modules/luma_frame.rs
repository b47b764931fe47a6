// THEORY:
// A `LumaFrame` is the decoded form of one video frame as far as the partitioner
// is concerned: a single 8-bit brightness plane. Video decoders hand us the Y
// plane directly; still images and RGBA buffers are reduced to Rec. 601 luma,
// which is the same weighting a YUV encoder would have used.
//
// It is a "dumb" data container. It owns its bytes, knows its dimensions and
// implements `Grid`; it does not know about cells or statistics.

use crate::core_modules::grid::Grid;
use crate::error::FrameSourceError;
use image::{DynamicImage, GrayImage};

/// A row-major 8-bit grayscale frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl LumaFrame {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, FrameSourceError> {
        if width == 0 || height == 0 {
            return Err(FrameSourceError::EmptyFrame { width, height });
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(FrameSourceError::BufferSize {
                width,
                height,
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

    /// Builds a frame from a tightly packed RGBA buffer, keeping only luma.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self, FrameSourceError> {
        let expected = width * height * 4;
        if rgba.len() != expected {
            return Err(FrameSourceError::BufferSize {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let data = rgba
            .chunks_exact(4)
            .map(|pixel| rec601_luma(pixel[0], pixel[1], pixel[2]))
            .collect();
        Self::new(width, height, data)
    }

    pub fn from_gray_image(image: GrayImage) -> Result<Self, FrameSourceError> {
        let (width, height) = image.dimensions();
        Self::new(width as usize, height as usize, image.into_raw())
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self, FrameSourceError> {
        Self::from_gray_image(image.to_luma8())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copies the frame into an `image` buffer, e.g. for saving to disk.
    pub fn to_gray_image(&self) -> GrayImage {
        // Dimensions and length were validated on construction.
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([self.data[y as usize * self.width + x as usize]])
        })
    }
}

impl Grid for LumaFrame {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn sample(&self, x: usize, y: usize) -> i64 {
        self.data[y * self.width + x] as i64
    }
}

/// Rec. 601 luma of an sRGB pixel, rounded to the nearest byte.
fn rec601_luma(red: u8, green: u8, blue: u8) -> u8 {
    let luma = 0.299_f64 * red as f64 + 0.587_f64 * green as f64 + 0.114_f64 * blue as f64;
    luma.round().clamp(0.0, 255.0) as u8
}
