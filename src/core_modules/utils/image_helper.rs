// Debug dumps of key frames as grayscale PNGs.

use crate::core_modules::grid::Grid;
use crate::core_modules::luma_frame::LumaFrame;
use crate::error::PipelineError;
use image::ImageEncoder;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub fn save(path: &Path, frame: &LumaFrame) -> Result<(), image::error::ImageError> {
    let output = BufWriter::new(std::fs::File::create(path)?);
    let encoder = image::codecs::png::PngEncoder::new(output);

    encoder.write_image(
        frame.data(),
        frame.width() as u32,
        frame.height() as u32,
        image::ExtendedColorType::L8,
    )?;

    Ok(())
}

/// Writes every frame it is handed into one directory.
#[derive(Debug, Clone)]
pub struct FrameDumper {
    directory: PathBuf,
}

impl FrameDumper {
    /// Creates `directory` (and parents) if needed.
    pub fn new(directory: impl Into<PathBuf>) -> std::io::Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn path_for(&self, frame_index: usize, time_seconds: f64) -> PathBuf {
        self.directory
            .join(format!("frame_{frame_index}_at{time_seconds:.2}.png"))
    }

    /// Saves `frame` as `frame_{index}_at{time}.png` and returns the path.
    pub fn dump(
        &self,
        frame_index: usize,
        time_seconds: f64,
        frame: &LumaFrame,
    ) -> Result<PathBuf, PipelineError> {
        let path = self.path_for(frame_index, time_seconds);
        save(&path, frame).map_err(|source| PipelineError::Dump {
            path: path.clone(),
            source,
        })?;
        log::trace!("dumped frame {frame_index} to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_gradient_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let width = 50usize;
        let height = 20usize;
        let buffer: Vec<u8> = (0..width * height).map(|i| (i % 255) as u8).collect();
        let frame = LumaFrame::new(width, height, buffer).unwrap();
        let path = dir.path().join("gradient_file.png");

        save(&path, &frame).expect("Error Saving File.");

        let reloaded = image::open(&path).expect("Error Loading File.").to_luma8();
        assert_eq!(reloaded.dimensions(), (50, 20));
        assert_eq!(reloaded.into_raw(), frame.data());
    }

    #[test]
    fn dumper_names_files_by_index_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = FrameDumper::new(dir.path().join("frames")).unwrap();
        let frame = LumaFrame::new(2, 2, vec![255; 4]).unwrap();

        let path = dumper.dump(3, 1.5, &frame).unwrap();
        assert_eq!(path.file_name().unwrap(), "frame_3_at1.50.png");
        assert!(path.exists());
    }
}
