// THEORY:
// The `pipeline` module is the top-level API for turning a stream of frames into
// CSV records. It encapsulates the whole flow (pull key frames, optionally dump
// them, split each one into cells, reduce each cell, write one line) behind a
// single `run` call, so the binary only has to choose a source and a sink.
//
// This is the sequential pipeline. `parallel_pipeline` produces byte-identical
// output using a worker pool.

use crate::core_modules::cell_splitter::split_cells;
use crate::core_modules::cell_stats::Statistic;
use crate::core_modules::grid::Grid;
use crate::core_modules::luma_frame::LumaFrame;
use crate::core_modules::utils::image_helper::FrameDumper;
use crate::dimensions::GridDimensions;
use crate::error::{GridError, PipelineError};
use crate::frame_source::FrameSource;
use crate::output::CsvRecordWriter;
use log::{debug, info};
use std::io::Write;

/// Configuration shared by both pipelines.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of cell columns.
    pub grid_width: usize,
    /// Number of cell rows.
    pub grid_height: usize,
    /// Reduction applied to every cell.
    pub statistic: Statistic,
    /// Worker tasks used by `ParallelPipeline`. Ignored by `GridPipeline`.
    pub workers: usize,
}

impl PipelineConfig {
    /// Median statistic, one worker per CPU.
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            grid_width: dimensions.width,
            grid_height: dimensions.height,
            statistic: Statistic::Median,
            workers: num_cpus::get(),
        }
    }

    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames_written: usize,
    pub last_time_seconds: Option<f64>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, time_seconds: f64) {
        self.frames_written += 1;
        self.last_time_seconds = Some(time_seconds);
    }
}

/// Splits one frame according to `config`.
pub(crate) fn compute_cells(config: &PipelineConfig, frame: &LumaFrame) -> Result<Vec<i64>, GridError> {
    split_cells(frame, config.grid_width, config.grid_height, config.statistic)
}

/// Processes frames one at a time on the calling thread.
pub struct GridPipeline {
    config: PipelineConfig,
}

impl GridPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Cell values for one frame, row-major.
    pub fn process_frame(&self, frame: &LumaFrame) -> Result<Vec<i64>, GridError> {
        compute_cells(&self.config, frame)
    }

    /// Writes one record per key frame of `source` until it is exhausted.
    ///
    /// Frames are numbered from 1 for `dumper`. Stops at the first error; records
    /// already written stay in `writer`.
    pub fn run<S, W>(
        &self,
        source: &mut S,
        writer: &mut CsvRecordWriter<W>,
        dumper: Option<&FrameDumper>,
    ) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource + ?Sized,
        W: Write,
    {
        let mut summary = RunSummary::default();

        while let Some(key_frame) = source.next_key_frame()? {
            let frame_index = summary.frames_written + 1;
            if let Some(dumper) = dumper {
                dumper.dump(frame_index, key_frame.time_seconds, &key_frame.frame)?;
            }

            let values = self.process_frame(&key_frame.frame)?;
            writer.write_record(key_frame.time_seconds, &values)?;
            summary.record(key_frame.time_seconds);

            debug!(
                "key frame {frame_index} at {:.2}s ({}x{}): {} cells",
                key_frame.time_seconds,
                key_frame.frame.width(),
                key_frame.frame.height(),
                values.len()
            );
        }

        info!(
            "wrote {} records ({} of {}x{} cells)",
            summary.frames_written, self.config.statistic, self.config.grid_width, self.config.grid_height
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_source::{MemorySource, SourceFrame};

    fn gradient_frame(width: usize, height: usize, offset: u8) -> LumaFrame {
        let data = (0..width * height)
            .map(|i| (i as u8).wrapping_add(offset))
            .collect();
        LumaFrame::new(width, height, data).unwrap()
    }

    fn key_frame(time_seconds: f64, frame: LumaFrame) -> SourceFrame {
        SourceFrame {
            frame,
            time_seconds,
            is_key_frame: true,
        }
    }

    #[test]
    fn process_frame_uses_configured_statistic() {
        let frame = LumaFrame::new(4, 2, vec![0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        let dims = GridDimensions::new(2, 1);

        let median = GridPipeline::new(PipelineConfig::new(dims));
        assert_eq!(median.process_frame(&frame).unwrap(), vec![2, 4]);

        let sum = GridPipeline::new(PipelineConfig::new(dims).with_statistic(Statistic::Sum));
        assert_eq!(sum.process_frame(&frame).unwrap(), vec![10, 18]);
    }

    #[test]
    fn run_writes_one_record_per_key_frame() {
        let mut source = MemorySource::new([
            key_frame(0.0, gradient_frame(2, 2, 0)),
            SourceFrame {
                frame: gradient_frame(2, 2, 100),
                time_seconds: 0.04,
                is_key_frame: false,
            },
            key_frame(2.5, gradient_frame(2, 2, 10)),
        ]);
        let pipeline = GridPipeline::new(PipelineConfig::new(GridDimensions::new(2, 2)));
        let mut writer = CsvRecordWriter::new(Vec::new());

        let summary = pipeline.run(&mut source, &mut writer, None).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                frames_written: 2,
                last_time_seconds: Some(2.5)
            }
        );

        let csv = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(csv, "0.00,0,1,2,3\n2.50,10,11,12,13\n");
    }

    #[test]
    fn oversized_grid_stops_the_run() {
        let mut source = MemorySource::new([key_frame(0.0, gradient_frame(3, 3, 0))]);
        let pipeline = GridPipeline::new(PipelineConfig::new(GridDimensions::new(4, 1)));
        let mut writer = CsvRecordWriter::new(Vec::new());

        let err = pipeline.run(&mut source, &mut writer, None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Grid(GridError::GridLargerThanFrame { frame_width: 3, .. })
        ));
        assert_eq!(writer.records_written(), 0);
    }

    #[test]
    fn run_dumps_key_frames_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = FrameDumper::new(dir.path()).unwrap();
        let mut source = MemorySource::new([
            key_frame(0.0, gradient_frame(2, 2, 0)),
            key_frame(1.0, gradient_frame(2, 2, 0)),
        ]);
        let pipeline = GridPipeline::new(PipelineConfig::new(GridDimensions::new(1, 1)));
        let mut writer = CsvRecordWriter::new(std::io::sink());

        pipeline.run(&mut source, &mut writer, Some(&dumper)).unwrap();
        assert!(dir.path().join("frame_1_at0.00.png").exists());
        assert!(dir.path().join("frame_2_at1.00.png").exists());
    }

    #[test]
    fn workers_never_drop_below_one() {
        let config = PipelineConfig::new(GridDimensions::new(1, 1)).with_workers(0);
        assert_eq!(config.workers, 1);
    }
}
