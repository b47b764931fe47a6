// THEORY:
// Cells of one frame are cheap; frames are the natural unit of parallel work.
// The `ParallelPipeline` keeps the decoder on the calling task and fans key frames
// out to a pool of workers, then writes results strictly in the order the frames
// were read, so its CSV is byte-identical to the sequential pipeline's.
//
// Key architectural principles:
// 1.  **Round-Robin Dispatch**: A dispatcher task forwards each submitted frame to
//     the next worker's channel in turn.
// 2.  **Blocking Work Off the Runtime**: Each worker awaits its partitioning job on
//     the blocking thread pool, so async tasks never stall on CPU-bound work.
// 3.  **Ordered Reassembly**: Every submission returns a oneshot receiver; the
//     receivers are queued in a `FuturesOrdered`, which yields results in
//     submission order no matter which worker finishes first.
// 4.  **Bounded In-Flight Frames**: At most `2 * workers` frames are decoded but
//     not yet written, which caps memory on long videos.
// 5.  **Decoding Yields the Thread**: Frame decoding and dumps run under
//     `block_in_place` on a multi-thread runtime, so the dispatcher and
//     workers keep running while the calling task is busy decoding.

use crate::core_modules::utils::image_helper::FrameDumper;
use crate::error::{GridError, PipelineError};
use crate::frame_source::{FrameSource, SourceFrame};
use crate::output::{CsvRecordWriter, FrameRecord};
use crate::pipeline::{PipelineConfig, RunSummary, compute_cells};
use futures::stream::{FuturesOrdered, StreamExt};
use log::{debug, info, warn};
use std::io::Write;
use tokio::runtime::RuntimeFlavor;
use tokio::sync::{mpsc, oneshot};

type FrameResult = Result<FrameRecord, GridError>;

pub struct FrameTask {
    pub frame: SourceFrame,
    pub result_sender: oneshot::Sender<FrameResult>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `config.workers` workers plus a dispatcher. Must be called from
    /// within a tokio runtime.
    pub fn new(config: PipelineConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        // Spawn dispatcher
        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!("worker {worker_idx} stopped; dispatcher shutting down");
                    break;
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        // Spawn workers
        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker_config = config.clone();

            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let FrameTask { frame, result_sender } = task;
                    let job_config = worker_config.clone();

                    let joined = tokio::task::spawn_blocking(move || {
                        compute_cells(&job_config, &frame.frame).map(|values| FrameRecord {
                            time_seconds: frame.time_seconds,
                            values,
                        })
                    })
                    .await;

                    match joined {
                        Ok(result) => {
                            // The receiver is gone only if the run was abandoned.
                            let _ = result_sender.send(result);
                        }
                        Err(err) => {
                            warn!("worker {worker_id}: frame job failed: {err}");
                        }
                    }
                }
            }));
        }

        Self {
            task_sender,
            workers,
        }
    }

    /// Queues one frame; the receiver resolves with its record.
    pub fn submit(&self, frame: SourceFrame) -> Result<oneshot::Receiver<FrameResult>, PipelineError> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(FrameTask { frame, result_sender })
            .map_err(|_| PipelineError::WorkerPoolClosed)?;
        Ok(result_receiver)
    }

    /// Closes the task channel and waits for every worker to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Runs blocking decoder or file work from async code. On a multi-thread
/// runtime the current worker thread hands its other tasks off first; a
/// current-thread runtime has nowhere to hand them, so `f` just runs inline.
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => f(),
    }
}

pub struct ParallelPipeline {
    config: PipelineConfig,
    worker_pool: WorkerPool,
}

impl ParallelPipeline {
    /// Must be called from within a tokio runtime.
    pub fn new(config: PipelineConfig) -> Self {
        let worker_pool = WorkerPool::new(config.clone());
        Self { config, worker_pool }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Same contract as `GridPipeline::run`: one record per key frame, in order,
    /// stopping at the first error. The worker pool is drained before returning,
    /// on success and on error alike.
    pub async fn run<S, W>(
        self,
        source: &mut S,
        writer: &mut CsvRecordWriter<W>,
        dumper: Option<&FrameDumper>,
    ) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource + ?Sized,
        W: Write,
    {
        let outcome = self.drive(source, writer, dumper).await;
        self.worker_pool.shutdown().await;
        let summary = outcome?;

        info!(
            "wrote {} records ({} of {}x{} cells, {} workers)",
            summary.frames_written,
            self.config.statistic,
            self.config.grid_width,
            self.config.grid_height,
            self.config.workers
        );
        Ok(summary)
    }

    async fn drive<S, W>(
        &self,
        source: &mut S,
        writer: &mut CsvRecordWriter<W>,
        dumper: Option<&FrameDumper>,
    ) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource + ?Sized,
        W: Write,
    {
        let max_in_flight = self.config.workers.max(1) * 2;
        let mut pending = FuturesOrdered::new();
        let mut summary = RunSummary::default();
        let mut frames_read = 0usize;

        while let Some(key_frame) = off_runtime(|| source.next_key_frame())? {
            frames_read += 1;
            if let Some(dumper) = dumper {
                off_runtime(|| dumper.dump(frames_read, key_frame.time_seconds, &key_frame.frame))?;
            }
            debug!("submitting key frame {frames_read} at {:.2}s", key_frame.time_seconds);
            pending.push_back(self.worker_pool.submit(key_frame)?);

            while pending.len() >= max_in_flight {
                if let Some(received) = pending.next().await {
                    Self::write_result(received, writer, &mut summary)?;
                }
            }
        }

        while let Some(received) = pending.next().await {
            Self::write_result(received, writer, &mut summary)?;
        }
        Ok(summary)
    }

    fn write_result<W: Write>(
        received: Result<FrameResult, oneshot::error::RecvError>,
        writer: &mut CsvRecordWriter<W>,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let record = received.map_err(|_| PipelineError::WorkerPoolClosed)??;
        writer.write_frame_record(&record)?;
        summary.record(record.time_seconds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cell_stats::Statistic;
    use crate::core_modules::luma_frame::LumaFrame;
    use crate::dimensions::GridDimensions;
    use crate::frame_source::MemorySource;
    use crate::pipeline::GridPipeline;

    fn frames(count: usize) -> Vec<SourceFrame> {
        (0..count)
            .map(|i| {
                let data = (0..12 * 9).map(|p| ((p * 7 + i * 13) % 256) as u8).collect();
                SourceFrame {
                    frame: LumaFrame::new(12, 9, data).unwrap(),
                    time_seconds: i as f64 * 0.5,
                    is_key_frame: i % 3 != 2,
                }
            })
            .collect()
    }

    fn config(workers: usize) -> PipelineConfig {
        PipelineConfig::new(GridDimensions::new(5, 4))
            .with_statistic(Statistic::Median)
            .with_workers(workers)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn matches_sequential_output() {
        let mut expected = CsvRecordWriter::new(Vec::new());
        GridPipeline::new(config(1))
            .run(&mut MemorySource::new(frames(25)), &mut expected, None)
            .unwrap();

        let mut actual = CsvRecordWriter::new(Vec::new());
        let summary = ParallelPipeline::new(config(4))
            .run(&mut MemorySource::new(frames(25)), &mut actual, None)
            .await
            .unwrap();

        assert_eq!(summary.frames_written, 17);
        assert_eq!(summary.last_time_seconds, Some(12.0));
        assert_eq!(actual.finish().unwrap(), expected.finish().unwrap());
    }

    #[tokio::test]
    async fn works_on_a_current_thread_runtime() {
        let mut writer = CsvRecordWriter::new(Vec::new());
        let summary = ParallelPipeline::new(config(2))
            .run(&mut MemorySource::new(frames(4)), &mut writer, None)
            .await
            .unwrap();
        assert_eq!(summary.frames_written, 3);
    }

    #[tokio::test]
    async fn grid_errors_surface_from_workers() {
        let mut writer = CsvRecordWriter::new(Vec::new());
        let oversized = PipelineConfig::new(GridDimensions::new(13, 1)).with_workers(2);
        let err = ParallelPipeline::new(oversized)
            .run(&mut MemorySource::new(frames(3)), &mut writer, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Grid(GridError::GridLargerThanFrame { grid_width: 13, .. })
        ));
    }

    #[tokio::test]
    async fn workers_are_drained_when_a_frame_fails() {
        let mut input = frames(6);
        input[3].frame = LumaFrame::new(3, 3, vec![0; 9]).unwrap();

        let mut writer = CsvRecordWriter::new(Vec::new());
        let err = ParallelPipeline::new(config(2))
            .run(&mut MemorySource::new(input), &mut writer, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Grid(GridError::GridLargerThanFrame { frame_width: 3, .. })
        ));
        // Key frames are 0, 1, 3 and 4; only the two before frame 3 land.
        assert_eq!(writer.records_written(), 2);
        assert_eq!(tokio::runtime::Handle::current().metrics().num_alive_tasks(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn decodes_without_starving_a_single_runtime_thread() {
        let mut expected = CsvRecordWriter::new(Vec::new());
        GridPipeline::new(config(1))
            .run(&mut MemorySource::new(frames(10)), &mut expected, None)
            .unwrap();

        let mut actual = CsvRecordWriter::new(Vec::new());
        ParallelPipeline::new(config(3))
            .run(&mut MemorySource::new(frames(10)), &mut actual, None)
            .await
            .unwrap();
        assert_eq!(actual.finish().unwrap(), expected.finish().unwrap());
    }

    #[tokio::test]
    async fn empty_source_writes_nothing() {
        let mut writer = CsvRecordWriter::new(Vec::new());
        let summary = ParallelPipeline::new(config(3))
            .run(&mut MemorySource::default(), &mut writer, None)
            .await
            .unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(writer.finish().unwrap().is_empty());
    }
}
