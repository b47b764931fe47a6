use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};

use gridmedian::core_modules::utils::image_helper::FrameDumper;
use gridmedian::frame_source::{FrameSource, ImageSequenceSource, SingleImageSource};
use gridmedian::output::CsvRecordWriter;
use gridmedian::parallel_pipeline::ParallelPipeline;
use gridmedian::pipeline::{GridPipeline, PipelineConfig};
use gridmedian::{GridDimensions, Statistic};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliStatistic {
    Median,
    Mean,
    Sum,
    Min,
    Max,
}

impl From<CliStatistic> for Statistic {
    fn from(value: CliStatistic) -> Self {
        match value {
            CliStatistic::Median => Statistic::Median,
            CliStatistic::Mean => Statistic::Mean,
            CliStatistic::Sum => Statistic::Sum,
            CliStatistic::Min => Statistic::Min,
            CliStatistic::Max => Statistic::Max,
        }
    }
}

/// Gridmedian - per-cell statistics of video key frames, one CSV row per frame
#[derive(Parser, Debug)]
#[command(name = "gridmedian", version, about)]
struct Cli {
    /// Grid dimensions in format WIDTHxHEIGHT (e.g. 3x3)
    dimensions: GridDimensions,

    /// Directory of key frame images, a single image, or a video file (needs the `opencv` feature)
    input: PathBuf,

    /// Path to the output CSV file
    output: PathBuf,

    /// Statistic computed for each cell
    #[arg(long, value_enum, default_value_t = CliStatistic::Median)]
    statistic: CliStatistic,

    /// Frame rate used to timestamp an image directory
    #[arg(long, default_value_t = 1.0)]
    fps: f64,

    /// Video input only: treat every Nth decoded frame as a key frame
    #[arg(long, default_value_t = 1)]
    key_frame_stride: usize,

    /// Worker tasks (0 = one per CPU, 1 = process frames sequentially)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Also save every key frame as a grayscale PNG in this directory
    #[arg(long, value_name = "DIR")]
    dump_frames: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut source = open_source(&cli)?;

    let workers = if cli.jobs == 0 { num_cpus::get() } else { cli.jobs };
    let config = PipelineConfig::new(cli.dimensions)
        .with_statistic(cli.statistic.into())
        .with_workers(workers);

    let dumper = cli
        .dump_frames
        .as_deref()
        .map(FrameDumper::new)
        .transpose()
        .context("Failed to create frame dump directory")?;

    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to open output file '{}'", cli.output.display()))?;
    let mut writer = CsvRecordWriter::new(BufWriter::new(file));

    info!(
        "computing {} of {} cells from {} with {} worker(s)",
        config.statistic,
        cli.dimensions,
        cli.input.display(),
        config.workers
    );

    let outcome = if config.workers == 1 {
        GridPipeline::new(config).run(&mut source, &mut writer, dumper.as_ref())
    } else {
        ParallelPipeline::new(config)
            .run(&mut source, &mut writer, dumper.as_ref())
            .await
    };

    let finished = match outcome {
        Ok(summary) => writer
            .finish()
            .map(|_| summary)
            .context("Failed to flush output file"),
        Err(err) => Err(anyhow::Error::new(err)),
    };

    match finished {
        Ok(summary) => {
            info!(
                "wrote {} rows to {}",
                summary.frames_written,
                cli.output.display()
            );
            Ok(())
        }
        Err(err) => {
            remove_partial_output(&cli.output);
            Err(err)
        }
    }
}

fn open_source(cli: &Cli) -> anyhow::Result<Box<dyn FrameSource>> {
    let input = cli.input.as_path();
    if input.is_dir() {
        let source = ImageSequenceSource::open(input, cli.fps)
            .with_context(|| format!("Failed to read frames from '{}'", input.display()))?;
        return Ok(Box::new(source));
    }
    if image::ImageFormat::from_path(input).is_ok() {
        return Ok(Box::new(SingleImageSource::new(input)));
    }
    open_video(input, cli.key_frame_stride)
}

#[cfg(feature = "opencv")]
fn open_video(input: &Path, key_frame_stride: usize) -> anyhow::Result<Box<dyn FrameSource>> {
    let source = gridmedian::frame_source::VideoFileSource::open(input, key_frame_stride)
        .with_context(|| format!("Failed to open video file '{}'", input.display()))?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "opencv"))]
fn open_video(input: &Path, _key_frame_stride: usize) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "'{}' is neither a directory nor an image; decoding video files requires building with `--features opencv`",
        input.display()
    )
}

fn remove_partial_output(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        warn!("Failed to remove partial output '{}': {err}", path.display());
    }
}
