use anyhow::{Context, Result};
use block_motion::{
    FrameSource, ImageSequenceSink, ImageSequenceSource, MotionConfig, MotionPipeline, ParallelPipeline, RunSummary,
    SsdArithmetic, TieBreak,
};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "video")]
mod video;

#[derive(Parser, Debug)]
#[command(name = "motion_tester")]
#[command(about = "Annotates block motion vectors and object boundaries on every frame of a clip")]
#[command(version)]
struct Args {
    /// Input clip: a video file (with the `video` feature) or a directory of numbered frames
    input: PathBuf,

    /// Directory receiving frame<N>.tif for every frame after the first
    #[arg(short, long, default_value = "motionDetected")]
    output_dir: PathBuf,

    /// Edge length of a block in pixels (odd)
    #[arg(long, default_value_t = 5)]
    block_size: u32,

    /// Search radius in blocks
    #[arg(long, default_value_t = 2)]
    search_radius: u32,

    /// Grey level under which a pixel is white in the binary mask
    #[arg(long, default_value_t = 127)]
    binary_threshold: u8,

    /// Minimum match score for boundary classification (default: 2 x block size)
    #[arg(long)]
    dist_threshold: Option<f64>,

    /// Magnitude used to break ties between equally scored candidates
    #[arg(long, value_enum, default_value_t = TieBreakArg::Origin)]
    tie_break: TieBreakArg,

    /// Arithmetic used to accumulate squared differences
    #[arg(long, value_enum, default_value_t = ArithmeticArg::Widened)]
    arithmetic: ArithmeticArg,

    /// Analyze each frame pair on a pool of worker tasks
    #[arg(long)]
    parallel: bool,

    /// Number of worker tasks for --parallel (default: one per CPU)
    #[arg(short = 't', long)]
    workers: Option<usize>,

    /// Write each pair's binary mask to this PNG
    #[arg(long)]
    dump_mask: Option<PathBuf>,

    /// Stitch the annotated frames into an MJPG video at this path
    #[arg(long)]
    stitch: Option<PathBuf>,

    /// Frame rate of the stitched video
    #[arg(long, default_value_t = 20.0)]
    fps: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieBreakArg {
    /// Distance of the candidate's absolute coordinates (historical output)
    Origin,
    /// Displacement from the source block
    Displacement,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArithmeticArg {
    /// Exact wide-integer accumulation
    Widened,
    /// 8-bit lanes; overflowing pixel pairs contribute nothing
    Uint8Compat,
}

impl Args {
    fn motion_config(&self) -> MotionConfig {
        let mut config = MotionConfig::with_block_size(self.block_size, self.search_radius);
        config.binary_threshold = self.binary_threshold;
        if let Some(dist_threshold) = self.dist_threshold {
            config.dist_threshold = dist_threshold;
        }
        config.tie_break = match self.tie_break {
            TieBreakArg::Origin => TieBreak::OriginMagnitude,
            TieBreakArg::Displacement => TieBreak::Displacement,
        };
        config.arithmetic = match self.arithmetic {
            ArithmeticArg::Widened => SsdArithmetic::Widened,
            ArithmeticArg::Uint8Compat => SsdArithmetic::Uint8Compat,
        };
        config.workers = self.workers;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();
    let config = args.motion_config();

    // --- 2. Frame I/O Initialization ---
    let mut source = open_source(&args.input)
        .with_context(|| format!("video clip {} failed to open", args.input.display()))?;
    let mut sink = ImageSequenceSink::create(&args.output_dir)
        .with_context(|| format!("cannot prepare output directory {}", args.output_dir.display()))?;

    // --- 3. Motion Pipeline ---
    let summary = if args.parallel {
        let mut pipeline = ParallelPipeline::new(config)?;
        if let Some(path) = &args.dump_mask {
            pipeline = pipeline.with_mask_dump(path);
        }
        info!("Analyzing {} on {} workers", args.input.display(), pipeline.workers());
        pipeline.run(&mut source, &mut sink).await?
    } else {
        let mut pipeline = MotionPipeline::new(config)?;
        if let Some(path) = &args.dump_mask {
            pipeline = pipeline.with_mask_dump(path);
        }
        info!("Analyzing {}", args.input.display());
        pipeline.run(&mut source, &mut sink)?
    };

    info!(
        "Wrote {} annotated frames of {} to {}",
        summary.frames_emitted,
        summary.frames_read,
        sink.dir().display()
    );

    // --- 4. Final Aggregation ---
    if let Some(output) = &args.stitch {
        stitch(sink.dir(), &summary, output, args.fps)?;
    }

    Ok(())
}

fn open_source(input: &Path) -> Result<Box<dyn FrameSource>> {
    if input.is_dir() {
        return Ok(Box::new(ImageSequenceSource::open(input)?));
    }
    open_video(input)
}

#[cfg(feature = "video")]
fn open_video(input: &Path) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(video::VideoFileSource::open(input)?))
}

#[cfg(not(feature = "video"))]
fn open_video(input: &Path) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "{} is not a frame directory; reading video files requires the `video` feature",
        input.display()
    )
}

#[cfg(feature = "video")]
fn stitch(frames_dir: &Path, summary: &RunSummary, output: &Path, fps: f64) -> Result<()> {
    video::stitch_sequence(frames_dir, summary.frames_emitted, output, fps)?;
    info!("Stitched video saved to {}", output.display());
    Ok(())
}

#[cfg(not(feature = "video"))]
fn stitch(_frames_dir: &Path, _summary: &RunSummary, output: &Path, _fps: f64) -> Result<()> {
    anyhow::bail!(
        "cannot write {}: stitching requires the `video` feature",
        output.display()
    )
}
