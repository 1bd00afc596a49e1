// THEORY:
// This file is the main entry point for the `block_motion` library crate.
//
// The public surface is the frame-pair controller (`pipeline::MotionPipeline` and
// its parallel twin `parallel_pipeline::ParallelPipeline`), the `MotionConfig`
// value that parameterizes every stage, and the `FrameSource` / `FrameSink` traits
// that keep container and file-system I/O outside the engine. The stages
// themselves (padding, masking, block matching, boundary classification,
// rendering) live in `core_modules` and are public so they can be tested and
// reused individually.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_io;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{MotionConfig, SsdArithmetic, TieBreak};
pub use error::{MotionError, Result};
pub use frame_io::{FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource, InMemorySource};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{AnnotatedFrame, FrameAnalysis, MotionPipeline, PipelineState, RunSummary};
