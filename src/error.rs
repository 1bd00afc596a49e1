//! Error types for block_motion

use thiserror::Error;

/// Result type alias for block_motion operations
pub type Result<T> = std::result::Result<T, MotionError>;

/// Main error type for the motion pipeline
#[derive(Error, Debug)]
pub enum MotionError {
    /// The configuration cannot drive a search
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A frame does not have the dimensions the run started with
    #[error("Frame {frame} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        frame: u64,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// A block footprint left the padded frame. Indicates a padding or grid bug.
    #[error("Block centered at (y={y}, x={x}) reaches outside the {width}x{height} padded frame")]
    SearchOutOfBounds { y: i64, x: i64, width: u32, height: u32 },

    /// The frame source failed while producing a frame
    #[error("Failed to read frame {frame}: {message}")]
    FrameRead { frame: u64, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A parallel analysis task did not complete
    #[error("Worker error: {0}")]
    Worker(String),

    /// An error raised while a specific frame was in a specific stage
    #[error("Frame {frame}: {stage} failed: {source}")]
    Stage {
        frame: u64,
        stage: &'static str,
        #[source]
        source: Box<MotionError>,
    },
}

impl MotionError {
    /// Tags the error with the frame index and pipeline stage it came from.
    pub fn at(self, frame: u64, stage: &'static str) -> Self {
        match self {
            already @ (MotionError::Stage { .. } | MotionError::FrameRead { .. } | MotionError::FrameSize { .. }) => {
                already
            }
            other => MotionError::Stage {
                frame,
                stage,
                source: Box::new(other),
            },
        }
    }
}
