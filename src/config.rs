// THEORY:
// Every tunable of the motion engine lives in one `MotionConfig` value that is
// handed down to the padding, matching, masking and classification stages. There
// are no module-level constants: a test can build a pipeline with a 3x3 block and
// a search radius of 1 as easily as the production 5x5 / radius-2 setup.
//
// The derived quantities (`block_radius`, `pad_size`) are computed here and
// nowhere else, so the padding border and the grid walk can never disagree.

use crate::error::{MotionError, Result};

/// How a candidate's offset magnitude is measured when two candidates tie on score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// `sqrt((y1 - |y2|)^2 + (x1 - |x2|)^2)` using the candidate's absolute
    /// coordinates. Matches the historical output bit-for-bit.
    #[default]
    OriginMagnitude,
    /// `sqrt((y2 - y1)^2 + (x2 - x1)^2)`, the displacement from the source block.
    Displacement,
}

/// How squared channel differences are accumulated into a block score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SsdArithmetic {
    /// Exact integer accumulation. Cannot overflow for 8-bit input.
    #[default]
    Widened,
    /// 8-bit lane arithmetic: a pixel pair whose channel difference or square
    /// leaves 0..=255 contributes nothing to the score. Channel sums are wide.
    Uint8Compat,
}

/// Configuration for the motion pipeline.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    /// Edge length of a square block in pixels. Must be odd.
    pub block_size: u32,
    /// Maximum search offset, in whole blocks, along each axis.
    pub search_radius: u32,
    /// Grey level below which a pixel is painted white (255) in the binary mask.
    pub binary_threshold: u8,
    /// Minimum block score for the boundary classifier to run.
    pub dist_threshold: f64,
    pub tie_break: TieBreak,
    pub arithmetic: SsdArithmetic,
    /// Worker count for the parallel analyzer. `None` means one per CPU.
    pub workers: Option<usize>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::with_block_size(5, 2)
    }
}

impl MotionConfig {
    /// Builds a config for the given block geometry with the default thresholds
    /// (`binary_threshold = 127`, `dist_threshold = 2 * block_size`).
    pub fn with_block_size(block_size: u32, search_radius: u32) -> Self {
        Self {
            block_size,
            search_radius,
            binary_threshold: 127,
            dist_threshold: 2.0 * block_size as f64,
            tie_break: TieBreak::default(),
            arithmetic: SsdArithmetic::default(),
            workers: None,
        }
    }

    /// Half the block size, rounded down. The footprint of a block centered at
    /// `c` spans `c - block_radius ..= c + block_radius`.
    pub fn block_radius(&self) -> u32 {
        self.block_size / 2
    }

    /// Width of the zero border added on every side of a frame.
    pub fn pad_size(&self) -> u32 {
        self.block_size * self.search_radius
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(MotionError::InvalidConfig("block_size must be at least 1".into()));
        }
        if self.block_size % 2 == 0 {
            return Err(MotionError::InvalidConfig(format!(
                "block_size must be odd so a block has a center pixel, got {}",
                self.block_size
            )));
        }
        let padded_border = self
            .block_size
            .checked_mul(self.search_radius)
            .and_then(|pad| pad.checked_mul(2));
        if padded_border.is_none() {
            return Err(MotionError::InvalidConfig(format!(
                "search_radius {} is too large for block_size {}: the padding border overflows",
                self.search_radius, self.block_size
            )));
        }
        if !self.dist_threshold.is_finite() || self.dist_threshold < 0.0 {
            return Err(MotionError::InvalidConfig(format!(
                "dist_threshold must be a finite non-negative number, got {}",
                self.dist_threshold
            )));
        }
        if self.workers == Some(0) {
            return Err(MotionError::InvalidConfig("workers must be at least 1".into()));
        }
        Ok(())
    }
}
