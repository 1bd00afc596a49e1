// THEORY:
// The `pipeline` module is the top-level API of the motion engine. It owns the
// only state that survives from one frame to the next (the padded previous frame)
// and drives every other stage for each consecutive pair.
//
// Lifecycle: `AwaitFirstFrame` until a frame arrives, then `HasPreviousFrame` for
// the rest of the stream. The first frame is only padded and remembered; every
// later frame produces exactly one annotated output, numbered from 1.
//
// Per pair:
// 1.  pad the incoming frame (current);
// 2.  binarize the previous frame;
// 3.  walk the grid over the previous frame, match each block against the current
//     frame and, when the match is strong enough, classify it against the mask;
// 4.  draw every vector (and boundary marker) onto the previous frame, strip the
//     padding and hand the result out;
// 5.  remember a copy of the current frame as the new previous frame.

use crate::config::MotionConfig;
use crate::core_modules::binary_mask::BinaryMask;
use crate::core_modules::block_matcher::find_matching_block;
use crate::core_modules::boundary::is_boundary;
use crate::core_modules::padding::PaddedFrame;
use crate::core_modules::renderer::render_motion;
use crate::error::{MotionError, Result};
use crate::frame_io::{FrameSink, FrameSource};
use image::RgbImage;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::block::{BlockCenter, GridLayout, MotionCell, MotionVector};

/// Where the controller is in the frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    AwaitFirstFrame,
    HasPreviousFrame,
}

/// Motion cells of one frame pair, in row-major grid order.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub grid: GridLayout,
    pub cells: Vec<MotionCell>,
}

impl FrameAnalysis {
    pub fn cell(&self, row: u32, col: u32) -> Option<&MotionCell> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        self.cells.get((row * self.grid.cols + col) as usize)
    }

    pub fn moving_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.vector.is_zero()).count()
    }

    pub fn boundary_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_boundary).count()
    }
}

/// One emitted frame: the previous input frame with its motion drawn on it.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    /// Sequential output number. The second input frame produces index 1.
    pub index: u64,
    /// Annotated frame at the original resolution.
    pub image: RgbImage,
    pub analysis: FrameAnalysis,
}

/// Totals of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_emitted: u64,
}

/// Two consecutive padded frames ready for analysis.
pub(crate) struct FramePair {
    pub index: u64,
    pub previous: PaddedFrame,
    pub current: PaddedFrame,
}

/// The previous-frame buffer and the frame counter.
pub(crate) struct FrameHistory {
    previous: Option<PaddedFrame>,
    frames_seen: u64,
    dimensions: Option<(u32, u32)>,
    pad: u32,
}

impl FrameHistory {
    pub fn new(pad: u32) -> Self {
        Self {
            previous: None,
            frames_seen: 0,
            dimensions: None,
            pad,
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.previous.is_some() {
            PipelineState::HasPreviousFrame
        } else {
            PipelineState::AwaitFirstFrame
        }
    }

    /// Pads `frame` and stores a copy as the new previous frame. Returns the pair
    /// to analyze for every frame but the first.
    pub fn advance(&mut self, frame: &RgbImage) -> Result<Option<FramePair>> {
        let index = self.frames_seen;
        let (width, height) = frame.dimensions();
        match self.dimensions {
            None => {
                let border = 2 * self.pad;
                if width.checked_add(border).is_none() || height.checked_add(border).is_none() {
                    return Err(MotionError::InvalidConfig(format!(
                        "a {width}x{height} frame cannot take a {} pixel padding border",
                        self.pad
                    )));
                }
                self.dimensions = Some((width, height));
            }
            Some((expected_width, expected_height)) if (expected_width, expected_height) != (width, height) => {
                return Err(MotionError::FrameSize {
                    frame: index,
                    expected_width,
                    expected_height,
                    actual_width: width,
                    actual_height: height,
                });
            }
            Some(_) => {}
        }

        let current = PaddedFrame::new(frame, self.pad);
        self.frames_seen += 1;
        let previous = self.previous.replace(current.clone());
        Ok(previous.map(|previous| FramePair {
            index,
            previous,
            current,
        }))
    }
}

/// Matches and classifies the cells of `rows` in row-major order.
pub(crate) fn analyze_rows(
    previous: &RgbImage,
    current: &RgbImage,
    mask: &BinaryMask,
    grid: &GridLayout,
    rows: Range<u32>,
    config: &MotionConfig,
) -> Result<Vec<MotionCell>> {
    let mut cells = Vec::with_capacity(rows.len() * grid.cols as usize);
    for row in rows {
        for source in grid.row_centers(row) {
            let found = find_matching_block(previous, current, source, config)?;
            cells.push(MotionCell {
                vector: MotionVector {
                    from: source,
                    to: found.center,
                },
                score: found.score,
                is_boundary: is_boundary(found.score, mask, source, config)?,
            });
        }
    }
    Ok(cells)
}

/// Runs the full grid of one pair given the previous frame's mask.
pub fn analyze_pair_with_mask(
    previous: &PaddedFrame,
    current: &PaddedFrame,
    mask: &BinaryMask,
    config: &MotionConfig,
) -> Result<FrameAnalysis> {
    let grid = GridLayout::new(previous.original_width(), previous.original_height(), config);
    let cells = analyze_rows(previous.image(), current.image(), mask, &grid, 0..grid.rows, config)?;
    Ok(FrameAnalysis { grid, cells })
}

/// Runs the full grid of one pair.
pub fn analyze_pair(previous: &PaddedFrame, current: &PaddedFrame, config: &MotionConfig) -> Result<FrameAnalysis> {
    let mask = BinaryMask::from_frame(previous.image(), config.binary_threshold);
    analyze_pair_with_mask(previous, current, &mask, config)
}

/// Draws `analysis` onto the previous frame and strips its padding.
pub(crate) fn annotate(index: u64, mut previous: PaddedFrame, analysis: FrameAnalysis) -> AnnotatedFrame {
    render_motion(previous.image_mut(), &analysis.cells);
    debug!(
        "Frame {index}: {} cells, {} moving, {} on boundaries",
        analysis.cells.len(),
        analysis.moving_cells(),
        analysis.boundary_cells()
    );
    AnnotatedFrame {
        index,
        image: previous.strip(),
        analysis,
    }
}

pub(crate) fn dump_mask(mask: &BinaryMask, path: Option<&PathBuf>, index: u64) -> Result<()> {
    match path {
        Some(path) => mask.save(path).map_err(|e| e.at(index, "mask dump")),
        None => Ok(()),
    }
}

pub(crate) fn progress_total(source: &impl FrameSource) -> String {
    source
        .frame_count()
        .map(|total| total.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// The sequential frame-pair controller.
pub struct MotionPipeline {
    config: MotionConfig,
    history: FrameHistory,
    mask_dump: Option<PathBuf>,
}

impl MotionPipeline {
    pub fn new(config: MotionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: FrameHistory::new(config.pad_size()),
            config,
            mask_dump: None,
        })
    }

    /// Writes each pair's binary mask as a PNG at `path`, overwriting it every pair.
    pub fn with_mask_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.mask_dump = Some(path.into());
        self
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.history.state()
    }

    /// Feeds the next frame. Returns the annotated previous frame for every frame
    /// but the first.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<Option<AnnotatedFrame>> {
        let Some(pair) = self.history.advance(frame)? else {
            return Ok(None);
        };

        let mask = BinaryMask::from_frame(pair.previous.image(), self.config.binary_threshold);
        dump_mask(&mask, self.mask_dump.as_ref(), pair.index)?;

        let analysis = analyze_pair_with_mask(&pair.previous, &pair.current, &mask, &self.config)
            .map_err(|e| e.at(pair.index, "block matching"))?;
        Ok(Some(annotate(pair.index, pair.previous, analysis)))
    }

    /// Drains `source`, writing every annotated frame to `sink`.
    pub fn run(&mut self, source: &mut impl FrameSource, sink: &mut impl FrameSink) -> Result<RunSummary> {
        let total = progress_total(&*source);
        let mut summary = RunSummary::default();

        while let Some(frame) = source.next_frame()? {
            if summary.frames_read >= 1 {
                info!("processing frame {} of {}", summary.frames_read, total);
            }
            summary.frames_read += 1;

            if let Some(annotated) = self.process_frame(&frame)? {
                sink.write_frame(&annotated).map_err(|e| e.at(annotated.index, "writing output"))?;
                summary.frames_emitted += 1;
            }
        }

        info!("frame processing completed.");
        Ok(summary)
    }
}
