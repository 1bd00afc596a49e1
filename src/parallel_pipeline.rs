// THEORY:
// Within one frame pair every block search is independent: it reads the two frames
// and the mask and writes only its own cell. `ParallelPipeline` exploits that by
// splitting the grid rows into contiguous bands, analyzing each band on a blocking
// worker task and concatenating the bands back in row order. The cells, and so the
// render order and the emitted frames, are identical to `MotionPipeline`.
//
// Frames are still consumed strictly one at a time; only the grid walk of a single
// pair is fanned out.

use crate::config::MotionConfig;
use crate::core_modules::binary_mask::BinaryMask;
use crate::core_modules::padding::PaddedFrame;
use crate::error::{MotionError, Result};
use crate::frame_io::{FrameSink, FrameSource};
use crate::pipeline::{
    AnnotatedFrame, FrameAnalysis, FrameHistory, FramePair, GridLayout, PipelineState, RunSummary, analyze_rows,
    annotate, dump_mask, progress_total,
};
use futures::future::join_all;
use image::RgbImage;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Frame-pair controller that analyzes each pair's grid on a pool of worker tasks.
pub struct ParallelPipeline {
    config: Arc<MotionConfig>,
    history: FrameHistory,
    mask_dump: Option<PathBuf>,
    workers: usize,
}

impl ParallelPipeline {
    pub fn new(config: MotionConfig) -> Result<Self> {
        config.validate()?;
        let workers = config.worker_count();
        Ok(Self {
            history: FrameHistory::new(config.pad_size()),
            config: Arc::new(config),
            mask_dump: None,
            workers,
        })
    }

    /// Writes each pair's binary mask as a PNG at `path`, overwriting it every pair.
    pub fn with_mask_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.mask_dump = Some(path.into());
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn state(&self) -> PipelineState {
        self.history.state()
    }

    /// Feeds the next frame. Returns the annotated previous frame for every frame
    /// but the first.
    pub async fn process_frame(&mut self, frame: &RgbImage) -> Result<Option<AnnotatedFrame>> {
        let Some(FramePair { index, previous, current }) = self.history.advance(frame)? else {
            return Ok(None);
        };

        let mask = BinaryMask::from_frame(previous.image(), self.config.binary_threshold);
        dump_mask(&mask, self.mask_dump.as_ref(), index)?;

        let previous = Arc::new(previous);
        let analysis = self
            .analyze(Arc::clone(&previous), Arc::new(current), Arc::new(mask))
            .await
            .map_err(|e| e.at(index, "block matching"))?;

        let previous = Arc::try_unwrap(previous).unwrap_or_else(|shared| (*shared).clone());
        Ok(Some(annotate(index, previous, analysis)))
    }

    async fn analyze(
        &self,
        previous: Arc<PaddedFrame>,
        current: Arc<PaddedFrame>,
        mask: Arc<BinaryMask>,
    ) -> Result<FrameAnalysis> {
        let grid = GridLayout::new(previous.original_width(), previous.original_height(), &self.config);
        let bands = row_bands(grid.rows, self.workers);
        debug!("Analyzing {} rows in {} bands", grid.rows, bands.len());

        let tasks = bands.into_iter().map(|rows| {
            let previous = Arc::clone(&previous);
            let current = Arc::clone(&current);
            let mask = Arc::clone(&mask);
            let config = Arc::clone(&self.config);
            tokio::task::spawn_blocking(move || {
                analyze_rows(previous.image(), current.image(), &mask, &grid, rows, &config)
            })
        });

        let mut cells = Vec::with_capacity(grid.cell_count());
        for result in join_all(tasks).await {
            let band = result.map_err(|e| MotionError::Worker(e.to_string()))??;
            cells.extend(band);
        }
        Ok(FrameAnalysis { grid, cells })
    }

    /// Drains `source`, writing every annotated frame to `sink`.
    pub async fn run(&mut self, source: &mut impl FrameSource, sink: &mut impl FrameSink) -> Result<RunSummary> {
        let total = progress_total(&*source);
        let mut summary = RunSummary::default();

        while let Some(frame) = source.next_frame()? {
            if summary.frames_read >= 1 {
                info!("processing frame {} of {}", summary.frames_read, total);
            }
            summary.frames_read += 1;

            if let Some(annotated) = self.process_frame(&frame).await? {
                sink.write_frame(&annotated).map_err(|e| e.at(annotated.index, "writing output"))?;
                summary.frames_emitted += 1;
            }
        }

        info!("frame processing completed.");
        Ok(summary)
    }
}

/// Splits `0..rows` into at most `workers` contiguous, near-equal bands.
fn row_bands(rows: u32, workers: usize) -> Vec<Range<u32>> {
    let bands = (workers.max(1) as u32).min(rows.max(1));
    let base = rows / bands;
    let extra = rows % bands;

    let mut start = 0;
    (0..bands)
        .map(|band| {
            let len = base + u32::from(band < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::utils::test_frames::textured;
    use crate::frame_io::InMemorySource;
    use crate::pipeline::MotionPipeline;

    fn config_with_workers(workers: usize) -> MotionConfig {
        let mut config = MotionConfig::default();
        config.workers = Some(workers);
        config
    }

    #[test]
    fn bands_cover_rows_in_order() {
        assert_eq!(row_bands(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(row_bands(2, 8), vec![0..1, 1..2]);
        assert_eq!(row_bands(0, 4), vec![0..0]);
        assert_eq!(row_bands(5, 1), vec![0..5]);
    }

    #[tokio::test]
    async fn first_frame_produces_no_output() {
        let mut pipeline = ParallelPipeline::new(config_with_workers(2)).expect("valid config");
        assert!(pipeline.process_frame(&textured(20, 20, 1)).await.expect("process").is_none());
        assert_eq!(pipeline.state(), PipelineState::HasPreviousFrame);
    }

    #[tokio::test]
    async fn matches_sequential_pipeline() {
        let frames: Vec<RgbImage> = (0..3).map(|seed| textured(35, 30, 50 + seed)).collect();

        let mut sequential_out = Vec::new();
        MotionPipeline::new(MotionConfig::default())
            .expect("valid config")
            .run(&mut InMemorySource::new(frames.clone()), &mut sequential_out)
            .expect("sequential run");

        for workers in [1, 2, 3, 7] {
            let mut parallel_out = Vec::new();
            let summary = ParallelPipeline::new(config_with_workers(workers))
                .expect("valid config")
                .run(&mut InMemorySource::new(frames.clone()), &mut parallel_out)
                .await
                .expect("parallel run");

            assert_eq!(summary.frames_emitted, 2);
            for (sequential, parallel) in sequential_out.iter().zip(&parallel_out) {
                assert_eq!(sequential.index, parallel.index);
                assert_eq!(sequential.analysis.cells, parallel.analysis.cells, "workers = {workers}");
                assert_eq!(sequential.image, parallel.image);
            }
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(ParallelPipeline::new(config_with_workers(0)).is_err());
    }
}
