// THEORY:
// OpenCV decodes clips into BGR `Mat`s. The adapter converts each one to RGB before it
// reaches the library, so every frame the motion engine sees is an `RgbImage` in
// R, G, B order regardless of where it came from.

use anyhow::{Context, Result, bail};
use block_motion::core_modules::utils::image_helper::image_helper::frame_file_name;
use block_motion::{FrameSource, MotionError};
use image::RgbImage;
use opencv::{
    core::{self, Mat},
    imgcodecs, imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::path::Path;
use tracing::{info, warn};

/// Decodes a video file frame by frame.
pub struct VideoFileSource {
    cap: VideoCapture,
    total: Option<u64>,
    next_index: u64,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let name = path.to_str().context("video path is not valid UTF-8")?;
        let cap = VideoCapture::from_file(name, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            bail!("video clip {} failed to open", path.display());
        }

        let reported = cap.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let total = (reported > 0.0).then_some(reported as u64);
        info!(
            "Opened {} ({}x{}, {:?} frames)",
            path.display(),
            cap.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            cap.get(videoio::CAP_PROP_FRAME_HEIGHT)?,
            total
        );

        Ok(Self {
            cap,
            total,
            next_index: 0,
        })
    }

    fn read_rgb(&mut self) -> opencv::Result<Option<RgbImage>> {
        let mut frame = Mat::default();
        if !self.cap.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
        let data = rgb.data_bytes()?.to_vec();
        rgb_frame(rgb.cols() as u32, rgb.rows() as u32, data).map(Some)
    }
}

impl FrameSource for VideoFileSource {
    fn frame_count(&self) -> Option<u64> {
        self.total
    }

    fn next_frame(&mut self) -> block_motion::Result<Option<RgbImage>> {
        let frame = self.next_index;
        self.next_index += 1;
        self.read_rgb().map_err(|e| MotionError::FrameRead {
            frame,
            message: e.to_string(),
        })
    }
}

// A buffer too short for `width x height` RGB pixels is an error, not
// the end of the clip.
fn rgb_frame(width: u32, height: u32, data: Vec<u8>) -> opencv::Result<RgbImage> {
    RgbImage::from_raw(width, height, data).ok_or_else(|| {
        opencv::Error::new(
            core::StsUnmatchedSizes,
            format!("decoded frame buffer does not hold {width}x{height} RGB pixels"),
        )
    })
}

/// Encodes `frame1.tif ..= frame<count>.tif` from `frames_dir` into an MJPG video.
pub fn stitch_sequence(frames_dir: &Path, count: u64, output: &Path, fps: f64) -> Result<()> {
    if count == 0 {
        warn!("No annotated frames to stitch");
        return Ok(());
    }

    let frame_path = |index: u64| frames_dir.join(frame_file_name(index));
    let first = read_frame(&frame_path(1))?;
    let size = first.size()?;

    let output_name = output.to_str().context("output path is not valid UTF-8")?;
    let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
    let mut writer = VideoWriter::new(output_name, fourcc, fps, core::Size::new(size.width, size.height), true)?;
    if !writer.is_opened()? {
        bail!("cannot open video writer for {}", output.display());
    }

    writer.write(&first)?;
    for index in 2..=count {
        writer.write(&read_frame(&frame_path(index))?)?;
    }
    writer.release()?;
    Ok(())
}

fn read_frame(path: &Path) -> Result<Mat> {
    let name = path.to_str().context("frame path is not valid UTF-8")?;
    let frame = imgcodecs::imread(name, imgcodecs::IMREAD_COLOR)?;
    if frame.empty() {
        bail!("cannot read annotated frame {}", path.display());
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_buffer_becomes_a_frame() {
        let frame = rgb_frame(2, 1, vec![1, 2, 3, 4, 5, 6]).expect("full buffer");
        assert_eq!(frame.get_pixel(1, 0), &image::Rgb([4, 5, 6]));
    }

    #[test]
    fn short_buffer_is_an_error() {
        assert!(rgb_frame(2, 2, vec![0; 6]).is_err());
    }
}
