// THEORY:
// Block matching near the border of a frame needs pixels that do not exist. Instead
// of bounds-checking every candidate, each frame is surrounded by a zero border
// `block_size * search_radius` pixels wide. Any grid center of the original frame,
// shifted by that border, then has its whole search window inside the buffer.
//
// `PaddedFrame` remembers its border so the controller can strip it again after
// annotating, and so the grid walk can be derived from the original extent.

use crate::error::{MotionError, Result};
use image::{RgbImage, imageops};

/// A frame surrounded by a zero border of `pad` pixels on every side.
#[derive(Debug, Clone)]
pub struct PaddedFrame {
    image: RgbImage,
    pad: u32,
}

impl PaddedFrame {
    pub fn new(frame: &RgbImage, pad: u32) -> Self {
        Self {
            image: insert_padding(frame, pad),
            pad,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn pad(&self) -> u32 {
        self.pad
    }

    /// Width of the frame before padding.
    pub fn original_width(&self) -> u32 {
        self.image.width() - 2 * self.pad
    }

    /// Height of the frame before padding.
    pub fn original_height(&self) -> u32 {
        self.image.height() - 2 * self.pad
    }

    /// Returns the centered, unpadded region.
    pub fn strip(&self) -> RgbImage {
        imageops::crop_imm(
            &self.image,
            self.pad,
            self.pad,
            self.original_width(),
            self.original_height(),
        )
        .to_image()
    }
}

/// Returns an `(H + 2p) x (W + 2p)` copy of `frame` with a zero border of `pad`.
pub fn insert_padding(frame: &RgbImage, pad: u32) -> RgbImage {
    let mut padded = RgbImage::new(frame.width() + 2 * pad, frame.height() + 2 * pad);
    imageops::replace(&mut padded, frame, pad as i64, pad as i64);
    padded
}

/// Removes a border of `pad` pixels from every side of `padded`.
pub fn strip_padding(padded: &RgbImage, pad: u32) -> Result<RgbImage> {
    if padded.width() < 2 * pad || padded.height() < 2 * pad {
        return Err(MotionError::InvalidConfig(format!(
            "cannot strip a {pad} pixel border from a {}x{} frame",
            padded.width(),
            padded.height()
        )));
    }
    Ok(imageops::crop_imm(padded, pad, pad, padded.width() - 2 * pad, padded.height() - 2 * pad).to_image())
}
