// THEORY:
// The binary mask reduces the previous frame to a two-level edge indicator. Each
// pixel's mask luminance is stored as an 8-bit grey level and compared against
// `binary_threshold`: dark pixels become 255 and bright pixels become 0 (an
// inverse black/white image). A block whose footprint contains both levels has an
// edge running through it.
//
// The mask is computed on the padded frame so that it can be indexed with the same
// block centers as the frames themselves. The zero border is dark and therefore
// white (255) in the mask.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::utils::image_helper::image_helper::save_gray_png;
use crate::error::Result;
use image::{GrayImage, Luma, RgbImage};
use std::path::Path;

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// A single-channel image holding only `MASK_ON` and `MASK_OFF`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    /// Builds the inverse binary mask of `frame`.
    pub fn from_frame(frame: &RgbImage, binary_threshold: u8) -> Self {
        let image = GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            let grey = Pixel::from(frame.get_pixel(x, y)).grey_level();
            if grey < binary_threshold {
                Luma([MASK_ON])
            } else {
                Luma([MASK_OFF])
            }
        });
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y)[0]
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Writes the mask as a PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_gray_png(path, &self.image)
    }
}
