// Synthetic frames for unit tests. Textures come from an integer hash so every
// block differs from every other block, which keeps best matches unique.

use crate::core_modules::block::BlockCenter;
use image::{Rgb, RgbImage};

/// Deterministic per-pixel noise in `0..=255`.
pub fn noise(x: u32, y: u32, salt: u32) -> u8 {
    let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77) ^ salt.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h & 0xFF) as u8
}

/// A noisy frame with every channel in `20..=219`, so no pixel equals the zero border.
pub fn textured(width: u32, height: u32, seed: u32) -> RgbImage {
    textured_in(width, height, seed, 20, 200)
}

/// A noisy frame with every channel in `low..low + span`.
pub fn textured_in(width: u32, height: u32, seed: u32, low: u8, span: u16) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let channel = |salt: u32| low + (noise(x, y, seed.wrapping_mul(3).wrapping_add(salt)) as u16 % span) as u8;
        Rgb([channel(0), channel(1), channel(2)])
    })
}

/// Copies the footprint around `from` in `source` onto the footprint around `to` in `target`.
pub fn copy_block(source: &RgbImage, from: BlockCenter, target: &mut RgbImage, to: BlockCenter, radius: u32) {
    for dy in 0..=2 * radius {
        for dx in 0..=2 * radius {
            let pixel = *source.get_pixel(from.x - radius + dx, from.y - radius + dy);
            target.put_pixel(to.x - radius + dx, to.y - radius + dy, pixel);
        }
    }
}
