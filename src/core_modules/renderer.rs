// THEORY:
// The renderer turns one frame pair's motion cells into pixels on the previous
// frame. Each motion vector becomes a 1 pixel, 4-connected arrowed line from the
// source center to the matched center, with two head strokes whose length is 0.3
// of the vector. A zero vector collapses to a single dot at the block center.
// Boundary cells additionally receive a filled marker of radius 2 at the source
// center. Cells are drawn in row-major order, arrow first then marker, so later
// cells paint over earlier ones where they overlap.
//
// All drawing is clipped to the image; the renderer works on the padded frame so
// strokes that leave the original region land in the border and are cut away when
// the padding is stripped.

use crate::core_modules::block::{BlockCenter, MotionCell};
use image::{Rgb, RgbImage};
use std::f64::consts::FRAC_PI_4;

/// Color of motion vectors.
pub const ARROW_COLOR: Rgb<u8> = Rgb([150, 30, 100]);
/// Color of the boundary marker.
pub const BOUNDARY_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

const TIP_LENGTH: f64 = 0.3;
const BOUNDARY_MARKER_RADIUS: i64 = 2;

type Point = (i64, i64);

/// Draws every cell's vector, and a marker on boundary cells, onto `frame`.
pub fn render_motion(frame: &mut RgbImage, cells: &[MotionCell]) {
    for cell in cells {
        let from = point(cell.vector.from);
        draw_arrow(frame, from, point(cell.vector.to), ARROW_COLOR);
        if cell.is_boundary {
            fill_disc(frame, from, BOUNDARY_MARKER_RADIUS, BOUNDARY_COLOR);
        }
    }
}

fn point(center: BlockCenter) -> Point {
    (center.x as i64, center.y as i64)
}

/// Line from `from` to `to` plus two head strokes at `to`.
pub fn draw_arrow(frame: &mut RgbImage, from: Point, to: Point, color: Rgb<u8>) {
    draw_line(frame, from, to, color);

    let (dx, dy) = ((from.0 - to.0) as f64, (from.1 - to.1) as f64);
    let tip_size = dx.hypot(dy) * TIP_LENGTH;
    let angle = dy.atan2(dx);
    for head_angle in [angle + FRAC_PI_4, angle - FRAC_PI_4] {
        let head = (
            (to.0 as f64 + tip_size * head_angle.cos()).round() as i64,
            (to.1 as f64 + tip_size * head_angle.sin()).round() as i64,
        );
        draw_line(frame, head, to, color);
    }
}

/// 4-connected Bresenham line, endpoints included.
pub fn draw_line(frame: &mut RgbImage, from: Point, to: Point, color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_clipped(frame, x, y, color);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 - dy > dx - e2 {
            err += dy;
            x += sx;
        } else {
            err += dx;
            y += sy;
        }
    }
}

pub fn fill_disc(frame: &mut RgbImage, center: Point, radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_clipped(frame, center.0 + dx, center.1 + dy, color);
            }
        }
    }
}

fn put_clipped(frame: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < frame.width() as i64 && y < frame.height() as i64 {
        frame.put_pixel(x as u32, y as u32, color);
    }
}
