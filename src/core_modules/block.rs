// THEORY:
// A block is never materialized as its own pixel buffer. It is identified purely
// by its center coordinate inside a padded frame, and every stage that needs its
// pixels (the matcher, the boundary classifier) reads the footprint
// `center - block_radius ..= center + block_radius` directly from the frame.
//
// `GridLayout` owns the one formula that decides which centers are visited.
// The walk starts at the first center whose footprint lies fully inside the
// original (unpadded) region and steps by `block_size` while the footprint still
// fits. The number of rows/columns reported by the layout and the number of
// centers produced by the walk are the same computation, so containers sized from
// `cell_count()` always hold exactly one entry per visited cell.

use crate::config::MotionConfig;

/// Center of a block, in padded-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockCenter {
    pub y: u32,
    pub x: u32,
}

impl BlockCenter {
    pub fn new(y: u32, x: u32) -> Self {
        Self { y, x }
    }
}

/// Source block center in the previous frame and its matched center in the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionVector {
    pub from: BlockCenter,
    pub to: BlockCenter,
}

impl MotionVector {
    pub fn dy(&self) -> i64 {
        self.to.y as i64 - self.from.y as i64
    }

    pub fn dx(&self) -> i64 {
        self.to.x as i64 - self.from.x as i64
    }

    pub fn is_zero(&self) -> bool {
        self.from == self.to
    }
}

/// Everything computed for one grid cell of a frame pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionCell {
    pub vector: MotionVector,
    /// Root of the summed squared differences of the best match.
    pub score: f64,
    /// True when strong motion coincides with an edge of the binary mask.
    pub is_boundary: bool,
}

/// The grid of block centers visited over a padded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Number of block rows.
    pub rows: u32,
    /// Number of block columns.
    pub cols: u32,
    block_size: u32,
    origin: u32,
}

impl GridLayout {
    /// Lays out the grid for an original (unpadded) frame of `width x height`.
    pub fn new(width: u32, height: u32, config: &MotionConfig) -> Self {
        let radius = config.block_radius();
        Self {
            rows: walk_len(height, config.block_size, radius),
            cols: walk_len(width, config.block_size, radius),
            block_size: config.block_size,
            origin: config.pad_size() + radius,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn center(&self, row: u32, col: u32) -> BlockCenter {
        BlockCenter::new(
            self.origin + row * self.block_size,
            self.origin + col * self.block_size,
        )
    }

    /// Centers of one grid row, left to right.
    pub fn row_centers(&self, row: u32) -> impl Iterator<Item = BlockCenter> + '_ {
        (0..self.cols).map(move |col| self.center(row, col))
    }

    /// All centers in row-major order.
    pub fn centers(&self) -> impl Iterator<Item = BlockCenter> + '_ {
        (0..self.rows).flat_map(move |row| self.row_centers(row))
    }
}

// Number of centers `c = radius + k * block_size` with `c < extent - radius`.
fn walk_len(extent: u32, block_size: u32, radius: u32) -> u32 {
    if extent <= 2 * radius {
        return 0;
    }
    (extent - 2 * radius).div_ceil(block_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The literal walk: start at the first interior center, step while inside.
    fn walked_centers(width: u32, height: u32, config: &MotionConfig) -> Vec<BlockCenter> {
        let pad = config.pad_size() as i64;
        let radius = config.block_radius() as i64;
        let step = config.block_size as i64;
        let mut centers = Vec::new();
        let mut y = pad + radius;
        while y < height as i64 + pad - radius {
            let mut x = pad + radius;
            while x < width as i64 + pad - radius {
                centers.push(BlockCenter::new(y as u32, x as u32));
                x += step;
            }
            y += step;
        }
        centers
    }

    #[test]
    fn layout_matches_literal_walk() {
        for (block_size, search_radius) in [(5, 2), (3, 1), (7, 0), (1, 3)] {
            let config = MotionConfig::with_block_size(block_size, search_radius);
            for width in 0..24 {
                for height in 0..24 {
                    let grid = GridLayout::new(width, height, &config);
                    let walked = walked_centers(width, height, &config);
                    assert_eq!(grid.cell_count(), walked.len(), "{width}x{height} bs={block_size}");
                    assert_eq!(grid.centers().collect::<Vec<_>>(), walked);
                }
            }
        }
    }

    #[test]
    fn odd_block_grid_is_floor_of_extent() {
        let config = MotionConfig::default();
        for width in 0..40 {
            let grid = GridLayout::new(width, 20, &config);
            assert_eq!(grid.cols, width / 5);
            assert_eq!(grid.rows, 4);
            // Never more cells than the area-based allocation.
            assert!(grid.cell_count() as u32 <= (width * 20) / 25);
        }
    }

    #[test]
    fn first_center_sits_inside_original_region() {
        let config = MotionConfig::default();
        let grid = GridLayout::new(20, 20, &config);
        assert_eq!(grid.center(0, 0), BlockCenter::new(12, 12));
        assert_eq!(grid.center(3, 3), BlockCenter::new(27, 27));
        // The last footprint ends on the last original pixel (10 + 19).
        assert_eq!(grid.center(3, 3).x + config.block_radius(), 29);
    }

    #[test]
    fn vector_offsets() {
        let vector = MotionVector {
            from: BlockCenter::new(12, 17),
            to: BlockCenter::new(7, 22),
        };
        assert_eq!(vector.dy(), -5);
        assert_eq!(vector.dx(), 5);
        assert!(!vector.is_zero());
    }
}
