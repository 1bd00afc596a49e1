// THEORY:
// A block sits on an object boundary when strong motion coincides with an edge of
// the binary mask. The edge test is purely local: the block's footprint in the mask
// must hold both levels. A uniform footprint (all 0 or all 255) is never a
// boundary, whatever the motion.
//
// The motion test gates the edge test. Below `dist_threshold` the footprint is not
// inspected at all and the flag stays false.

use crate::config::MotionConfig;
use crate::core_modules::binary_mask::{BinaryMask, MASK_OFF};
use crate::core_modules::block::BlockCenter;
use crate::error::{MotionError, Result};

/// True iff the `block_size x block_size` footprint centered at `center` holds
/// both a zero and a nonzero mask value.
pub fn straddles_edge(mask: &BinaryMask, center: BlockCenter, block_size: u32) -> Result<bool> {
    let radius = block_size / 2;
    let fits = center.y >= radius
        && center.x >= radius
        && center.y + radius < mask.height()
        && center.x + radius < mask.width();
    if !fits {
        return Err(MotionError::SearchOutOfBounds {
            y: center.y as i64,
            x: center.x as i64,
            width: mask.width(),
            height: mask.height(),
        });
    }

    let mut seen_off = false;
    let mut seen_on = false;
    for y in center.y - radius..=center.y + radius {
        for x in center.x - radius..=center.x + radius {
            if mask.value(x, y) == MASK_OFF {
                seen_off = true;
            } else {
                seen_on = true;
            }
            if seen_off && seen_on {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// The boundary flag of one grid cell given its best match score.
pub fn is_boundary(score: f64, mask: &BinaryMask, center: BlockCenter, config: &MotionConfig) -> Result<bool> {
    if score < config.dist_threshold {
        return Ok(false);
    }
    straddles_edge(mask, center, config.block_size)
}
