// THEORY:
// The block matcher is the heart of the motion engine. For one block of the
// previous frame it looks at every block-aligned candidate within
// `search_radius` blocks in the current frame and keeps the closest one.
//
// 1.  **Exhaustive, ordered search**: candidates are visited row-major, vertical
//     factor outer and horizontal factor inner, each in `-radius..=radius`. The
//     tie-break below depends on this order.
// 2.  **Score**: the square root of the squared channel differences summed over
//     the footprint and all three channels. Thresholds downstream are expressed in
//     this rooted unit.
// 3.  **Tie-break**: before a candidate is scored its offset magnitude is folded
//     into a running minimum over the whole search so far. A candidate with an
//     equal score replaces the current best only when its own magnitude equals
//     that running minimum. It is not compared with the magnitude of the current
//     best. Once the zero-offset candidate has been seen the running minimum is 0,
//     so only it can win a tie from then on.
// 4.  **Loud bounds**: padding guarantees every footprint is inside the frame. A
//     footprint that is not is reported as an error rather than clamped.

use crate::config::{MotionConfig, SsdArithmetic, TieBreak};
use crate::core_modules::block::BlockCenter;
use crate::core_modules::pixel::pixel::{Pixel, SquaredDistance};
use crate::error::{MotionError, Result};
use image::RgbImage;

/// The winning candidate of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMatch {
    /// Center of the matched block in the current frame.
    pub center: BlockCenter,
    /// Rooted sum of squared differences against the source block.
    pub score: f64,
}

/// Searches `current` for the block that best matches the block of `previous`
/// centered at `source`. Both frames must be padded with `config.pad_size()`.
pub fn find_matching_block(
    previous: &RgbImage,
    current: &RgbImage,
    source: BlockCenter,
    config: &MotionConfig,
) -> Result<BlockMatch> {
    let radius = config.block_radius() as i64;
    let step = config.block_size as i64;
    let search = config.search_radius as i64;
    check_footprint(previous, source.y as i64, source.x as i64, radius)?;

    let mut best: Option<BlockMatch> = None;
    let mut min_offset = f64::INFINITY;

    for factor_y in -search..=search {
        let candidate_y = source.y as i64 + step * factor_y;
        for factor_x in -search..=search {
            let candidate_x = source.x as i64 + step * factor_x;

            let offset = offset_magnitude(config.tie_break, source, candidate_y, candidate_x);
            if offset < min_offset {
                min_offset = offset;
            }

            check_footprint(current, candidate_y, candidate_x, radius)?;
            let candidate = BlockCenter::new(candidate_y as u32, candidate_x as u32);
            let score = block_score(previous, current, source, candidate, config);

            best = match best {
                None => Some(BlockMatch { center: candidate, score }),
                Some(current_best) if score < current_best.score => Some(BlockMatch { center: candidate, score }),
                Some(current_best) if score == current_best.score && offset == min_offset => {
                    Some(BlockMatch { center: candidate, score })
                }
                keep => keep,
            };
        }
    }

    best.ok_or_else(|| MotionError::InvalidConfig("search window holds no candidates".into()))
}

/// Magnitude used by the tie-break for a candidate centered at `(candidate_y, candidate_x)`.
pub fn offset_magnitude(tie_break: TieBreak, source: BlockCenter, candidate_y: i64, candidate_x: i64) -> f64 {
    let (y_dist, x_dist) = match tie_break {
        TieBreak::OriginMagnitude => (
            source.y as i64 - candidate_y.abs(),
            source.x as i64 - candidate_x.abs(),
        ),
        TieBreak::Displacement => (
            candidate_y - source.y as i64,
            candidate_x - source.x as i64,
        ),
    };
    ((y_dist * y_dist + x_dist * x_dist) as f64).sqrt()
}

/// Rooted sum of squared differences between two equally sized footprints.
pub fn block_score(
    previous: &RgbImage,
    current: &RgbImage,
    source: BlockCenter,
    candidate: BlockCenter,
    config: &MotionConfig,
) -> f64 {
    let radius = config.block_radius();
    let total: SquaredDistance = footprint_sum(
        previous,
        current,
        (source.x - radius, source.y - radius),
        (candidate.x - radius, candidate.y - radius),
        config.block_size,
        config.arithmetic,
    );
    (total as f64).sqrt()
}

fn footprint_sum(
    previous: &RgbImage,
    current: &RgbImage,
    (x1, y1): (u32, u32),
    (x2, y2): (u32, u32),
    block_size: u32,
    arithmetic: SsdArithmetic,
) -> SquaredDistance {
    let mut total: SquaredDistance = 0;
    for dy in 0..block_size {
        for dx in 0..block_size {
            let a = Pixel::from(previous.get_pixel(x1 + dx, y1 + dy));
            let b = Pixel::from(current.get_pixel(x2 + dx, y2 + dy));
            total += a.squared_distance(&b, arithmetic);
        }
    }
    total
}

fn check_footprint(frame: &RgbImage, y: i64, x: i64, radius: i64) -> Result<()> {
    let inside = y - radius >= 0
        && x - radius >= 0
        && y + radius < frame.height() as i64
        && x + radius < frame.width() as i64;
    if inside {
        Ok(())
    } else {
        Err(MotionError::SearchOutOfBounds {
            y,
            x,
            width: frame.width(),
            height: frame.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::block::GridLayout;
    use crate::core_modules::padding::insert_padding;
    use crate::core_modules::utils::test_frames::{copy_block, textured};

    fn padded_pair(seed_previous: u32, seed_current: u32) -> (RgbImage, RgbImage) {
        let config = MotionConfig::default();
        (
            insert_padding(&textured(25, 25, seed_previous), config.pad_size()),
            insert_padding(&textured(25, 25, seed_current), config.pad_size()),
        )
    }

    #[test]
    fn identical_frames_match_in_place_with_zero_score() {
        let config = MotionConfig::default();
        let frame = insert_padding(&textured(20, 15, 7), config.pad_size());
        let grid = GridLayout::new(20, 15, &config);

        for center in grid.centers() {
            let found = find_matching_block(&frame, &frame, center, &config).expect("search failed");
            assert_eq!(found.center, center);
            assert_eq!(found.score, 0.0);
        }
    }

    #[test]
    fn uniform_frames_still_resolve_to_zero_offset() {
        let config = MotionConfig::default();
        let frame = insert_padding(&RgbImage::from_pixel(15, 15, image::Rgb([90, 90, 90])), config.pad_size());
        let center = BlockCenter::new(17, 17);

        let found = find_matching_block(&frame, &frame, center, &config).expect("search failed");
        assert_eq!(found.center, center);
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn finds_displaced_block() {
        let config = MotionConfig::default();
        let (previous, mut current) = padded_pair(1, 2);
        let source = BlockCenter::new(22, 22);
        let target = BlockCenter::new(17, 32);
        copy_block(&previous, source, &mut current, target, config.block_radius());

        let found = find_matching_block(&previous, &current, source, &config).expect("search failed");
        assert_eq!(found.center, target);
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn score_is_root_of_squared_sum() {
        let config = MotionConfig::with_block_size(3, 0);
        let previous = RgbImage::from_pixel(3, 3, image::Rgb([10, 10, 10]));
        let mut current = previous.clone();
        current.put_pixel(1, 1, image::Rgb([13, 14, 10]));

        let found = find_matching_block(&previous, &current, BlockCenter::new(1, 1), &config).expect("search failed");
        assert_eq!(found.score, 5.0);
    }

    #[test]
    fn equal_scores_keep_first_in_row_major_order() {
        // Copies at (0, -1) and (0, +1) have the same score and magnitude. By the time
        // (0, +1) is visited the zero offset has pulled the running minimum to 0.
        let config = MotionConfig::default();
        let (previous, mut current) = padded_pair(3, 4);
        let source = BlockCenter::new(22, 22);
        copy_block(&previous, source, &mut current, BlockCenter::new(22, 17), 2);
        copy_block(&previous, source, &mut current, BlockCenter::new(22, 27), 2);

        let found = find_matching_block(&previous, &current, source, &config).expect("search failed");
        assert_eq!(found.center, BlockCenter::new(22, 17));
    }

    #[test]
    fn later_tie_at_running_minimum_replaces_best() {
        // (-1, 0) and (0, -1) both have magnitude 5, the running minimum when
        // (0, -1) is visited, so the later candidate wins the tie.
        let config = MotionConfig::default();
        let (previous, mut current) = padded_pair(5, 6);
        let source = BlockCenter::new(22, 22);
        copy_block(&previous, source, &mut current, BlockCenter::new(17, 22), 2);
        copy_block(&previous, source, &mut current, BlockCenter::new(22, 17), 2);

        let found = find_matching_block(&previous, &current, source, &config).expect("search failed");
        assert_eq!(found.center, BlockCenter::new(22, 17));
    }

    #[test]
    fn later_tie_above_running_minimum_is_ignored() {
        // (-1, -1) and (-1, +1) share magnitude ~7.07, but (-1, 0) lowered the
        // running minimum to 5 in between.
        let config = MotionConfig::default();
        let (previous, mut current) = padded_pair(8, 9);
        let source = BlockCenter::new(22, 22);
        copy_block(&previous, source, &mut current, BlockCenter::new(17, 17), 2);
        copy_block(&previous, source, &mut current, BlockCenter::new(17, 27), 2);

        let found = find_matching_block(&previous, &current, source, &config).expect("search failed");
        assert_eq!(found.center, BlockCenter::new(17, 17));
    }

    #[test]
    fn nearer_later_tie_replaces_farther_best() {
        let config = MotionConfig::default();
        let (previous, mut current) = padded_pair(10, 11);
        let source = BlockCenter::new(22, 22);
        copy_block(&previous, source, &mut current, BlockCenter::new(12, 22), 2);
        copy_block(&previous, source, &mut current, BlockCenter::new(17, 22), 2);

        let found = find_matching_block(&previous, &current, source, &config).expect("search failed");
        assert_eq!(found.center, BlockCenter::new(17, 22));
    }

    #[test]
    fn tie_break_modes_agree_on_padded_coordinates() {
        let source = BlockCenter::new(22, 22);
        for (y, x) in [(12, 12), (17, 27), (22, 22), (32, 17)] {
            let origin = offset_magnitude(TieBreak::OriginMagnitude, source, y, x);
            let displacement = offset_magnitude(TieBreak::Displacement, source, y, x);
            assert_eq!(origin, displacement);
        }
        assert_eq!(offset_magnitude(TieBreak::Displacement, source, 22, 27), 5.0);
    }

    #[test]
    fn tie_break_modes_differ_for_negative_coordinates() {
        let source = BlockCenter::new(2, 2);
        let origin = offset_magnitude(TieBreak::OriginMagnitude, source, -3, 2);
        let displacement = offset_magnitude(TieBreak::Displacement, source, -3, 2);
        assert_eq!(origin, 1.0);
        assert_eq!(displacement, 5.0);
    }

    #[test]
    fn unpadded_border_block_fails_loudly() {
        let config = MotionConfig::default();
        let frame = textured(20, 20, 12);
        let result = find_matching_block(&frame, &frame, BlockCenter::new(2, 2), &config);
        assert!(matches!(result, Err(MotionError::SearchOutOfBounds { .. })));
    }

    #[test]
    fn compat_arithmetic_keeps_identity() {
        let mut config = MotionConfig::default();
        config.arithmetic = SsdArithmetic::Uint8Compat;
        let frame = insert_padding(&textured(15, 15, 13), config.pad_size());
        let center = BlockCenter::new(17, 17);

        let found = find_matching_block(&frame, &frame, center, &config).expect("search failed");
        assert_eq!(found.center, center);
        assert_eq!(found.score, 0.0);
    }
}
