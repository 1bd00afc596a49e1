// THEORY:
// The `Pixel` module is the smallest unit of the motion engine: one RGB sample plus
// the two per-pixel measurements the rest of the system is built on.
//
// 1.  **Mask luminance**: the grey level used to binarize a frame. The weights are
//     applied as R * 0.212671 + B * 0.715160 + G * 0.072169. Blue and green carry
//     each other's conventional weights; the masks produced downstream depend on
//     exactly this formula.
// 2.  **Squared distance**: the per-pixel term of a block score, summed over the
//     three channels. The default arithmetic is exact. The 8-bit compatibility
//     arithmetic reproduces historical output where any intermediate leaving the
//     0..=255 range made the whole pixel pair count for nothing.
//
// Anything involving more than one pixel (footprints, windows, grids) lives in the
// higher-level modules.

pub mod pixel {
    use crate::config::SsdArithmetic;
    use image::Rgb;

    pub type Channel = u8;
    pub type Luminance = f64;
    pub type GreyLevel = u8;
    pub type SquaredDistance = u64;

    const RED_WEIGHT: Luminance = 0.212671;
    const BLUE_WEIGHT: Luminance = 0.715160;
    const GREEN_WEIGHT: Luminance = 0.072169;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        pub fn channels(&self) -> [Channel; 3] {
            [self.red, self.green, self.blue]
        }

        /// Luminance used for the binary mask. See the module notes for the weights.
        pub fn mask_luminance(&self) -> Luminance {
            RED_WEIGHT * self.red as Luminance
                + BLUE_WEIGHT * self.blue as Luminance
                + GREEN_WEIGHT * self.green as Luminance
        }

        /// The mask luminance stored as an 8-bit grey level (truncated).
        pub fn grey_level(&self) -> GreyLevel {
            self.mask_luminance() as GreyLevel
        }

        /// Sum over the three channels of the squared channel difference.
        pub fn squared_distance(&self, other: &Pixel, arithmetic: SsdArithmetic) -> SquaredDistance {
            match arithmetic {
                SsdArithmetic::Widened => self.widened_squared_distance(other),
                SsdArithmetic::Uint8Compat => self.uint8_squared_distance(other),
            }
        }

        fn widened_squared_distance(&self, other: &Pixel) -> SquaredDistance {
            self.channels()
                .iter()
                .zip(other.channels().iter())
                .map(|(&a, &b)| {
                    let diff = a as i64 - b as i64;
                    (diff * diff) as SquaredDistance
                })
                .sum()
        }

        // Differences and squares are 8-bit lanes; an overflow in either voids the pair.
        // The channel sum is accumulated wide.
        fn uint8_squared_distance(&self, other: &Pixel) -> SquaredDistance {
            let mut total: SquaredDistance = 0;
            for (a, b) in self.channels().into_iter().zip(other.channels()) {
                let Some(square) = a.checked_sub(b).and_then(|d| d.checked_mul(d)) else {
                    return 0;
                };
                total += square as SquaredDistance;
            }
            total
        }
    }

    impl From<&Rgb<Channel>> for Pixel {
        fn from(rgb: &Rgb<Channel>) -> Self {
            Pixel::new(rgb[0], rgb[1], rgb[2])
        }
    }

    impl From<Pixel> for Rgb<Channel> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }
}
