pub mod image_helper {
    use crate::error::Result;
    use image::{GrayImage, ImageEncoder, RgbImage};
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    /// File name of the annotated output for frame `index`.
    pub fn frame_file_name(index: u64) -> String {
        format!("frame{index}.tif")
    }

    /// Writes an RGB frame as an uncompressed TIFF.
    pub fn save_tiff(path: impl AsRef<Path>, frame: &RgbImage) -> Result<()> {
        let output = BufWriter::new(File::create(path)?);
        let encoder = image::codecs::tiff::TiffEncoder::new(output);

        encoder.write_image(frame.as_raw(), frame.width(), frame.height(), image::ExtendedColorType::Rgb8)?;

        Ok(())
    }

    /// Writes a single-channel image as a PNG.
    pub fn save_gray_png(path: impl AsRef<Path>, image: &GrayImage) -> Result<()> {
        let output = BufWriter::new(File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(image.as_raw(), image.width(), image.height(), image::ExtendedColorType::L8)?;

        Ok(())
    }
}
