// THEORY:
// The motion engine never touches a container format. Frames come in through a
// `FrameSource` and annotated frames leave through a `FrameSink`; the controller
// only sees `RgbImage`s. This keeps codec and file-system concerns at the edge:
// the library ships still-image adapters built on `image`, and the binary crate
// adds a video adapter on top of OpenCV.

use crate::core_modules::utils::image_helper::image_helper::{frame_file_name, save_tiff};
use crate::error::{MotionError, Result};
use crate::pipeline::AnnotatedFrame;
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "tif", "tiff", "jpg", "jpeg", "bmp"];

/// Produces frames in display order.
pub trait FrameSource {
    /// Total frame count if the source knows it up front.
    fn frame_count(&self) -> Option<u64>;

    /// The next frame, or `None` once the input is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Consumes annotated frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &AnnotatedFrame) -> Result<()>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn frame_count(&self) -> Option<u64> {
        (**self).frame_count()
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }
}

impl FrameSink for Vec<AnnotatedFrame> {
    fn write_frame(&mut self, frame: &AnnotatedFrame) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// A source over frames already held in memory.
pub struct InMemorySource {
    frames: VecDeque<RgbImage>,
    total: u64,
}

impl InMemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            total: frames.len() as u64,
            frames: frames.into(),
        }
    }
}

impl FrameSource for InMemorySource {
    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

/// Reads a directory of still images, ordered by the number in each file name.
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
    total: u64,
    next_index: u64,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort_by_cached_key(|path| (sequence_number(path), path.clone()));
        info!("Found {} frames in {}", paths.len(), dir.as_ref().display());

        Ok(Self {
            total: paths.len() as u64,
            paths: paths.into(),
            next_index: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        let frame = self.next_index;
        self.next_index += 1;
        let image = image::open(&path).map_err(|e| MotionError::FrameRead {
            frame,
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Some(image.to_rgb8()))
    }
}

// Digits in the file stem, so `frame10` sorts after `frame9`. Unnumbered files go last.
fn sequence_number(path: &Path) -> u64 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(u64::MAX)
}

/// Writes each annotated frame as `frame<N>.tif` into a directory.
pub struct ImageSequenceSink {
    dir: PathBuf,
}

impl ImageSequenceSink {
    /// Creates `dir` if needed. An existing directory is reused and its frames overwritten.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if dir.is_dir() {
            warn!("Stored motion frames in {} will be overwritten", dir.display());
        } else {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(frame_file_name(index))
    }
}

impl FrameSink for ImageSequenceSink {
    fn write_frame(&mut self, frame: &AnnotatedFrame) -> Result<()> {
        save_tiff(self.frame_path(frame.index), &frame.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_source_yields_frames_in_order() {
        let frames = vec![RgbImage::new(1, 1), RgbImage::new(2, 2)];
        let mut source = InMemorySource::new(frames);

        assert_eq!(source.frame_count(), Some(2));
        assert_eq!(source.next_frame().expect("read").map(|f| f.width()), Some(1));
        assert_eq!(source.next_frame().expect("read").map(|f| f.width()), Some(2));
        assert!(source.next_frame().expect("read").is_none());
    }

    #[test]
    fn sequence_numbers_sort_numerically() {
        let mut paths = vec![
            PathBuf::from("frame10.png"),
            PathBuf::from("cover.png"),
            PathBuf::from("frame9.png"),
            PathBuf::from("frame0.png"),
        ];
        paths.sort_by_cached_key(|path| (sequence_number(path), path.clone()));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("frame0.png"),
                PathBuf::from("frame9.png"),
                PathBuf::from("frame10.png"),
                PathBuf::from("cover.png"),
            ]
        );
    }

    #[test]
    fn missing_directory_fails_to_open() {
        let result = ImageSequenceSource::open("/definitely/not/a/frame/dir");
        assert!(matches!(result, Err(MotionError::Io(_))));
    }
}
