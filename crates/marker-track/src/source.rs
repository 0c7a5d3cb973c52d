//! Frame acquisition.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::Frame;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("frame source unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("frame source is not open")]
    NotOpen,
}

/// A stream of frames.
///
/// `read` returns `Ok(None)` (or an empty frame) once the stream is exhausted.
pub trait FrameSource {
    fn open(&mut self) -> Result<(), SourceError>;
    fn is_open(&self) -> bool;
    fn read(&mut self) -> Result<Option<Frame>, SourceError>;
}

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Frames read from the image files of one directory, in file-name order.
///
/// A file that cannot be decoded ends the stream at that point.
#[derive(Debug)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    open: bool,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
            open: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frame files found by `open`.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<(), SourceError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            SourceError::DeviceUnavailable(format!("{}: {e}", self.dir.display()))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_frame_file(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(SourceError::DeviceUnavailable(format!(
                "{}: no frame images",
                self.dir.display()
            )));
        }

        log::info!("opened {} frames from {}", files.len(), self.dir.display());
        self.files = files;
        self.next = 0;
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };

        let decoded = ImageReader::open(path)
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode());
        let image = match decoded {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                log::warn!("ending stream at {}: {e}", path.display());
                self.next = self.files.len();
                return Ok(None);
            }
        };

        let frame = Frame::new(self.next as u64, image);
        self.next += 1;
        Ok(Some(frame))
    }
}

/// Frames held in memory; handy for tests and synthetic sequences.
#[derive(Debug, Default)]
pub struct InMemorySource {
    frames: VecDeque<Frame>,
    open: bool,
}

impl InMemorySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            open: false,
        }
    }

    /// Frames not read yet.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for InMemorySource {
    fn open(&mut self) -> Result<(), SourceError> {
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn missing_directory_is_unavailable() {
        let mut src = ImageSequenceSource::new("/definitely/not/a/frame/dir");
        let err = src.open().unwrap_err();
        assert!(matches!(err, SourceError::DeviceUnavailable(_)));
        assert!(!src.is_open());
    }

    #[test]
    fn directory_without_images_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), "hi").expect("write");
        let mut src = ImageSequenceSource::new(dir.path());
        assert!(matches!(src.open(), Err(SourceError::DeviceUnavailable(_))));
    }

    #[test]
    fn reads_images_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, shade) in [("b.png", 20u8), ("a.png", 10), ("c.bmp", 30)] {
            RgbImage::from_pixel(4, 3, Rgb([shade; 3]))
                .save(dir.path().join(name))
                .expect("save");
        }

        let mut src = ImageSequenceSource::new(dir.path());
        src.open().expect("open");
        assert_eq!(src.len(), 3);

        let mut shades = Vec::new();
        while let Some(frame) = src.read().expect("read") {
            assert_eq!(frame.index(), shades.len() as u64);
            shades.push(frame.image().get_pixel(0, 0)[0]);
        }
        assert_eq!(shades, vec![10, 20, 30]);
    }

    #[test]
    fn undecodable_file_ends_the_stream() {
        let dir = tempfile::tempdir().expect("tempdir");
        RgbImage::from_pixel(4, 3, Rgb([10; 3]))
            .save(dir.path().join("a.png"))
            .expect("save");
        std::fs::write(dir.path().join("b.png"), b"not a png").expect("write");
        RgbImage::from_pixel(4, 3, Rgb([30; 3]))
            .save(dir.path().join("c.png"))
            .expect("save");

        let mut src = ImageSequenceSource::new(dir.path());
        src.open().expect("open");
        assert_eq!(src.len(), 3);

        let first = src.read().expect("read").expect("first frame");
        assert_eq!(first.image().get_pixel(0, 0)[0], 10);
        assert!(src.read().expect("read").is_none());
        assert!(src.read().expect("read").is_none());
    }

    #[test]
    fn reading_before_open_fails() {
        let mut src = InMemorySource::new([Frame::empty(0)]);
        assert!(matches!(src.read(), Err(SourceError::NotOpen)));
        src.open().expect("open");
        assert!(src.read().expect("read").is_some());
        assert!(src.read().expect("read").is_none());
    }
}
