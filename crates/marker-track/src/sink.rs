//! Consumers of annotated frames.

use std::path::{Path, PathBuf};

use image::RgbImage;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Image(#[from] image::ImageError),
}

/// Whether the loop should keep going after a frame was consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkFlow {
    Continue,
    Stop,
}

pub trait FrameSink {
    fn consume(&mut self, index: u64, image: &RgbImage) -> Result<SinkFlow, SinkError>;
}

/// Discards every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn consume(&mut self, _index: u64, _image: &RgbImage) -> Result<SinkFlow, SinkError> {
        Ok(SinkFlow::Continue)
    }
}

/// Writes frames as `frame_000123.png` into a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: usize,
}

impl DirectorySink {
    /// Create the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for DirectorySink {
    fn consume(&mut self, index: u64, image: &RgbImage) -> Result<SinkFlow, SinkError> {
        let path = self.dir.join(format!("frame_{index:06}.png"));
        image.save(&path)?;
        self.written += 1;
        log::trace!("wrote {}", path.display());
        Ok(SinkFlow::Continue)
    }
}
