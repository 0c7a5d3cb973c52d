//! Frames and their per-frame luminance.

use std::cell::OnceCell;

use image::{GrayImage, RgbImage};
use marker_track_core::{GrayImageView, Pyramid};

/// One RGB frame with its position in the stream.
///
/// A frame with zero width or height marks the end of the stream.
#[derive(Clone, Debug)]
pub struct Frame {
    index: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// A zero-sized frame, used by sources to signal end of stream.
    pub fn empty(index: u64) -> Self {
        Self::new(index, RgbImage::new(0, 0))
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

/// Grayscale copy of a frame, shared by all modules during one tracker pass.
///
/// The image pyramid is built on first use and reused afterwards.
#[derive(Debug)]
pub struct LumaFrame {
    index: u64,
    gray: GrayImage,
    pyramid: OnceCell<Pyramid>,
}

impl LumaFrame {
    pub fn from_frame(frame: &Frame) -> Self {
        Self::from_gray(frame.index(), image::imageops::grayscale(frame.image()))
    }

    pub fn from_gray(index: u64, gray: GrayImage) -> Self {
        Self {
            index,
            gray,
            pyramid: OnceCell::new(),
        }
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.gray.width() as usize,
            height: self.gray.height() as usize,
            data: self.gray.as_raw(),
        }
    }

    /// Pyramid of at most `levels` levels whose coarsest side stays at least
    /// `min_side`. Parameters of later calls are ignored once it exists.
    pub fn pyramid(&self, levels: usize, min_side: usize) -> &Pyramid {
        self.pyramid
            .get_or_init(|| Pyramid::build(&self.view(), levels, min_side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn zero_sized_frame_is_empty() {
        assert!(Frame::empty(3).is_empty());
        assert!(Frame::new(0, RgbImage::new(5, 0)).is_empty());
        assert!(!Frame::new(0, RgbImage::new(5, 4)).is_empty());
    }

    #[test]
    fn luma_keeps_index_and_size() {
        let frame = Frame::new(9, RgbImage::from_pixel(16, 12, Rgb([200, 200, 200])));
        let luma = LumaFrame::from_frame(&frame);
        assert_eq!(luma.index(), 9);
        assert_eq!(luma.gray().dimensions(), (16, 12));
        assert_eq!(luma.view().data[0], 200);
    }

    #[test]
    fn pyramid_is_built_once() {
        let luma = LumaFrame::from_gray(0, GrayImage::new(64, 64));
        let first = luma.pyramid(5, 11) as *const Pyramid;
        let second = luma.pyramid(2, 3) as *const Pyramid;
        assert_eq!(first, second);
        assert_eq!(luma.pyramid(1, 1).num_levels(), 3);
    }
}
