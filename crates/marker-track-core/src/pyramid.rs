//! Dyadic image pyramid for coarse-to-fine motion estimation.

use crate::{GrayImage, GrayImageView};

/// Stack of progressively half-sized images; level 0 is full resolution.
#[derive(Clone, Debug)]
pub struct Pyramid {
    pub levels: Vec<GrayImage>,
}

impl Pyramid {
    /// Build up to `max_levels` levels (including level 0).
    ///
    /// Downsampling stops early once a level would be smaller than
    /// `min_side` pixels on either axis, so tiny frames get fewer levels.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(src), fields(width = src.width, height = src.height))
    )]
    pub fn build(src: &GrayImageView<'_>, max_levels: usize, min_side: usize) -> Self {
        let mut levels = Vec::with_capacity(max_levels.max(1));
        levels.push(GrayImage {
            width: src.width,
            height: src.height,
            data: src.data.to_vec(),
        });

        while levels.len() < max_levels {
            let Some(prev) = levels.last() else { break };
            let (w, h) = (prev.width / 2, prev.height / 2);
            if w < min_side.max(1) || h < min_side.max(1) {
                break;
            }
            let next = downsample_2x(&prev.view(), w, h);
            levels.push(next);
        }

        Self { levels }
    }

    #[inline]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn level(&self, idx: usize) -> Option<GrayImageView<'_>> {
        self.levels.get(idx).map(GrayImage::view)
    }
}

/// 2×2 box average; odd trailing rows/columns are dropped.
fn downsample_2x(src: &GrayImageView<'_>, w: usize, h: usize) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let sx = 2 * x;
        let sy = 2 * y;
        let row0 = sy * src.width;
        let row1 = (sy + 1) * src.width;
        let sum = src.data[row0 + sx] as u32
            + src.data[row0 + sx + 1] as u32
            + src.data[row1 + sx] as u32
            + src.data[row1 + sx + 1] as u32;
        ((sum + 2) / 4) as u8
    })
}
