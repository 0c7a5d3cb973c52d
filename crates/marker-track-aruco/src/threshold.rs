//! Binarization: a local-mean threshold for quad search and Otsu's method
//! for reading marker cells.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::box_filter;

/// Mark dark pixels as foreground (255).
///
/// A pixel is foreground when it is more than `offset` below the mean of its
/// `(2 * radius + 1)²` neighbourhood.
pub fn adaptive_threshold_inv(gray: &GrayImage, radius: u32, offset: u8) -> GrayImage {
    let mean = box_filter(gray, radius, radius);
    let offset = i32::from(offset);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = i32::from(gray.get_pixel(x, y)[0]);
        let m = i32::from(mean.get_pixel(x, y)[0]);
        Luma([if v + offset < m { 255 } else { 0 }])
    })
}

/// Cell threshold for one marker: a cell is dark when its sample is `<=` the
/// returned level.
///
/// Empty input yields 127, a single intensity yields that intensity and two
/// intensities yield their midpoint; everything else goes through Otsu.
pub(crate) fn cell_threshold(samples: &[u8]) -> u8 {
    let Some((&lo, &hi)) = samples.iter().min().zip(samples.iter().max()) else {
        return 127;
    };
    if lo == hi {
        return lo;
    }
    if samples.iter().all(|&v| v == lo || v == hi) {
        return ((lo as u16 + hi as u16) / 2) as u8;
    }
    match GrayImage::from_raw(samples.len() as u32, 1, samples.to_vec()) {
        Some(strip) => otsu_level(&strip),
        None => 127,
    }
}
