//! Lightweight grayscale image types and bilinear sampling.

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Black image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    /// Wrap a row-major buffer. Returns `None` if the length does not match.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl GrayImageView<'_> {
    /// True if `(x, y)` lies inside `[margin, size - 1 - margin]` on both axes.
    #[inline]
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        x.is_finite()
            && y.is_finite()
            && x >= margin
            && y >= margin
            && x <= self.width as f32 - 1.0 - margin
            && y <= self.height as f32 - 1.0 - margin
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
fn get_gray_clamped(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, src.width as i32 - 1);
    let y = y.clamp(0, src.height as i32 - 1);
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample; pixels outside the image read as 0.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    bilinear_with(src, x, y, get_gray)
}

/// Bilinear sample with border replication.
///
/// The view must not be empty.
#[inline]
pub fn sample_bilinear_clamped(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    bilinear_with(src, x, y, get_gray_clamped)
}

#[inline]
fn bilinear_with(
    src: &GrayImageView<'_>,
    x: f32,
    y: f32,
    get: fn(&GrayImageView<'_>, i32, i32) -> u8,
) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get(src, x0, y0) as f32;
    let p10 = get(src, x0 + 1, y0) as f32;
    let p01 = get(src, x0, y0 + 1) as f32;
    let p11 = get(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = GrayImage::from_raw(2, 2, vec![0, 100, 100, 200]).expect("2x2");
        let v = sample_bilinear(&img.view(), 0.5, 0.5);
        assert_relative_eq!(v, 100.0, epsilon = 1e-4);
    }

    #[test]
    fn clamped_sampling_replicates_border() {
        let img = GrayImage::from_fn(4, 4, |x, _| (x * 10) as u8);
        let view = img.view();
        assert_relative_eq!(sample_bilinear_clamped(&view, -3.0, 1.0), 0.0);
        assert_relative_eq!(sample_bilinear_clamped(&view, 7.5, 1.0), 30.0);
        assert_relative_eq!(sample_bilinear(&view, 7.5, 1.0), 0.0);
    }

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(GrayImage::from_raw(3, 3, vec![0; 8]).is_none());
    }

    #[test]
    fn contains_respects_margin() {
        let img = GrayImage::new(20, 10);
        let view = img.view();
        assert!(view.contains(5.0, 5.0, 2.0));
        assert!(!view.contains(1.0, 5.0, 2.0));
        assert!(!view.contains(5.0, 8.5, 2.0));
        assert!(!view.contains(f32::NAN, 5.0, 0.0));
    }
}
