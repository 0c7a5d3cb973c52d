//! Iterative sub-pixel corner refinement.
//!
//! For every pixel `q` in a window around the current estimate `p`, the image
//! gradient at `q` is orthogonal to `q - p` when `p` is the true corner. The
//! refinement solves the Gaussian-weighted least-squares system built from
//! those constraints and re-centres the window until the update is small.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{sample_bilinear, GrayImageView, TermCriteria};

/// Parameters of the corner search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixParams {
    /// Full side of the square search window in pixels (odd, e.g. 11).
    ///
    /// OpenCV's `cornerSubPix` takes a half-size instead: its `winSize(11, 11)`
    /// searches a 23×23 window, i.e. `window: 23` here.
    pub window: usize,
    /// Full side of the central dead zone excluded from the sums.
    ///
    /// `None` disables the dead zone.
    pub zero_zone: Option<usize>,
    pub criteria: TermCriteria,
}

impl Default for SubPixParams {
    fn default() -> Self {
        Self {
            window: 11,
            zero_zone: None,
            criteria: TermCriteria::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SubPixError {
    #[error("search window of {window} px is too small (need at least 3)")]
    InvalidWindow { window: usize },
    #[error("search window around ({x:.2}, {y:.2}) leaves the image")]
    OutOfBounds { x: f32, y: f32 },
    #[error("corner system is singular near ({x:.2}, {y:.2})")]
    Degenerate { x: f32, y: f32 },
}

/// Refine a corner estimate to sub-pixel accuracy.
///
/// If the solver wanders farther than half a window from `start`, the start
/// point is returned unchanged.
pub fn refine_corner_subpix(
    image: &GrayImageView<'_>,
    start: Point2<f32>,
    params: &SubPixParams,
) -> Result<Point2<f32>, SubPixError> {
    let half = (params.window / 2) as i32;
    if half < 1 {
        return Err(SubPixError::InvalidWindow {
            window: params.window,
        });
    }

    // One extra pixel for the central differences, one for bilinear support.
    let margin = half as f32 + 2.0;
    if !image.contains(start.x, start.y, margin) {
        return Err(SubPixError::OutOfBounds {
            x: start.x,
            y: start.y,
        });
    }

    let weights = window_weights(half, params.zero_zone.map(|z| (z / 2) as i32));
    let mut cur = start;

    for _ in 0..params.criteria.max_iter.max(1) {
        let (mut a, mut b, mut c) = (0.0_f64, 0.0_f64, 0.0_f64);
        let (mut bb1, mut bb2) = (0.0_f64, 0.0_f64);

        let mut k = 0;
        for j in -half..=half {
            for i in -half..=half {
                let w = weights[k];
                k += 1;
                if w == 0.0 {
                    continue;
                }
                let qx = cur.x + i as f32;
                let qy = cur.y + j as f32;
                let gx = 0.5
                    * (sample_bilinear(image, qx + 1.0, qy) - sample_bilinear(image, qx - 1.0, qy))
                        as f64;
                let gy = 0.5
                    * (sample_bilinear(image, qx, qy + 1.0) - sample_bilinear(image, qx, qy - 1.0))
                        as f64;

                let gxx = gx * gx * w;
                let gxy = gx * gy * w;
                let gyy = gy * gy * w;

                a += gxx;
                b += gxy;
                c += gyy;
                bb1 += gxx * i as f64 + gxy * j as f64;
                bb2 += gxy * i as f64 + gyy * j as f64;
            }
        }

        let det = a * c - b * b;
        if !(det.abs() > 1e-6) {
            return Err(SubPixError::Degenerate { x: cur.x, y: cur.y });
        }

        let dx = ((c * bb1 - b * bb2) / det) as f32;
        let dy = ((a * bb2 - b * bb1) / det) as f32;
        cur = Point2::new(cur.x + dx, cur.y + dy);

        if !image.contains(cur.x, cur.y, margin) {
            return Err(SubPixError::OutOfBounds { x: cur.x, y: cur.y });
        }
        if params.criteria.converged(dx, dy) {
            break;
        }
    }

    if (cur.x - start.x).abs() > half as f32 || (cur.y - start.y).abs() > half as f32 {
        log::trace!(
            "subpix drifted from ({:.2}, {:.2}) to ({:.2}, {:.2}); keeping start",
            start.x,
            start.y,
            cur.x,
            cur.y
        );
        return Ok(start);
    }

    Ok(cur)
}

/// Row-major Gaussian weights over `[-half, half]²` with an optional dead zone.
fn window_weights(half: i32, zero_half: Option<i32>) -> Vec<f64> {
    let coeff = 1.0 / (half * half) as f64;
    let side = (2 * half + 1) as usize;
    let mut out = Vec::with_capacity(side * side);
    for j in -half..=half {
        let wy = (-(j * j) as f64 * coeff).exp();
        for i in -half..=half {
            let wx = (-(i * i) as f64 * coeff).exp();
            let dead = zero_half.is_some_and(|z| i.abs() <= z && j.abs() <= z);
            out.push(if dead { 0.0 } else { wx * wy });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrayImage;

    /// Smooth saddle whose corner sits at `(cx, cy)`.
    fn saddle(cx: f32, cy: f32) -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| {
            let u = ((x as f32 - cx) / 1.5).tanh();
            let v = ((y as f32 - cy) / 1.5).tanh();
            (128.0 + 100.0 * u * v).round() as u8
        })
    }

    #[test]
    fn converges_onto_saddle_corner() {
        let img = saddle(29.5, 31.5);
        let refined = refine_corner_subpix(
            &img.view(),
            Point2::new(28.0, 32.5),
            &SubPixParams::default(),
        )
        .expect("refined");
        assert!((refined.x - 29.5).abs() < 0.1, "x = {}", refined.x);
        assert!((refined.y - 31.5).abs() < 0.1, "y = {}", refined.y);
    }

    #[test]
    fn half_size_convention_window_converges() {
        let img = saddle(29.5, 31.5);
        let params = SubPixParams {
            window: 23,
            ..SubPixParams::default()
        };
        let refined =
            refine_corner_subpix(&img.view(), Point2::new(31.0, 30.0), &params).expect("refined");
        assert!((refined.x - 29.5).abs() < 0.1, "x = {}", refined.x);
        assert!((refined.y - 31.5).abs() < 0.1, "y = {}", refined.y);
    }

    #[test]
    fn dead_zone_still_converges() {
        let img = saddle(30.0, 30.0);
        let params = SubPixParams {
            zero_zone: Some(3),
            ..SubPixParams::default()
        };
        let refined =
            refine_corner_subpix(&img.view(), Point2::new(31.0, 29.0), &params).expect("refined");
        assert!((refined.x - 30.0).abs() < 0.1);
        assert!((refined.y - 30.0).abs() < 0.1);
    }

    #[test]
    fn point_near_border_is_out_of_bounds() {
        let img = saddle(30.0, 30.0);
        let err = refine_corner_subpix(
            &img.view(),
            Point2::new(3.0, 30.0),
            &SubPixParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SubPixError::OutOfBounds { .. }));
    }

    #[test]
    fn flat_patch_is_degenerate() {
        let img = GrayImage::from_fn(40, 40, |_, _| 90);
        let err = refine_corner_subpix(
            &img.view(),
            Point2::new(20.0, 20.0),
            &SubPixParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SubPixError::Degenerate { .. }));
    }

    #[test]
    fn tiny_window_is_rejected() {
        let img = saddle(30.0, 30.0);
        let params = SubPixParams {
            window: 1,
            ..SubPixParams::default()
        };
        let err = refine_corner_subpix(&img.view(), Point2::new(30.0, 30.0), &params).unwrap_err();
        assert_eq!(err, SubPixError::InvalidWindow { window: 1 });
    }
}
