//! Single-point pyramidal Lucas–Kanade motion estimation.
//!
//! Coarse-to-fine forward-additive LK: the template is taken from the
//! reference pyramid around the source point, its gradients define a constant
//! 2×2 normal matrix per level, and the displacement is updated until the
//! step falls below the criteria epsilon.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{sample_bilinear_clamped, GrayImageView, Pyramid, TermCriteria};

/// Parameters of the pyramidal tracker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Full side of the square integration window (odd, e.g. 11).
    pub window: usize,
    /// Number of pyramid levels to use, including full resolution.
    ///
    /// OpenCV's `maxLevel` counts levels above the base, so `maxLevel = 5`
    /// corresponds to `pyramid_levels: 6`.
    pub pyramid_levels: usize,
    pub criteria: TermCriteria,
    /// Minimum eigenvalue of the per-pixel normal matrix for a level to be usable.
    pub min_eigen: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            window: 11,
            pyramid_levels: 5,
            criteria: TermCriteria::default(),
            min_eigen: 1e-2,
        }
    }
}

/// Result of tracking one point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowEstimate {
    /// Estimated position in the current image.
    pub point: Point2<f32>,
    /// Zero-mean normalized cross-correlation between the reference and
    /// tracked patches, clamped to `[0, 1]`.
    pub response: f32,
    /// Mean absolute intensity difference between the two patches.
    pub residual: f32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("integration window of {window} px is too small (need at least 3)")]
    InvalidWindow { window: usize },
    #[error("point ({x:.2}, {y:.2}) lies outside the image")]
    OutOfBounds { x: f32, y: f32 },
    #[error("normal matrix is singular at full resolution near ({x:.2}, {y:.2})")]
    Degenerate { x: f32, y: f32 },
    #[error("pyramid has no levels")]
    EmptyPyramid,
}

enum LevelOutcome {
    Solved(f32, f32),
    Singular,
}

/// Track `from` (reference image) into the current image, seeded with `guess`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip(reference, current, params))
)]
pub fn track_point(
    reference: &Pyramid,
    current: &Pyramid,
    from: Point2<f32>,
    guess: Point2<f32>,
    params: &FlowParams,
) -> Result<FlowEstimate, FlowError> {
    let half = (params.window / 2) as i32;
    if half < 1 {
        return Err(FlowError::InvalidWindow {
            window: params.window,
        });
    }
    let levels = params
        .pyramid_levels
        .max(1)
        .min(reference.num_levels())
        .min(current.num_levels());
    let (Some(ref0), Some(cur0)) = (reference.level(0), current.level(0)) else {
        return Err(FlowError::EmptyPyramid);
    };
    if !ref0.contains(from.x, from.y, 0.0) {
        return Err(FlowError::OutOfBounds {
            x: from.x,
            y: from.y,
        });
    }

    let top_scale = 1.0 / (1u32 << (levels - 1)) as f32;
    let mut dx = (guess.x - from.x) * top_scale;
    let mut dy = (guess.y - from.y) * top_scale;

    for level in (0..levels).rev() {
        let scale = 1.0 / (1u32 << level) as f32;
        let (Some(ref_img), Some(cur_img)) = (reference.level(level), current.level(level)) else {
            return Err(FlowError::EmptyPyramid);
        };
        let px = from.x * scale;
        let py = from.y * scale;

        match solve_level(&ref_img, &cur_img, px, py, dx, dy, half, params) {
            LevelOutcome::Solved(ndx, ndy) => {
                dx = ndx;
                dy = ndy;
            }
            LevelOutcome::Singular if level == 0 => {
                return Err(FlowError::Degenerate {
                    x: from.x,
                    y: from.y,
                });
            }
            LevelOutcome::Singular => {
                log::trace!("flow: skipping singular level {level}");
            }
        }

        if level > 0 {
            dx *= 2.0;
            dy *= 2.0;
        }
    }

    let point = Point2::new(from.x + dx, from.y + dy);
    if !cur0.contains(point.x, point.y, 0.0) {
        return Err(FlowError::OutOfBounds {
            x: point.x,
            y: point.y,
        });
    }

    let (response, residual) = patch_similarity(&ref0, &cur0, from, point, half);
    Ok(FlowEstimate {
        point,
        response,
        residual,
    })
}

#[allow(clippy::too_many_arguments)]
fn solve_level(
    ref_img: &GrayImageView<'_>,
    cur_img: &GrayImageView<'_>,
    px: f32,
    py: f32,
    mut dx: f32,
    mut dy: f32,
    half: i32,
    params: &FlowParams,
) -> LevelOutcome {
    let side = (2 * half + 1) as usize;
    let n = side * side;
    let mut template = Vec::with_capacity(n);
    let mut grads = Vec::with_capacity(n);

    let (mut g00, mut g01, mut g11) = (0.0_f64, 0.0_f64, 0.0_f64);
    for j in -half..=half {
        for i in -half..=half {
            let tx = px + i as f32;
            let ty = py + j as f32;
            let gx = 0.5
                * (sample_bilinear_clamped(ref_img, tx + 1.0, ty)
                    - sample_bilinear_clamped(ref_img, tx - 1.0, ty));
            let gy = 0.5
                * (sample_bilinear_clamped(ref_img, tx, ty + 1.0)
                    - sample_bilinear_clamped(ref_img, tx, ty - 1.0));
            template.push(sample_bilinear_clamped(ref_img, tx, ty));
            grads.push((gx, gy));
            g00 += (gx * gx) as f64;
            g01 += (gx * gy) as f64;
            g11 += (gy * gy) as f64;
        }
    }

    let det = g00 * g11 - g01 * g01;
    let min_eig = 0.5 * (g00 + g11 - ((g00 - g11).powi(2) + 4.0 * g01 * g01).sqrt()) / n as f64;
    if !(min_eig >= params.min_eigen as f64) || !(det.abs() > 1e-12) {
        return LevelOutcome::Singular;
    }
    let inv_det = 1.0 / det;

    for _ in 0..params.criteria.max_iter.max(1) {
        let (mut b0, mut b1) = (0.0_f64, 0.0_f64);
        let mut k = 0;
        for j in -half..=half {
            for i in -half..=half {
                let wx = px + dx + i as f32;
                let wy = py + dy + j as f32;
                let e = (template[k] - sample_bilinear_clamped(cur_img, wx, wy)) as f64;
                let (gx, gy) = grads[k];
                b0 += gx as f64 * e;
                b1 += gy as f64 * e;
                k += 1;
            }
        }

        let step_x = (inv_det * (g11 * b0 - g01 * b1)) as f32;
        let step_y = (inv_det * (g00 * b1 - g01 * b0)) as f32;
        if !step_x.is_finite() || !step_y.is_finite() {
            return LevelOutcome::Singular;
        }
        dx += step_x;
        dy += step_y;

        if params.criteria.converged(step_x, step_y) {
            break;
        }
    }

    LevelOutcome::Solved(dx, dy)
}

/// Zero-mean NCC (clamped to `[0, 1]`) and mean absolute difference between
/// the patch at `a` in `img_a` and the patch at `b` in `img_b`.
fn patch_similarity(
    img_a: &GrayImageView<'_>,
    img_b: &GrayImageView<'_>,
    a: Point2<f32>,
    b: Point2<f32>,
    half: i32,
) -> (f32, f32) {
    let side = (2 * half + 1) as usize;
    let n = (side * side) as f64;
    let mut va = Vec::with_capacity(side * side);
    let mut vb = Vec::with_capacity(side * side);
    for j in -half..=half {
        for i in -half..=half {
            va.push(sample_bilinear_clamped(img_a, a.x + i as f32, a.y + j as f32) as f64);
            vb.push(sample_bilinear_clamped(img_b, b.x + i as f32, b.y + j as f32) as f64);
        }
    }

    let mean_a = va.iter().sum::<f64>() / n;
    let mean_b = vb.iter().sum::<f64>() / n;
    let (mut sab, mut saa, mut sbb, mut sad) = (0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in va.iter().zip(&vb) {
        let da = x - mean_a;
        let db = y - mean_b;
        sab += da * db;
        saa += da * da;
        sbb += db * db;
        sad += (x - y).abs();
    }

    let denom = (saa * sbb).sqrt();
    let ncc = if denom > 1e-9 { sab / denom } else { 0.0 };
    (ncc.clamp(0.0, 1.0) as f32, (sad / n) as f32)
}
