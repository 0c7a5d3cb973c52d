//! Square-candidate search: binarize, trace outer contours, keep convex
//! quadrilaterals.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::threshold::adaptive_threshold_inv;

/// Parameters of the candidate search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadParams {
    /// Half side of the local-mean window used for binarization.
    pub threshold_radius: u32,
    /// How far below the local mean a pixel must be to count as dark.
    pub threshold_offset: u8,
    /// Minimum contour length as a fraction of the image width.
    pub min_contour_frac: f32,
    /// Polygon approximation tolerance as a fraction of the contour length.
    pub poly_epsilon_frac: f32,
    /// Minimum quad side in pixels.
    pub min_side_px: f32,
    /// Quads whose corners are on average closer than this are merged,
    /// keeping the larger one.
    pub min_corner_distance_px: f32,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            threshold_radius: 3,
            threshold_offset: 7,
            min_contour_frac: 0.05,
            poly_epsilon_frac: 0.05,
            min_side_px: 10.0,
            min_corner_distance_px: 10.0,
        }
    }
}

/// Find clockwise (in image coordinates) convex quads around dark regions.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(gray, params), fields(w = gray.width(), h = gray.height()))
)]
pub fn find_quad_candidates(gray: &GrayImage, params: &QuadParams) -> Vec<[Point2<f32>; 4]> {
    let bin = adaptive_threshold_inv(gray, params.threshold_radius, params.threshold_offset);
    let min_len = ((gray.width() as f32 * params.min_contour_frac) as usize).max(4);

    let mut quads = Vec::new();
    for contour in find_contours::<i32>(&bin) {
        if contour.border_type != BorderType::Outer || contour.points.len() < min_len {
            continue;
        }
        let eps = (contour.points.len() as f64 * params.poly_epsilon_frac as f64).max(0.5);
        let poly = simplify(approximate_polygon_dp(&contour.points, eps, true));
        if poly.len() != 4 {
            continue;
        }
        let quad: [Point2<f32>; 4] =
            std::array::from_fn(|i| Point2::new(poly[i].x as f32, poly[i].y as f32));
        if !is_convex(&quad) || min_side(&quad) < params.min_side_px {
            continue;
        }
        quads.push(clockwise(quad));
    }

    let kept = suppress_near(quads, params.min_corner_distance_px);
    log::debug!("quad search: {} candidates", kept.len());
    kept
}

/// Drop the closing duplicate and nearly collinear vertices.
fn simplify(mut poly: Vec<Point<i32>>) -> Vec<Point<i32>> {
    if poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    loop {
        let n = poly.len();
        if n < 4 {
            return poly;
        }
        let flat = (0..n).find(|&i| {
            let a = poly[(i + n - 1) % n];
            let b = poly[i];
            let c = poly[(i + 1) % n];
            let (ux, uy) = ((b.x - a.x) as f32, (b.y - a.y) as f32);
            let (vx, vy) = ((c.x - b.x) as f32, (c.y - b.y) as f32);
            let norm = (ux.hypot(uy) * vx.hypot(vy)).max(f32::EPSILON);
            (ux * vy - uy * vx).abs() / norm < 0.1
        });
        match flat {
            Some(i) => {
                poly.remove(i);
            }
            None => return poly,
        }
    }
}

fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn is_convex(q: &[Point2<f32>; 4]) -> bool {
    let signs: Vec<f32> = (0..4).map(|i| cross(q[i], q[(i + 1) % 4], q[(i + 2) % 4])).collect();
    signs.iter().all(|&s| s > 0.0) || signs.iter().all(|&s| s < 0.0)
}

fn min_side(q: &[Point2<f32>; 4]) -> f32 {
    (0..4)
        .map(|i| (q[(i + 1) % 4] - q[i]).norm())
        .fold(f32::INFINITY, f32::min)
}

fn perimeter(q: &[Point2<f32>; 4]) -> f32 {
    (0..4).map(|i| (q[(i + 1) % 4] - q[i]).norm()).sum()
}

/// With y pointing down, clockwise order has a positive turn at every vertex.
fn clockwise(mut q: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    if cross(q[0], q[1], q[2]) < 0.0 {
        q.swap(1, 3);
    }
    q
}

/// Mean corner distance, minimized over cyclic relabelings of `b`.
fn corner_distance(a: &[Point2<f32>; 4], b: &[Point2<f32>; 4]) -> f32 {
    (0..4)
        .map(|shift| (0..4).map(|i| (a[i] - b[(i + shift) % 4]).norm()).sum::<f32>() / 4.0)
        .fold(f32::INFINITY, f32::min)
}

fn suppress_near(quads: Vec<[Point2<f32>; 4]>, min_dist: f32) -> Vec<[Point2<f32>; 4]> {
    let mut keep = vec![true; quads.len()];
    for i in 0..quads.len() {
        for j in (i + 1)..quads.len() {
            if !keep[i] || !keep[j] {
                continue;
            }
            if corner_distance(&quads[i], &quads[j]) < min_dist {
                if perimeter(&quads[i]) >= perimeter(&quads[j]) {
                    keep[j] = false;
                } else {
                    keep[i] = false;
                }
            }
        }
    }
    quads
        .into_iter()
        .zip(keep)
        .filter_map(|(q, k)| k.then_some(q))
        .collect()
}
