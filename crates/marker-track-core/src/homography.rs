//! Projective map from a canonical square onto an image quadrilateral.

use nalgebra::{Matrix3, Point2, Vector3};

/// Planar projective transform acting on homogeneous 2D points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Map from the canonical square `[0, side]²` (TL, TR, BR, BL) onto `quad`.
    ///
    /// Closed-form square-to-quad construction; returns `None` when the quad
    /// is collapsed or three of its corners are collinear.
    pub fn square_to_quad(side: f32, quad: &[Point2<f32>; 4]) -> Option<Self> {
        if !side.is_finite() || side <= 0.0 {
            return None;
        }
        let [p0, p1, p2, p3] = quad.map(|p| (p.x as f64, p.y as f64));

        let (dx1, dy1) = (p1.0 - p2.0, p1.1 - p2.1);
        let (dx2, dy2) = (p3.0 - p2.0, p3.1 - p2.1);
        let (sx, sy) = (p0.0 - p1.0 + p2.0 - p3.0, p0.1 - p1.1 + p2.1 - p3.1);

        let (g, h) = if sx.abs() < 1e-9 && sy.abs() < 1e-9 {
            (0.0, 0.0)
        } else {
            let den = dx1 * dy2 - dx2 * dy1;
            if den.abs() < 1e-12 {
                return None;
            }
            (
                (sx * dy2 - dx2 * sy) / den,
                (dx1 * sy - sx * dy1) / den,
            )
        };

        let unit = Matrix3::new(
            p1.0 - p0.0 + g * p1.0,
            p3.0 - p0.0 + h * p3.0,
            p0.0,
            p1.1 - p0.1 + g * p1.1,
            p3.1 - p0.1 + h * p3.1,
            p0.1,
            g,
            h,
            1.0,
        );
        if unit.determinant().abs() < 1e-12 {
            return None;
        }

        let s = 1.0 / side as f64;
        let scale = Matrix3::new(s, 0.0, 0.0, 0.0, s, 0.0, 0.0, 0.0, 1.0);
        Some(Self::new(unit * scale))
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }
}
