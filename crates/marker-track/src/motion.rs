//! Single-point motion estimation capability.

use marker_track_core::{track_point, FlowParams};
use nalgebra::Point2;
use serde::Serialize;

use crate::{CornerError, LumaFrame};

/// Where a point moved to and how confident the estimator is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MotionEstimate {
    pub point: Point2<f32>,
    /// Confidence in `[0, 1]`; compared against the survival threshold.
    pub response: f32,
}

/// Tracks one point from a reference frame into the current frame.
pub trait MotionEstimator {
    fn estimate(
        &self,
        reference: &LumaFrame,
        current: &LumaFrame,
        point: Point2<f32>,
        guess: Point2<f32>,
    ) -> Result<MotionEstimate, CornerError>;
}

/// Pyramidal Lucas–Kanade with a normalized cross-correlation response.
#[derive(Clone, Debug, Default)]
pub struct PyramidalLk {
    params: FlowParams,
}

impl PyramidalLk {
    pub fn new(params: FlowParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FlowParams {
        &self.params
    }
}

impl MotionEstimator for PyramidalLk {
    fn estimate(
        &self,
        reference: &LumaFrame,
        current: &LumaFrame,
        point: Point2<f32>,
        guess: Point2<f32>,
    ) -> Result<MotionEstimate, CornerError> {
        let levels = self.params.pyramid_levels;
        let min_side = self.params.window;
        let est = track_point(
            reference.pyramid(levels, min_side),
            current.pyramid(levels, min_side),
            point,
            guess,
            &self.params,
        )?;
        log::trace!(
            "lk ({:.2}, {:.2}) -> ({:.2}, {:.2}) response {:.3} residual {:.2}",
            point.x,
            point.y,
            est.point.x,
            est.point.y,
            est.response,
            est.residual
        );
        Ok(MotionEstimate {
            point: est.point,
            response: est.response,
        })
    }
}
