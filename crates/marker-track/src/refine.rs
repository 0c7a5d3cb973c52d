//! Sub-pixel corner refinement capability.

use marker_track_core::{refine_corner_subpix, SubPixParams};
use nalgebra::Point2;

use crate::{CornerError, LumaFrame};

/// Moves a corner estimate onto the nearest corner in `frame`.
pub trait CornerRefiner {
    fn refine(&self, frame: &LumaFrame, point: Point2<f32>) -> Result<Point2<f32>, CornerError>;
}

/// Gradient-orthogonality corner search.
#[derive(Clone, Debug, Default)]
pub struct SubPixRefiner {
    params: SubPixParams,
}

impl SubPixRefiner {
    pub fn new(params: SubPixParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SubPixParams {
        &self.params
    }
}

impl CornerRefiner for SubPixRefiner {
    fn refine(&self, frame: &LumaFrame, point: Point2<f32>) -> Result<Point2<f32>, CornerError> {
        Ok(refine_corner_subpix(&frame.view(), point, &self.params)?)
    }
}
