//! The module tracker stage: per-corner refinement, motion estimation and
//! the survival gate.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{CornerError, CornerRefiner, LumaFrame, MotionEstimator, Registry, TrackedModule};

/// Initial guess handed to the motion estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MotionSeed {
    /// The corner shifted by one pixel on both axes.
    UnitOffset,
    /// The corner's previous position.
    #[default]
    LastPosition,
}

impl MotionSeed {
    pub fn seed(self, corner: Point2<f32>) -> Point2<f32> {
        match self {
            Self::UnitOffset => corner + Vector2::new(1.0, 1.0),
            Self::LastPosition => corner,
        }
    }
}

/// Granularity of the survival gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum GatePolicy {
    /// Each corner survives on its own response.
    #[default]
    PerCorner,
    /// A run of corners sharing one id survives or drops as a whole.
    PerMarker,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// A corner survives iff its response is strictly greater than this.
    pub threshold: f32,
    pub seed: MotionSeed,
    pub gating: GatePolicy,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            seed: MotionSeed::default(),
            gating: GatePolicy::default(),
        }
    }
}

/// The survival gate.
#[inline]
pub fn survives(response: f32, threshold: f32) -> bool {
    response > threshold
}

/// Per-frame tracker statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrackReport {
    pub modules: usize,
    pub corners_in: usize,
    pub corners_kept: usize,
    /// Corners lost to refinement or motion-estimation errors.
    pub failures: usize,
}

/// One corner after re-estimation, or the reason it was lost.
type CornerOutcome = Result<(Point2<f32>, f32), CornerError>;

/// Updates every tracked module against the current frame.
#[derive(Clone, Debug)]
pub struct ModuleTracker<R, M> {
    refiner: R,
    estimator: M,
    params: TrackerParams,
}

impl<R: CornerRefiner, M: MotionEstimator> ModuleTracker<R, M> {
    pub fn new(refiner: R, estimator: M, params: TrackerParams) -> Self {
        Self {
            refiner,
            estimator,
            params,
        }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Re-estimate all corners in `registry` on `current`.
    ///
    /// Modules whose corners were produced on `current` use it as their
    /// reference; all others use `previous` (or `current` when there is none).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(frame = current.index(), modules = registry.len()))
    )]
    pub fn update(
        &self,
        registry: &mut Registry,
        previous: Option<&LumaFrame>,
        current: &LumaFrame,
    ) -> TrackReport {
        let mut report = TrackReport {
            modules: registry.len(),
            ..TrackReport::default()
        };

        for module in registry.modules_mut() {
            let reference = match previous {
                Some(prev) if module.last_frame() != current.index() => prev,
                _ => current,
            };

            let outcomes: Vec<CornerOutcome> = module
                .corners()
                .iter()
                .map(|&c| self.track_corner(reference, current, c))
                .collect();

            report.corners_in += outcomes.len();
            report.failures += outcomes.iter().filter(|o| o.is_err()).count();

            let kept = self.gate(module, &outcomes);
            report.corners_kept += kept.len();
            module.replace(kept, current.index());
        }

        log::debug!(
            "frame {}: kept {}/{} corners in {} modules ({} failures)",
            current.index(),
            report.corners_kept,
            report.corners_in,
            report.modules,
            report.failures
        );
        report
    }

    fn track_corner(
        &self,
        reference: &LumaFrame,
        current: &LumaFrame,
        corner: Point2<f32>,
    ) -> CornerOutcome {
        let seed = self.params.seed.seed(corner);
        let from = self.refiner.refine(reference, corner)?;
        let guess = self.refiner.refine(current, seed)?;
        let est = self.estimator.estimate(reference, current, from, guess)?;
        Ok((est.point, est.response))
    }

    fn gate(&self, module: &TrackedModule, outcomes: &[CornerOutcome]) -> Vec<(u32, Point2<f32>)> {
        let threshold = self.params.threshold;
        let ids = module.id_list();

        for (idx, outcome) in outcomes.iter().enumerate() {
            if let Err(err) = outcome {
                log::debug!(
                    "dropping corner {idx} of marker {}: {err}",
                    ids[idx]
                );
            }
        }

        match self.params.gating {
            GatePolicy::PerCorner => ids
                .iter()
                .zip(outcomes)
                .filter_map(|(&id, outcome)| match outcome {
                    Ok((p, r)) if survives(*r, threshold) => Some((id, *p)),
                    _ => None,
                })
                .collect(),
            GatePolicy::PerMarker => {
                let mut kept = Vec::with_capacity(ids.len());
                let mut start = 0;
                while start < ids.len() {
                    let end = ids[start..]
                        .iter()
                        .position(|&id| id != ids[start])
                        .map_or(ids.len(), |n| start + n);
                    let run = &outcomes[start..end];
                    let estimated: Option<Vec<(Point2<f32>, f32)>> =
                        run.iter().map(|o| o.as_ref().ok().copied()).collect();
                    if let Some(points) = estimated {
                        let mean = points.iter().map(|(_, r)| r).sum::<f32>() / points.len() as f32;
                        if survives(mean, threshold) {
                            kept.extend(points.into_iter().map(|(p, _)| (ids[start], p)));
                        }
                    }
                    start = end;
                }
                kept
            }
        }
    }
}
