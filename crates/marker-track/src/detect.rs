//! Marker detection capability and the detector stage.

use marker_track_aruco::{ArucoDetector, ArucoParams};
use nalgebra::Point2;
use serde::Serialize;

use crate::{LumaFrame, MarkerDictionary, Registry, ReconcilePolicy};

/// One detected marker: its id and four corners in canonical order
/// (top-left, top-right, bottom-right, bottom-left of the marker itself).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub id: u32,
    pub corners: [Point2<f32>; 4],
}

/// Finds markers of a dictionary in one frame.
pub trait MarkerDetector {
    fn detect(&self, frame: &LumaFrame, dictionary: &MarkerDictionary) -> Vec<Detection>;
}

/// ArUco detection on the frame's luminance.
#[derive(Clone, Debug, Default)]
pub struct ArucoMarkerDetector {
    inner: ArucoDetector,
}

impl ArucoMarkerDetector {
    pub fn new(params: ArucoParams) -> Self {
        Self {
            inner: ArucoDetector::new(params),
        }
    }
}

impl MarkerDetector for ArucoMarkerDetector {
    fn detect(&self, frame: &LumaFrame, dictionary: &MarkerDictionary) -> Vec<Detection> {
        self.inner
            .detect(frame.gray(), dictionary.matcher())
            .into_iter()
            .map(|d| Detection {
                id: d.id,
                corners: d.corners,
            })
            .collect()
    }
}

/// Runs a detector and hands every detection to the registry.
#[derive(Clone, Debug)]
pub struct DetectorStage<D> {
    detector: D,
    reconcile: ReconcilePolicy,
}

impl<D: MarkerDetector> DetectorStage<D> {
    pub fn new(detector: D, reconcile: ReconcilePolicy) -> Self {
        Self {
            detector,
            reconcile,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Detect on `frame` and ingest; returns the number of detections.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(frame = frame.index()))
    )]
    pub fn run(
        &self,
        frame: &LumaFrame,
        dictionary: &MarkerDictionary,
        registry: &mut Registry,
    ) -> usize {
        let detections = self.detector.detect(frame, dictionary);
        for det in &detections {
            let outcome = registry.ingest(det, frame.index(), self.reconcile);
            log::debug!("frame {}: marker {} -> {:?}", frame.index(), det.id, outcome);
        }
        detections.len()
    }
}
