//! Full-frame ArUco detection: quad search followed by decoding.

use std::collections::HashMap;

use image::GrayImage;
use marker_track_core::GrayImageView;
use serde::{Deserialize, Serialize};

use crate::decode::{DecodeParams, MarkerDetection, SampleGrid};
use crate::quad::{find_quad_candidates, QuadParams};
use crate::Matcher;

/// Detector configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArucoParams {
    pub quads: QuadParams,
    pub decode: DecodeParams,
    /// If true, keep only the best detection per marker id.
    pub dedup_by_id: bool,
}

/// Stateless marker detector.
#[derive(Clone, Debug, Default)]
pub struct ArucoDetector {
    params: ArucoParams,
}

impl ArucoDetector {
    pub fn new(params: ArucoParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ArucoParams {
        &self.params
    }

    /// Detect all markers of `matcher`'s dictionary in `gray`.
    ///
    /// Detections come out in contour-scan order (top to bottom).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, gray, matcher), fields(w = gray.width(), h = gray.height()))
    )]
    pub fn detect(&self, gray: &GrayImage, matcher: &Matcher) -> Vec<MarkerDetection> {
        let Some(grid) = SampleGrid::new(&self.params.decode, matcher.dictionary().marker_size)
        else {
            log::warn!(
                "marker size {} cannot be sampled",
                matcher.dictionary().marker_size
            );
            return Vec::new();
        };

        let view = GrayImageView {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.as_raw(),
        };

        let quads = find_quad_candidates(gray, &self.params.quads);
        let mut out: Vec<MarkerDetection> = quads
            .iter()
            .filter_map(|quad| grid.decode(&view, quad, &self.params.decode, matcher))
            .collect();
        log::debug!("decoded {} of {} quads", out.len(), quads.len());

        if self.params.dedup_by_id {
            out = dedup_by_id_keep_best(out);
        }
        out
    }
}

/// Keep the highest-scoring detection of every id, preserving first-seen order.
fn dedup_by_id_keep_best(dets: Vec<MarkerDetection>) -> Vec<MarkerDetection> {
    let mut best: HashMap<u32, usize> = HashMap::new();
    for (i, d) in dets.iter().enumerate() {
        best.entry(d.id)
            .and_modify(|j| {
                if d.score > dets[*j].score {
                    *j = i;
                }
            })
            .or_insert(i);
    }
    dets.into_iter()
        .enumerate()
        .filter(|(i, d)| best.get(&d.id) == Some(i))
        .map(|(_, d)| d)
        .collect()
}
