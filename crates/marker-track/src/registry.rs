//! Tracked modules and the registry that owns them.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Detection;

/// A tracked marker: corners with the marker id each one belongs to.
///
/// `id_list` and `corners` always have the same length; they are only ever
/// replaced together.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedModule {
    id_list: Vec<u32>,
    corners: Vec<Point2<f32>>,
    last_frame: u64,
}

impl TrackedModule {
    /// Seed a module from one detection: four corners, all carrying the
    /// detection's id, in canonical marker order.
    pub fn from_detection(detection: &Detection, frame_index: u64) -> Self {
        Self {
            id_list: vec![detection.id; 4],
            corners: detection.corners.to_vec(),
            last_frame: frame_index,
        }
    }

    /// Build a module from `(id, corner)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, Point2<f32>)>, frame_index: u64) -> Self {
        let (id_list, corners) = pairs.into_iter().unzip();
        Self {
            id_list,
            corners,
            last_frame: frame_index,
        }
    }

    #[inline]
    pub fn id_list(&self) -> &[u32] {
        &self.id_list
    }

    #[inline]
    pub fn corners(&self) -> &[Point2<f32>] {
        &self.corners
    }

    /// Frame whose coordinates `corners` are expressed in.
    #[inline]
    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    /// Number of tracked corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Distinct marker ids in first-seen order.
    pub fn marker_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = Vec::new();
        for &id in &self.id_list {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// `(id, corner)` pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, Point2<f32>)> + '_ {
        self.id_list.iter().copied().zip(self.corners.iter().copied())
    }

    /// Maximal runs of consecutive corners sharing one id.
    pub fn id_runs(&self) -> Vec<(u32, &[Point2<f32>])> {
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=self.id_list.len() {
            if i == self.id_list.len() || self.id_list[i] != self.id_list[start] {
                runs.push((self.id_list[start], &self.corners[start..i]));
                start = i;
            }
        }
        runs
    }

    /// Swap in new parallel lists, now expressed in `frame_index`.
    pub(crate) fn replace(&mut self, pairs: Vec<(u32, Point2<f32>)>, frame_index: u64) {
        (self.id_list, self.corners) = pairs.into_iter().unzip();
        self.last_frame = frame_index;
    }
}

/// How the detector stage merges a detection into the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReconcilePolicy {
    /// Every detection becomes a new module.
    #[default]
    Append,
    /// A detection refreshes the first module already tracking its id;
    /// unmatched detections are appended.
    ById,
}

/// What happened to one ingested detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ingest {
    Appended(usize),
    Refreshed(usize),
}

/// Ordered collection of tracked modules.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Registry {
    modules: Vec<TrackedModule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[inline]
    pub fn modules(&self) -> &[TrackedModule] {
        &self.modules
    }

    pub fn get(&self, idx: usize) -> Option<&TrackedModule> {
        self.modules.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedModule> {
        self.modules.iter()
    }

    pub(crate) fn modules_mut(&mut self) -> &mut [TrackedModule] {
        &mut self.modules
    }

    /// Corners summed over all modules.
    pub fn live_corners(&self) -> usize {
        self.modules.iter().map(TrackedModule::len).sum()
    }

    pub fn push(&mut self, module: TrackedModule) -> usize {
        self.modules.push(module);
        self.modules.len() - 1
    }

    /// Merge one detection seen on `frame_index`.
    pub fn ingest(
        &mut self,
        detection: &Detection,
        frame_index: u64,
        policy: ReconcilePolicy,
    ) -> Ingest {
        let fresh = TrackedModule::from_detection(detection, frame_index);
        if policy == ReconcilePolicy::ById {
            if let Some(idx) = self
                .modules
                .iter()
                .position(|m| m.id_list.contains(&detection.id))
            {
                self.modules[idx] = fresh;
                return Ingest::Refreshed(idx);
            }
        }
        Ingest::Appended(self.push(fresh))
    }

    /// Remove modules with no corners left; returns how many were removed.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.modules.len();
        self.modules.retain(|m| !m.is_empty());
        before - self.modules.len()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a TrackedModule;
    type IntoIter = std::slice::Iter<'a, TrackedModule>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(id: u32, x0: f32) -> Detection {
        Detection {
            id,
            corners: [
                Point2::new(x0, 0.0),
                Point2::new(x0 + 10.0, 0.0),
                Point2::new(x0 + 10.0, 10.0),
                Point2::new(x0, 10.0),
            ],
        }
    }

    #[test]
    fn detection_seeds_one_id_per_corner() {
        let m = TrackedModule::from_detection(&detection(7, 5.0), 2);
        assert_eq!(m.id_list(), &[7, 7, 7, 7]);
        assert_eq!(m.corners()[1], Point2::new(15.0, 0.0));
        assert_eq!(m.marker_ids(), vec![7]);
        assert_eq!(m.last_frame(), 2);
    }

    #[test]
    fn append_policy_never_deduplicates() {
        let mut reg = Registry::new();
        let det = detection(3, 0.0);
        assert_eq!(reg.ingest(&det, 0, ReconcilePolicy::Append), Ingest::Appended(0));
        assert_eq!(reg.ingest(&det, 0, ReconcilePolicy::Append), Ingest::Appended(1));
        assert_eq!(reg.modules()[0], reg.modules()[1]);
    }

    #[test]
    fn by_id_policy_refreshes_matching_module() {
        let mut reg = Registry::new();
        reg.ingest(&detection(3, 0.0), 0, ReconcilePolicy::ById);
        reg.ingest(&detection(4, 50.0), 0, ReconcilePolicy::ById);
        let outcome = reg.ingest(&detection(3, 20.0), 1, ReconcilePolicy::ById);
        assert_eq!(outcome, Ingest::Refreshed(0));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.modules()[0].corners()[0], Point2::new(20.0, 0.0));
        assert_eq!(reg.modules()[0].last_frame(), 1);
    }

    #[test]
    fn prune_removes_only_empty_modules() {
        let mut reg = Registry::new();
        reg.push(TrackedModule::from_detection(&detection(1, 0.0), 0));
        reg.push(TrackedModule::from_pairs(Vec::new(), 0));
        assert_eq!(reg.prune_empty(), 1);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.live_corners(), 4);
    }

    #[test]
    fn id_runs_split_on_id_changes() {
        let m = TrackedModule::from_pairs(
            [
                (1, Point2::new(0.0, 0.0)),
                (1, Point2::new(1.0, 0.0)),
                (2, Point2::new(2.0, 0.0)),
                (1, Point2::new(3.0, 0.0)),
            ],
            0,
        );
        let runs: Vec<(u32, usize)> = m.id_runs().iter().map(|(id, c)| (*id, c.len())).collect();
        assert_eq!(runs, vec![(1, 2), (2, 1), (1, 1)]);
        assert_eq!(m.marker_ids(), vec![1, 2]);
    }
}
