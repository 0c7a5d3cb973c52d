use serde::{Deserialize, Serialize};

/// Stopping rule for iterative solvers: whichever of the two fires first.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermCriteria {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop once the update moves the estimate by less than this (pixels).
    pub epsilon: f32,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iter: 30,
            epsilon: 0.01,
        }
    }
}

impl TermCriteria {
    #[inline]
    pub(crate) fn converged(&self, dx: f32, dy: f32) -> bool {
        dx * dx + dy * dy <= self.epsilon * self.epsilon
    }
}
