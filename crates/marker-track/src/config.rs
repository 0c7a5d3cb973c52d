//! Pipeline configuration, loaded from JSON.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```json
//! {
//!   "dictionary": { "builtin": "ARUCO_ORIGINAL" },
//!   "tracker": { "threshold": 0.6, "gating": "per_marker" },
//!   "registry": { "prune_empty": true }
//! }
//! ```

use std::path::{Path, PathBuf};

use marker_track_aruco::{builtins, ArucoParams, DictionaryError};
use marker_track_core::{FlowParams, SubPixParams};
use serde::{Deserialize, Serialize};

use crate::{MarkerDictionary, ReconcilePolicy, TrackerParams};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// Where the marker dictionary comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionarySource {
    Builtin(String),
    File(PathBuf),
}

impl Default for DictionarySource {
    fn default() -> Self {
        Self::Builtin(builtins::ARUCO_ORIGINAL.to_string())
    }
}

/// Registry maintenance policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryPolicy {
    pub reconcile: ReconcilePolicy,
    /// Remove modules that lost all their corners after each frame.
    pub prune_empty: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub dictionary: DictionarySource,
    /// Bit errors tolerated when matching codes (capped by the dictionary).
    pub max_hamming: u8,
    pub aruco: ArucoParams,
    pub subpix: SubPixParams,
    pub flow: FlowParams,
    pub tracker: TrackerParams,
    pub registry: RegistryPolicy,
}

impl PipelineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the dictionary this config points at.
    pub fn load_dictionary(&self) -> Result<MarkerDictionary, ConfigError> {
        let dict = match &self.dictionary {
            DictionarySource::Builtin(name) => MarkerDictionary::builtin(name, self.max_hamming)?,
            DictionarySource::File(path) => {
                MarkerDictionary::from_json_file(path, self.max_hamming)?
            }
        };
        Ok(dict)
    }

    /// Use one window size for both corner refinement and motion estimation.
    pub fn set_window(&mut self, window: usize) {
        self.subpix.window = window;
        self.flow.window = window;
    }

    pub fn set_max_iter(&mut self, max_iter: usize) {
        self.subpix.criteria.max_iter = max_iter;
        self.flow.criteria.max_iter = max_iter;
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.subpix.criteria.epsilon = epsilon;
        self.flow.criteria.epsilon = epsilon;
    }
}
