use marker_track_core::{FlowError, SubPixError};

use crate::{ConfigError, SinkError, SourceError};

/// Why a single tracked corner could not be re-estimated.
///
/// These never leave the tracker stage: the corner is dropped instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CornerError {
    #[error("sub-pixel refinement failed: {0}")]
    Refinement(#[from] SubPixError),
    #[error("motion estimation failed: {0}")]
    Motion(#[from] FlowError),
}

/// Errors that end a pipeline run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
