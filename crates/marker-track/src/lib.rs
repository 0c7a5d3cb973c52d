//! Real-time ArUco marker detection with frame-to-frame corner tracking.
//!
//! Every frame runs two stages over one [`Registry`]:
//! 1. the detector stage appends a [`TrackedModule`] per detected marker,
//! 2. the tracker stage re-estimates every tracked corner with sub-pixel
//!    refinement plus pyramidal motion estimation and keeps a corner only if
//!    its response is strictly above the threshold (0.5 by default).
//!
//! Frame acquisition, detection, refinement, motion estimation and output
//! are traits ([`FrameSource`], [`MarkerDetector`], [`CornerRefiner`],
//! [`MotionEstimator`], [`FrameSink`]) with default implementations.
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_track::{DefaultPipeline, ImageSequenceSource, NullSink, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pipeline = DefaultPipeline::from_config(&PipelineConfig::default())?;
//! let mut source = ImageSequenceSource::new("frames/");
//! let summary = pipeline.run(&mut source, &mut NullSink, None)?;
//! println!("{} modules after {} frames", summary.modules, summary.frames_processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marker_track::core`: images, pyramids, sub-pixel refinement, Lucas–Kanade.
//! - `marker_track::aruco`: dictionaries, quad search, marker decoding.
//! - [`Pipeline`], [`DetectorStage`], [`ModuleTracker`]: the per-frame stages.
//! - [`annotate`]: pure rendering of a registry over a frame.

pub use marker_track_aruco as aruco;
pub use marker_track_core as core;

mod config;
mod detect;
mod dictionary;
mod error;
mod frame;
mod motion;
mod pipeline;
mod refine;
mod registry;
mod render;
mod sink;
mod source;
mod tracker;

pub use config::{ConfigError, DictionarySource, PipelineConfig, RegistryPolicy};
pub use detect::{ArucoMarkerDetector, Detection, DetectorStage, MarkerDetector};
pub use dictionary::MarkerDictionary;
pub use error::{CornerError, PipelineError};
pub use frame::{Frame, LumaFrame};
pub use motion::{MotionEstimate, MotionEstimator, PyramidalLk};
pub use pipeline::{DefaultPipeline, FrameReport, Pipeline, RunSummary, StopReason};
pub use refine::{CornerRefiner, SubPixRefiner};
pub use registry::{Ingest, ReconcilePolicy, Registry, TrackedModule};
pub use render::annotate;
pub use sink::{DirectorySink, FrameSink, NullSink, SinkError, SinkFlow};
pub use source::{FrameSource, ImageSequenceSource, InMemorySource, SourceError};
pub use tracker::{survives, GatePolicy, ModuleTracker, MotionSeed, TrackReport, TrackerParams};
