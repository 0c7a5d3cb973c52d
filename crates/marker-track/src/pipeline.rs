//! The frame loop: detector stage, tracker stage, pruning and rendering.

use serde::Serialize;

use crate::{
    annotate, ArucoMarkerDetector, ConfigError, CornerRefiner, DetectorStage, Frame, FrameSink,
    FrameSource, LumaFrame, MarkerDetector, MarkerDictionary, ModuleTracker, MotionEstimator,
    PipelineConfig, PipelineError, PyramidalLk, Registry, RegistryPolicy, SinkFlow,
    SubPixRefiner, TrackReport,
};

/// Why [`Pipeline::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The source ran dry or produced an empty frame.
    EndOfStream,
    /// The sink asked to stop.
    SinkRequested,
    /// The configured frame limit was reached.
    FrameLimit,
}

/// What one call to [`Pipeline::process_frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub detections: usize,
    pub tracking: TrackReport,
    pub pruned: usize,
    pub modules: usize,
    pub live_corners: usize,
}

/// Outcome of a full run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub dictionary: String,
    pub frames_processed: u64,
    pub detections: usize,
    pub modules: usize,
    pub live_corners: usize,
    pub stop_reason: StopReason,
}

/// Owns the registry and runs both stages once per frame.
pub struct Pipeline<D, R, M> {
    dictionary: MarkerDictionary,
    detector: DetectorStage<D>,
    tracker: ModuleTracker<R, M>,
    policy: RegistryPolicy,
    registry: Registry,
    previous: Option<LumaFrame>,
}

/// Pipeline with the built-in capabilities.
pub type DefaultPipeline = Pipeline<ArucoMarkerDetector, SubPixRefiner, PyramidalLk>;

impl DefaultPipeline {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let dictionary = config.load_dictionary()?;
        Ok(Pipeline::new(
            dictionary,
            ArucoMarkerDetector::new(config.aruco.clone()),
            ModuleTracker::new(
                SubPixRefiner::new(config.subpix),
                PyramidalLk::new(config.flow),
                config.tracker.clone(),
            ),
            config.registry,
        ))
    }
}

impl<D, R, M> Pipeline<D, R, M>
where
    D: MarkerDetector,
    R: CornerRefiner,
    M: MotionEstimator,
{
    pub fn new(
        dictionary: MarkerDictionary,
        detector: D,
        tracker: ModuleTracker<R, M>,
        policy: RegistryPolicy,
    ) -> Self {
        Self {
            dictionary,
            detector: DetectorStage::new(detector, policy.reconcile),
            tracker,
            policy,
            registry: Registry::new(),
            previous: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dictionary(&self) -> &MarkerDictionary {
        &self.dictionary
    }

    /// Detector stage, tracker stage and optional pruning for one frame.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(frame = frame.index()))
    )]
    pub fn process_frame(&mut self, frame: &Frame) -> FrameReport {
        let luma = LumaFrame::from_frame(frame);

        let detections = self
            .detector
            .run(&luma, &self.dictionary, &mut self.registry);
        let tracking = self
            .tracker
            .update(&mut self.registry, self.previous.as_ref(), &luma);
        let pruned = if self.policy.prune_empty {
            self.registry.prune_empty()
        } else {
            0
        };
        self.previous = Some(luma);

        let report = FrameReport {
            frame: frame.index(),
            detections,
            tracking,
            pruned,
            modules: self.registry.len(),
            live_corners: self.registry.live_corners(),
        };
        log::info!(
            "frame {}: {} detections, {} modules, {} live corners",
            report.frame,
            report.detections,
            report.modules,
            report.live_corners
        );
        report
    }

    /// Drive the loop until end of stream, a sink stop or `max_frames`.
    ///
    /// Opens the source if needed; an unavailable source is the only
    /// source error that can happen before any frame is processed.
    pub fn run<S, K>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        max_frames: Option<u64>,
    ) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        if !source.is_open() {
            source.open()?;
        }

        let mut frames = 0u64;
        let mut detections = 0usize;
        let stop_reason = loop {
            if max_frames.is_some_and(|limit| frames >= limit) {
                break StopReason::FrameLimit;
            }
            let frame = match source.read()? {
                Some(frame) if !frame.is_empty() => frame,
                _ => break StopReason::EndOfStream,
            };

            detections += self.process_frame(&frame).detections;
            frames += 1;

            let annotated = annotate(&frame, &self.registry);
            if sink.consume(frame.index(), &annotated)? == SinkFlow::Stop {
                break StopReason::SinkRequested;
            }
        };

        let summary = RunSummary {
            dictionary: self.dictionary.name().to_string(),
            frames_processed: frames,
            detections,
            modules: self.registry.len(),
            live_corners: self.registry.live_corners(),
            stop_reason,
        };
        log::info!("run finished: {summary:?}");
        Ok(summary)
    }
}
