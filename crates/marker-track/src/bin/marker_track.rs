use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use marker_track::{
    DefaultPipeline, DictionarySource, DirectorySink, FrameSink, GatePolicy, ImageSequenceSource,
    MotionSeed, NullSink, PipelineConfig, ReconcilePolicy,
};

/// Detect ArUco markers in an image sequence and track their corners frame to frame.
#[derive(Debug, Parser)]
#[command(name = "marker-track", version, about)]
struct Cli {
    /// Directory of frame images (png/jpg/bmp), processed in file-name order.
    #[arg(long)]
    frames: PathBuf,
    /// JSON pipeline config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write annotated frames into this directory.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write the run summary as JSON here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,
    #[arg(long)]
    max_frames: Option<u64>,
    /// Survival threshold on the motion response (strict).
    #[arg(long)]
    threshold: Option<f32>,
    /// Window side for refinement and motion estimation.
    #[arg(long)]
    window: Option<usize>,
    #[arg(long)]
    pyramid_levels: Option<usize>,
    #[arg(long)]
    max_iter: Option<usize>,
    #[arg(long)]
    epsilon: Option<f32>,
    /// Built-in dictionary name.
    #[arg(long, conflicts_with = "dictionary_file")]
    dictionary: Option<String>,
    /// Dictionary JSON file.
    #[arg(long)]
    dictionary_file: Option<PathBuf>,
    #[arg(long, value_enum)]
    seed: Option<MotionSeed>,
    #[arg(long, value_enum)]
    gating: Option<GatePolicy>,
    #[arg(long, value_enum)]
    reconcile: Option<ReconcilePolicy>,
    /// Drop modules that lost all corners.
    #[arg(long)]
    prune_empty: bool,
    /// off, error, warn, info, debug or trace.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Emit JSON logs (requires the `tracing` feature).
    #[arg(long)]
    json_log: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(t) = self.threshold {
            cfg.tracker.threshold = t;
        }
        if let Some(w) = self.window {
            cfg.set_window(w);
        }
        if let Some(levels) = self.pyramid_levels {
            cfg.flow.pyramid_levels = levels;
        }
        if let Some(n) = self.max_iter {
            cfg.set_max_iter(n);
        }
        if let Some(eps) = self.epsilon {
            cfg.set_epsilon(eps);
        }
        if let Some(name) = &self.dictionary {
            cfg.dictionary = DictionarySource::Builtin(name.clone());
        }
        if let Some(path) = &self.dictionary_file {
            cfg.dictionary = DictionarySource::File(path.clone());
        }
        if let Some(seed) = self.seed {
            cfg.tracker.seed = seed;
        }
        if let Some(gating) = self.gating {
            cfg.tracker.gating = gating;
        }
        if let Some(reconcile) = self.reconcile {
            cfg.registry.reconcile = reconcile;
        }
        if self.prune_empty {
            cfg.registry.prune_empty = true;
        }
        Ok(cfg)
    }
}

fn init_logging(cli: &Cli) {
    #[cfg(feature = "tracing")]
    {
        // The subscriber also bridges `log` records at the filter's level.
        marker_track::core::init_tracing(cli.json_log, &cli.log_level);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if cli.json_log {
            eprintln!("--json-log needs the `tracing` feature; using plain logs");
        }
        let _ = marker_track::core::init_with_level(marker_track::core::parse_level(&cli.log_level));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = cli.pipeline_config()?;
    log::debug!("config: {}", cfg.to_json_pretty()?);

    let mut pipeline = DefaultPipeline::from_config(&cfg)?;
    let mut source = ImageSequenceSource::new(&cli.frames);
    let mut sink: Box<dyn FrameSink> = match &cli.output {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => Box::new(NullSink),
    };

    let summary = pipeline.run(&mut source, sink.as_mut(), cli.max_frames)?;
    let json = serde_json::to_string_pretty(&summary)?;
    match &cli.report {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
