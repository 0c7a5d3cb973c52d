mod common;

use common::{marker_corners, render_marker_frame};
use image::{Rgb, RgbImage};
use marker_track::{
    DefaultPipeline, Frame, InMemorySource, NullSink, PipelineConfig, ReconcilePolicy, StopReason,
};

const W: u32 = 200;
const H: u32 = 200;

fn moving_marker(frames: u64) -> Vec<Frame> {
    (0..frames)
        .map(|k| {
            let (x0, y0) = (60 + 2 * k as u32, 50 + k as u32);
            Frame::new(k, render_marker_frame(W, H, 7, x0, y0))
        })
        .collect()
}

fn assert_near(got: nalgebra::Point2<f32>, want: (f32, f32)) {
    assert!(
        (got.x - want.0).abs() < 0.35 && (got.y - want.1).abs() < 0.35,
        "got ({:.3}, {:.3}), want ({:.3}, {:.3})",
        got.x,
        got.y,
        want.0,
        want.1
    );
}

#[test]
fn first_module_follows_a_moving_marker() {
    let mut pipeline = DefaultPipeline::from_config(&PipelineConfig::default()).expect("pipeline");
    let mut source = InMemorySource::new(moving_marker(5));

    let summary = pipeline
        .run(&mut source, &mut NullSink, None)
        .expect("run");
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.frames_processed, 5);
    assert_eq!(summary.detections, 5);

    // Append policy: one new module per detection, none removed.
    let reg = pipeline.registry();
    assert_eq!(reg.len(), 5);
    for m in reg {
        assert_eq!(m.id_list(), &[7, 7, 7, 7]);
        assert_eq!(m.last_frame(), 4);
    }

    let expected = marker_corners(60 + 8, 50 + 4);
    for (corner, want) in reg.modules()[0].corners().iter().zip(expected) {
        assert_near(*corner, want);
    }
}

#[test]
fn by_id_policy_tracks_one_module() {
    let mut cfg = PipelineConfig::default();
    cfg.registry.reconcile = ReconcilePolicy::ById;
    let mut pipeline = DefaultPipeline::from_config(&cfg).expect("pipeline");
    let mut source = InMemorySource::new(moving_marker(3));

    pipeline
        .run(&mut source, &mut NullSink, None)
        .expect("run");
    let reg = pipeline.registry();
    assert_eq!(reg.len(), 1);
    for (corner, want) in reg.modules()[0].corners().iter().zip(marker_corners(64, 52)) {
        assert_near(*corner, want);
    }
}

#[test]
fn vanished_marker_empties_modules() {
    let mut frames = moving_marker(2);
    frames.push(Frame::new(2, RgbImage::from_pixel(W, H, Rgb([255, 255, 255]))));

    let mut pipeline = DefaultPipeline::from_config(&PipelineConfig::default()).expect("pipeline");
    let mut source = InMemorySource::new(frames);
    let summary = pipeline
        .run(&mut source, &mut NullSink, None)
        .expect("run");

    assert_eq!(summary.modules, 2);
    assert_eq!(summary.live_corners, 0);
    assert!(pipeline.registry().iter().all(|m| m.id_list().is_empty()));
}

#[test]
fn first_frame_detection_refines_onto_pixel_edges() {
    let mut pipeline = DefaultPipeline::from_config(&PipelineConfig::default()).expect("pipeline");
    let report = pipeline.process_frame(&Frame::new(0, render_marker_frame(W, H, 123, 40, 70)));

    assert_eq!(report.detections, 1);
    assert_eq!(report.tracking.corners_kept, 4);
    let m = &pipeline.registry().modules()[0];
    assert_eq!(m.marker_ids(), vec![123]);
    for (corner, want) in m.corners().iter().zip(marker_corners(40, 70)) {
        assert_near(*corner, want);
    }
}
