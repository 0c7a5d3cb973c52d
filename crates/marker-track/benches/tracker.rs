use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use image::{Rgb, RgbImage};
use marker_track::aruco::builtins;
use marker_track::{
    DefaultPipeline, Frame, LumaFrame, ModuleTracker, PipelineConfig, PyramidalLk, Registry,
    SubPixRefiner, TrackedModule,
};
use nalgebra::Point2;

const CELL: u32 = 12;
const CELLS: u32 = 7;

/// 640x480 frame with a 3x2 grid of markers, shifted by `(dx, dy)`.
fn render_scene(dx: u32, dy: u32) -> RgbImage {
    let dict = builtins::aruco_original();
    let bits = dict.marker_size as u32;
    let side = CELLS * CELL;
    let origins: Vec<(u32, u32, u64)> = (0..6u32)
        .map(|k| {
            let x0 = 60 + (k % 3) * 180 + dx;
            let y0 = 80 + (k / 3) * 180 + dy;
            (x0, y0, dict.codes[(k * 101) as usize])
        })
        .collect();

    RgbImage::from_fn(640, 480, |x, y| {
        for &(x0, y0, code) in &origins {
            if x < x0 || y < y0 || x >= x0 + side || y >= y0 + side {
                continue;
            }
            let cx = (x - x0) / CELL;
            let cy = (y - y0) / CELL;
            let border = cx == 0 || cy == 0 || cx + 1 == CELLS || cy + 1 == CELLS;
            let black = border || (code >> ((cy - 1) * bits + (cx - 1))) & 1 == 1;
            return if black { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) };
        }
        Rgb([255, 255, 255])
    })
}

fn bench_process_frame(c: &mut Criterion) {
    let frames: Vec<Frame> = (0..4u32)
        .map(|k| Frame::new(k as u64, render_scene(2 * k, k)))
        .collect();
    let cfg = PipelineConfig::default();

    c.bench_function("process_frame_4x640x480", |b| {
        b.iter_batched(
            || DefaultPipeline::from_config(&cfg).expect("default config"),
            |mut pipeline| {
                for frame in &frames {
                    black_box(pipeline.process_frame(frame));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_tracker_update(c: &mut Criterion) {
    let prev = LumaFrame::from_frame(&Frame::new(0, render_scene(0, 0)));
    let cur = LumaFrame::from_frame(&Frame::new(1, render_scene(2, 1)));
    let cfg = PipelineConfig::default();
    let tracker = ModuleTracker::new(
        SubPixRefiner::new(cfg.subpix),
        PyramidalLk::new(cfg.flow),
        cfg.tracker.clone(),
    );

    let side = (CELLS * CELL) as f32;
    let mut seed = Registry::new();
    for k in 0..6u32 {
        let x0 = (60 + (k % 3) * 180) as f32 - 0.5;
        let y0 = (80 + (k / 3) * 180) as f32 - 0.5;
        let corners = [
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ];
        seed.push(TrackedModule::from_pairs(
            corners.into_iter().map(|p| (k * 101, p)),
            0,
        ));
    }

    c.bench_function("tracker_update_24_corners", |b| {
        b.iter_batched(
            || seed.clone(),
            |mut registry| black_box(tracker.update(&mut registry, Some(&prev), &cur)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_process_frame, bench_tracker_update);
criterion_main!(benches);
