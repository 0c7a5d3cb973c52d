mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn missing_frame_directory_fails() {
    let dir = tempdir().expect("tempdir");
    Command::cargo_bin("marker-track")
        .expect("binary")
        .arg("--frames")
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("frame source unavailable"));
}

#[test]
fn unknown_dictionary_fails() {
    let dir = tempdir().expect("tempdir");
    Command::cargo_bin("marker-track")
        .expect("binary")
        .arg("--frames")
        .arg(dir.path())
        .args(["--dictionary", "DICT_NOPE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown built-in dictionary"));
}

#[test]
fn tracks_sequence_and_writes_outputs() {
    let dir = tempdir().expect("tempdir");
    let frames = dir.path().join("frames");
    std::fs::create_dir_all(&frames).expect("frames dir");
    for k in 0..3u32 {
        common::render_marker_frame(160, 140, 42, 40 + k, 30 + k)
            .save(frames.join(format!("f{k:03}.png")))
            .expect("save frame");
    }
    let out = dir.path().join("annotated");
    let report = dir.path().join("report.json");

    Command::cargo_bin("marker-track")
        .expect("binary")
        .arg("--frames")
        .arg(&frames)
        .arg("--output")
        .arg(&out)
        .arg("--report")
        .arg(&report)
        .args(["--max-frames", "2", "--reconcile", "by-id", "--log-level", "warn"])
        .assert()
        .success();

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(summary["frames_processed"], 2);
    assert_eq!(summary["modules"], 1);
    assert_eq!(summary["stop_reason"], "frame_limit");
    assert!(out.join("frame_000000.png").is_file());
    assert!(out.join("frame_000001.png").is_file());
    assert!(!out.join("frame_000002.png").exists());
}

#[test]
fn summary_goes_to_stdout_without_report() {
    let dir = tempdir().expect("tempdir");
    common::render_marker_frame(160, 140, 5, 40, 30)
        .save(dir.path().join("only.png"))
        .expect("save frame");

    Command::cargo_bin("marker-track")
        .expect("binary")
        .arg("--frames")
        .arg(dir.path())
        .args(["--threshold", "0.6", "--gating", "per-marker", "--seed", "unit-offset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stop_reason\": \"end_of_stream\""));
}
