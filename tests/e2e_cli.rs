//! CLI end-to-end tests
//!
//! Tests for the segwatch command-line interface. Tests that need a working
//! ffmpeg return early when it is not installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the segwatch binary
#[allow(deprecated)]
fn segwatch_cmd() -> Command {
    Command::cargo_bin("segwatch").unwrap()
}

fn tools_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

/// Render a short synthetic clip; `false` if this ffmpeg build can't.
fn make_clip(path: &Path, secs: u32) -> bool {
    Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error"])
        .args(["-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={secs}:size=160x120:rate=25"))
        .args(["-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=440:duration={secs}"))
        .args(["-c:v", "libx264", "-c:a", "aac", "-shortest"])
        .arg(path)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = segwatch_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("segwatch"))
        .stdout(predicate::str::contains("--duration"))
        .stdout(predicate::str::contains("--watch"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = segwatch_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("segwatch"));
}

#[test]
fn test_cli_duration_out_of_range_creates_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");

    let mut cmd = segwatch_cmd();
    cmd.arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-d", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 5 and 10"));

    assert!(!input.exists());
    assert!(!output.exists());
}

#[test]
fn test_cli_zero_interval_rejected() {
    let mut cmd = segwatch_cmd();
    cmd.args(["-w", "-t", "0"]).assert().failure();
}

#[test]
fn test_cli_invalid_duration_in_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("segwatch.toml");
    fs::write(&config, "[segment]\nduration_secs = 12\n").unwrap();
    let output = dir.path().join("out");

    let mut cmd = segwatch_cmd();
    cmd.arg("-c")
        .arg(&config)
        .arg("-i")
        .arg(dir.path().join("in"))
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 5 and 10"));

    assert!(!output.exists());
}

#[test]
fn test_cli_missing_config_file() {
    let mut cmd = segwatch_cmd();
    cmd.args(["-c", "/nonexistent/segwatch.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_cli_missing_tools_fail_before_any_work() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out");

    let mut cmd = segwatch_cmd();
    cmd.env("PATH", dir.path())
        .arg("-i")
        .arg(dir.path().join("in"))
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tool not found"));

    assert!(!output.exists());
}

#[test]
fn test_cli_input_dir_is_a_file() {
    if !tools_available() {
        eprintln!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    fs::write(&input, b"plain file").unwrap();

    let mut cmd = segwatch_cmd();
    cmd.arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_cli_same_input_and_output_rejected() {
    if !tools_available() {
        eprintln!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempdir().unwrap();

    let mut cmd = segwatch_cmd();
    cmd.arg("-i")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must differ"));
}

#[test]
fn test_cli_single_pass_on_empty_dir_creates_dirs() {
    if !tools_available() {
        eprintln!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");

    let mut cmd = segwatch_cmd();
    cmd.arg("-i").arg(&input).arg("-o").arg(&output).assert().success();

    assert!(input.is_dir());
    assert!(output.is_dir());
    assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
}

#[test]
fn test_cli_splits_real_clip() {
    if !tools_available() {
        eprintln!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();
    if !make_clip(&input.join("clip.mp4"), 12) {
        eprintln!("ffmpeg cannot encode libx264/aac, skipping");
        return;
    }

    let mut cmd = segwatch_cmd();
    cmd.arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-d", "5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("into 3 segments"));

    let mut names: Vec<String> = fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "clip_segment_001.mp4",
            "clip_segment_002.mp4",
            "clip_segment_003.mp4",
        ]
    );
}
