//! Command-line behaviour

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rangemux() -> Command {
    let mut cmd = Command::cargo_bin("rangemux").unwrap();
    for var in [
        "RANGEMUX_OUTPUT_FORMAT",
        "RANGEMUX_STOP_POLICY",
        "RANGEMUX_LOG_LEVEL",
        "RANGEMUX_LOG_FORMAT",
        "RANGEMUX_FFMPEG_LOG_LEVEL",
        "RANGEMUX_TIMEOUT_SECS",
        "RANGEMUX_CONFIG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    rangemux()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clip"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_clip_requires_range() {
    rangemux()
        .args(["clip", "--input", "in.mp4", "--output", "out.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start"));
}

#[test]
fn test_clip_missing_input() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.mp4");

    rangemux()
        .current_dir(dir.path())
        .args(["clip", "--input", "missing.mp4", "--output"])
        .arg(&output)
        .args(["--start", "0", "--end", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert!(!output.exists());
}

#[test]
fn test_clip_inverted_range() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.mp4");
    std::fs::write(&input, b"not really a video").unwrap();

    rangemux()
        .current_dir(dir.path())
        .arg("clip")
        .arg("--input")
        .arg(&input)
        .args(["--output", "out.mp4", "--start", "00:20", "--end", "00:10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time range"));
}

#[test]
fn test_clip_bad_time_format() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.mp4");
    std::fs::write(&input, b"not really a video").unwrap();

    rangemux()
        .current_dir(dir.path())
        .arg("clip")
        .arg("--input")
        .arg(&input)
        .args(["--output", "out.mp4", "--start", "ten", "--end", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid start time"));
}

#[test]
fn test_unknown_stop_policy() {
    let dir = TempDir::new().unwrap();

    rangemux()
        .current_dir(dir.path())
        .args([
            "clip", "--input", "in.mp4", "--output", "out.mp4", "--start", "0", "--end", "1",
            "--stop-policy", "eventually",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown stop policy"));
}

#[test]
fn test_unknown_log_format() {
    let dir = TempDir::new().unwrap();

    rangemux()
        .current_dir(dir.path())
        .args(["--log-format", "xml", "inspect", "--input", "in.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown log format"));
}

#[test]
fn test_inspect_missing_input() {
    let dir = TempDir::new().unwrap();

    rangemux()
        .current_dir(dir.path())
        .args(["inspect", "--input", "missing.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_config_file_is_validated() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rangemux.toml"), "stop_policy = \"sometimes\"\n").unwrap();

    rangemux()
        .current_dir(dir.path())
        .args(["inspect", "--input", "missing.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn test_config_file_origin_is_logged() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rangemux.toml"), "output_format = \"matroska\"\n").unwrap();

    rangemux()
        .current_dir(dir.path())
        .args(["--log-format", "compact", "inspect", "--input", "missing.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Loaded configuration from"));
}
