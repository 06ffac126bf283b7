//! End-to-end extraction through FFmpeg.
//!
//! The input is generated with the `ffmpeg` command-line tool; tests skip
//! themselves when it is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use rangemux::adapters::libav::LibavSource;
use rangemux::domain::model::{StopPolicy, StreamKind, TimeRange};
use rangemux::engine::RemuxJob;
use rangemux::error::RemuxError;
use rangemux::ports::{MediaPacket, PacketSource};
use rangemux::MediaProbe;
use tempfile::TempDir;

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// 30 s of 1080p30 video plus stereo 48 kHz audio, keyframe every second
fn sample_input() -> Option<&'static Path> {
    static INPUT: OnceLock<Option<(TempDir, PathBuf)>> = OnceLock::new();

    INPUT
        .get_or_init(|| {
            if !ffmpeg_available() {
                eprintln!("ffmpeg not found, skipping libav tests");
                return None;
            }
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("input.mp4");
            let status = Command::new("ffmpeg")
                .args([
                    "-y",
                    "-loglevel",
                    "error",
                    "-f",
                    "lavfi",
                    "-i",
                    "testsrc=size=1920x1080:rate=30",
                    "-f",
                    "lavfi",
                    "-i",
                    "sine=frequency=440:sample_rate=48000",
                    "-t",
                    "30",
                    "-c:v",
                    "mpeg4",
                    "-q:v",
                    "10",
                    "-g",
                    "30",
                    "-c:a",
                    "aac",
                    "-ac",
                    "2",
                ])
                .arg(&path)
                .status()
                .unwrap();
            assert!(status.success(), "ffmpeg failed to generate the sample");
            Some((dir, path))
        })
        .as_ref()
        .map(|(_, path)| path.as_path())
}

#[test]
fn test_probe_generated_input() {
    let Some(input) = sample_input() else { return };
    rangemux::init().unwrap();

    let media = MediaProbe::probe(input).unwrap();

    assert_eq!(media.streams.len(), 2);
    assert_eq!(media.count(StreamKind::Video), 1);
    assert_eq!(media.count(StreamKind::Audio), 1);
    for (i, stream) in media.streams.iter().enumerate() {
        assert_eq!(stream.index, i);
    }

    let video = media.streams.iter().find_map(|s| s.video()).unwrap();
    assert_eq!((video.width, video.height), (1920, 1080));
    assert_eq!(video.fps().map(|f| f.round()), Some(30.0));

    let audio = media.streams.iter().find_map(|s| s.audio()).unwrap();
    assert_eq!((audio.channels, audio.sample_rate), (2, 48_000));

    let duration = media.duration_seconds().unwrap();
    assert!((duration - 30.0).abs() < 0.5, "duration {}", duration);
}

#[test]
fn test_extract_ten_seconds() {
    let Some(input) = sample_input() else { return };
    rangemux::init().unwrap();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("clip.mp4");

    let range = TimeRange::new(10.0, 20.0).unwrap();
    let report = RemuxJob::open(input, &output, "mp4", range, StopPolicy::Global)
        .unwrap()
        .run()
        .unwrap();
    assert!(report.packets_written > 0);

    let mut clip = LibavSource::open(&output).unwrap();
    let media = clip.media().clone();
    assert_eq!(media.streams.len(), 2);
    let duration = media.duration_seconds().unwrap();
    assert!((duration - 10.0).abs() < 0.5, "duration {}", duration);

    let video_index = media
        .streams
        .iter()
        .position(|s| s.kind() == StreamKind::Video)
        .unwrap();
    let mut first_video_pts = None;
    while let Some(packet) = clip.read_packet().unwrap() {
        if packet.stream_index() == video_index {
            first_video_pts = packet.pts();
            break;
        }
    }
    assert_eq!(first_video_pts, Some(0));
}

#[test]
fn test_full_duration_keeps_stream_parameters() {
    let Some(input) = sample_input() else { return };
    rangemux::init().unwrap();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("full.mp4");

    let original = MediaProbe::probe(input).unwrap();
    let duration = original.duration_seconds().unwrap();
    let range = TimeRange::new(0.0, duration).unwrap();
    RemuxJob::open(input, &output, "mp4", range, StopPolicy::Global)
        .unwrap()
        .run()
        .unwrap();

    let copy = MediaProbe::probe(&output).unwrap();
    assert_eq!(copy.streams.len(), original.streams.len());
    for (before, after) in original.streams.iter().zip(copy.streams.iter()) {
        assert_eq!(after.kind(), before.kind());
        assert_eq!(after.codec_name, before.codec_name);
        if let (Some(a), Some(b)) = (before.video(), after.video()) {
            assert_eq!((b.width, b.height), (a.width, a.height));
        }
        if let (Some(a), Some(b)) = (before.audio(), after.audio()) {
            assert_eq!((b.channels, b.sample_rate), (a.channels, a.sample_rate));
        }
    }
    let copied = copy.duration_seconds().unwrap();
    assert!((copied - duration).abs() < 0.5, "duration {}", copied);
}

#[test]
fn test_unwritable_destination_fails_to_open() {
    let Some(input) = sample_input() else { return };
    rangemux::init().unwrap();

    let range = TimeRange::new(10.0, 20.0).unwrap();
    let result = RemuxJob::open(
        input,
        "/nonexistent-dir/rangemux/clip.mp4",
        "mp4",
        range,
        StopPolicy::Global,
    );

    assert!(matches!(result, Err(RemuxError::Open { .. })));
}
