//! Command implementations

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::libav::LibavSource;
use crate::cli::args::{ClipArgs, InspectArgs};
use crate::cli::{Cli, Commands};
use crate::config::RemuxConfig;
use crate::domain::model::{
    KeyframeIndex, MediaFile, StopPolicy, StreamDetails, TimeRange, TimeSpec,
};
use crate::engine::{ExtractionReport, RemuxJob};
use crate::error::{RemuxError, RemuxResult};
use crate::keyframes::KeyframeScanner;
use crate::probe::MediaProbe;
use crate::utils::{format_duration, format_file_size};

/// Resolve the configuration hierarchy: CLI > env > file > defaults
pub fn resolve_config(cli: &Cli) -> Result<RemuxConfig> {
    let mut config =
        RemuxConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log.format = format.parse()?;
    }

    if let Commands::Clip(args) = &cli.command {
        if let Some(format) = &args.format {
            config.output_format = format.clone();
        }
        if let Some(policy) = &args.stop_policy {
            config.stop_policy = StopPolicy::parse(policy)?;
        }
        if let Some(seconds) = args.timeout {
            config.timeout_secs = Some(seconds);
        }
    }

    config.validate()?;
    Ok(config)
}

/// Execute the clip command
pub fn clip(args: ClipArgs, config: &RemuxConfig) -> Result<()> {
    info!("Starting clip operation");
    info!("Input: {}", args.input.display());
    info!("Output: {}", args.output.display());
    info!("Start: {}", args.start);
    info!("End: {}", args.end);

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let start = TimeSpec::parse(&args.start)
        .with_context(|| format!("Invalid start time '{}'", args.start))?;
    let end = TimeSpec::parse(&args.end)
        .with_context(|| format!("Invalid end time '{}'", args.end))?;
    let range = TimeRange::from_specs(start, end)?;

    let input = args.input.clone();
    let output = args.output.clone();
    let format = config.output_format.clone();
    let policy = config.stop_policy;
    let job = move || -> RemuxResult<ExtractionReport> {
        RemuxJob::open(&input, &output, &format, range, policy)?.run()
    };

    let report = match config.timeout_secs {
        Some(seconds) => run_with_timeout(seconds, job)?,
        None => job().context("Failed to extract range")?,
    };

    display_report(&args.output, &range, &report);
    info!("Clip operation completed successfully");
    Ok(())
}

/// Run a blocking job on a worker thread and give up after `seconds`.
///
/// On expiry the worker is abandoned; its containers are released when the
/// process exits.
fn run_with_timeout<F>(seconds: u64, job: F) -> Result<ExtractionReport>
where
    F: FnOnce() -> RemuxResult<ExtractionReport> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start the async runtime")?;

    let outcome = runtime.block_on(async move {
        let task = tokio::task::spawn_blocking(job);
        tokio::time::timeout(Duration::from_secs(seconds), task).await
    });

    match outcome {
        Ok(joined) => {
            let report = joined
                .context("Remux task panicked")?
                .context("Failed to extract range")?;
            Ok(report)
        }
        Err(_) => {
            warn!("Job exceeded {}s, abandoning it", seconds);
            runtime.shutdown_background();
            Err(RemuxError::Timeout { seconds }.into())
        }
    }
}

/// JSON shape of the inspect command
#[derive(Serialize)]
struct InspectOutput<'a> {
    #[serde(flatten)]
    media: &'a MediaFile,
    duration_seconds: Option<f64>,
    /// Keyframe times in seconds, keyed by input stream index
    #[serde(skip_serializing_if = "Option::is_none")]
    keyframes: Option<BTreeMap<usize, Vec<f64>>>,
}

/// Execute the inspect command
pub fn inspect(args: InspectArgs) -> Result<()> {
    info!("Starting inspect operation");
    info!("Input: {}", args.input.display());

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let (media, keyframes) = if args.keyframes {
        let mut source = LibavSource::open(&args.input).context("Failed to inspect input file")?;
        let index = match KeyframeScanner::new().scan(&mut source) {
            Ok(index) => index,
            Err(e) => {
                if let Some(partial) = e.partial_keyframes() {
                    warn!("{} keyframes were found before the scan failed", partial.len());
                }
                return Err(e).context("Keyframe scan failed");
            }
        };
        let media = source.into_media();
        let seconds = keyframe_seconds(&media, &index);
        (media, Some(seconds))
    } else {
        let media = MediaProbe::probe(&args.input).context("Failed to inspect input file")?;
        (media, None)
    };

    if args.json {
        let output = InspectOutput {
            media: &media,
            duration_seconds: media.duration_seconds(),
            keyframes,
        };
        let json = serde_json::to_string_pretty(&output)
            .context("Failed to serialize media info to JSON")?;
        println!("{}", json);
    } else {
        display_media_info(&media);
        if let Some(keyframes) = &keyframes {
            display_keyframes(keyframes);
        }
    }

    info!("Inspect operation completed successfully");
    Ok(())
}

fn keyframe_seconds(media: &MediaFile, index: &KeyframeIndex) -> BTreeMap<usize, Vec<f64>> {
    index
        .streams()
        .filter_map(|stream| {
            let time_base = media.stream(stream)?.time_base;
            Some((stream, index.seconds(stream, time_base)))
        })
        .collect()
}

/// Display media information in human-readable format
fn display_media_info(media: &MediaFile) {
    println!("Media Information");
    println!("=================");
    println!("File: {}", media.path.display());
    match media.duration {
        Some(duration) => println!("Duration: {}", format_duration(duration)),
        None => println!("Duration: unknown"),
    }
    if let Ok(meta) = std::fs::metadata(&media.path) {
        println!("File Size: {}", format_file_size(meta.len()));
    }
    println!();

    println!("Streams:");
    for stream in &media.streams {
        match &stream.details {
            StreamDetails::Video(video) => {
                let fps = video
                    .fps()
                    .map(|fps| format!("{:.2} fps", fps))
                    .unwrap_or_else(|| "unknown fps".to_string());
                println!(
                    "  #{} video: {} {}x{} @ {}",
                    stream.index, stream.codec_name, video.width, video.height, fps
                );
            }
            StreamDetails::Audio(audio) => {
                println!(
                    "  #{} audio: {} {} Hz, {} channels",
                    stream.index, stream.codec_name, audio.sample_rate, audio.channels
                );
            }
            StreamDetails::Other { medium } => {
                println!("  #{} {}: {}", stream.index, medium, stream.codec_name);
            }
        }
        println!("    Time base: {}", stream.time_base);
        if let Some(profile) = stream.profile {
            println!("    Profile: {}", profile);
        }
        if let Some(level) = stream.level {
            println!("    Level: {}", level);
        }
    }

    if !media.metadata.is_empty() {
        println!();
        println!("Metadata:");
        for (key, value) in media.metadata.iter() {
            println!("  {}: {}", key, value);
        }
    }
}

fn display_keyframes(keyframes: &BTreeMap<usize, Vec<f64>>) {
    println!();
    println!("Keyframes:");
    if keyframes.is_empty() {
        println!("  none");
    }
    for (stream, times) in keyframes {
        let listed: Vec<String> = times.iter().map(|t| format!("{:.3}", t)).collect();
        println!("  #{} ({}): {}", stream, times.len(), listed.join(", "));
    }
}

/// Display a finished extraction
fn display_report(output: &Path, range: &TimeRange, report: &ExtractionReport) {
    println!("Clip written: {}", output.display());
    println!("Range: {} ({:.3}s)", range, range.length());
    println!(
        "Packets: {} written of {} read ({} unmapped, {} past end)",
        report.packets_written,
        report.packets_read,
        report.packets_unmapped,
        report.packets_past_end
    );
    for (index, stream) in &report.streams {
        println!(
            "  #{} (from input #{}): {} packets",
            index, stream.input_index, stream.packets
        );
    }
    if let Ok(meta) = std::fs::metadata(output) {
        println!("Size: {}", format_file_size(meta.len()));
    }
    println!("Elapsed: {:.2}s", report.elapsed.as_secs_f64());
}
