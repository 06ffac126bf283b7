//! rangemux library
//!
//! Lossless time-range extraction ("stream copy") from media containers,
//! plus read-only container introspection: stream descriptors, metadata and
//! keyframe indexes.
//!
//! The pipeline talks to containers through the ports in [`ports`]; the
//! [`adapters::libav`] module implements them with FFmpeg's libraries.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod keyframes;
pub mod output;
pub mod ports;
pub mod probe;
pub mod streams;
pub mod utils;

// Re-export commonly used types
pub use config::RemuxConfig;
pub use domain::model::{
    KeyframeIndex, MediaFile, Rational, StopPolicy, StreamDescriptor, StreamMapping, TimeRange,
    TimeSpec,
};
pub use engine::{ExtractionReport, RangeExtractor, RemuxJob, TimestampNormalizer};
pub use error::{RemuxError, RemuxResult};
pub use keyframes::KeyframeScanner;
pub use output::ContainerWriter;
pub use probe::MediaProbe;
pub use streams::StreamSelector;

/// Initialize FFmpeg with its logger limited to errors
pub fn init() -> RemuxResult<()> {
    adapters::libav::init(ffmpeg_next::util::log::Level::Error)
}

/// Install logging and initialize FFmpeg from a resolved configuration
pub fn init_with_config(config: &RemuxConfig) -> RemuxResult<()> {
    utils::init_logging(&config.log)?;
    let level = adapters::libav::parse_log_level(&config.log.ffmpeg_level)?;
    adapters::libav::init(level)
}
