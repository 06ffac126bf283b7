//! Media file inspection
//!
//! Turns the raw per-stream values read from a container into
//! [`StreamDescriptor`]s and assembles the [`MediaFile`] description.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::adapters::libav::LibavSource;
use crate::domain::model::*;
use crate::error::RemuxResult;

/// Sentinel used by FFmpeg for an unknown codec profile or level
const UNKNOWN_PROFILE_OR_LEVEL: i32 = -99;

/// Codec name reported when no decoder is registered for a codec id
pub const UNKNOWN_CODEC: &str = "unknown";

/// Media type as reported by the container library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMedium {
    Video,
    Audio,
    /// Any other media type, with its name (`subtitle`, `data`, ...)
    Other(String),
}

/// Unprocessed values read for one stream
#[derive(Debug, Clone)]
pub struct RawStream {
    pub index: usize,
    pub medium: RawMedium,
    /// Name of the registered decoder, `None` if there is none
    pub decoder_name: Option<String>,
    pub time_base: Rational,
    pub avg_frame_rate: Rational,
    pub width: i32,
    pub height: i32,
    pub channels: i32,
    pub sample_rate: i32,
    pub profile: i32,
    pub level: i32,
}

/// Read-only inspection of containers
pub struct MediaProbe;

impl MediaProbe {
    /// Open a container and describe it
    pub fn probe<P: AsRef<Path>>(path: P) -> RemuxResult<MediaFile> {
        let source = LibavSource::open(path)?;
        Ok(source.into_media())
    }

    /// Assemble a media file description from raw container values
    pub fn describe(
        path: PathBuf,
        metadata: Vec<(String, String)>,
        duration_micros: i64,
        streams: Vec<RawStream>,
    ) -> MediaFile {
        let streams: Vec<StreamDescriptor> = streams
            .into_iter()
            .map(Self::describe_stream)
            .collect();

        let media = MediaFile {
            path,
            metadata: Metadata::new(metadata),
            duration: Self::duration_from_micros(duration_micros),
            streams,
        };

        info!(
            "Probed {}: {} streams ({} video, {} audio), duration {}",
            media.path.display(),
            media.streams.len(),
            media.count(StreamKind::Video),
            media.count(StreamKind::Audio),
            media
                .duration_seconds()
                .map(|s| format!("{:.3}s", s))
                .unwrap_or_else(|| "unknown".to_string()),
        );
        media
    }

    /// Classify one stream and extract its attributes
    pub fn describe_stream(raw: RawStream) -> StreamDescriptor {
        let details = match raw.medium {
            RawMedium::Video => {
                let rate = raw.avg_frame_rate;
                // 0/0 and n/0 mean the container does not know the rate
                let framerate = if rate.den == 0 || rate.num == 0 {
                    debug!("Stream {}: frame rate unknown ({})", raw.index, rate);
                    None
                } else {
                    Some(rate)
                };
                StreamDetails::Video(VideoAttributes {
                    width: raw.width.max(0) as u32,
                    height: raw.height.max(0) as u32,
                    framerate,
                })
            }
            RawMedium::Audio => StreamDetails::Audio(AudioAttributes {
                channels: raw.channels.max(0) as u32,
                sample_rate: raw.sample_rate.max(0) as u32,
            }),
            RawMedium::Other(medium) => StreamDetails::Other { medium },
        };

        StreamDescriptor {
            index: raw.index,
            codec_name: raw
                .decoder_name
                .unwrap_or_else(|| UNKNOWN_CODEC.to_string()),
            time_base: raw.time_base,
            profile: known(raw.profile),
            level: known(raw.level),
            details,
        }
    }

    /// Convert a container duration in microseconds; negative means unknown
    pub fn duration_from_micros(micros: i64) -> Option<Duration> {
        u64::try_from(micros).ok().map(Duration::from_micros)
    }
}

fn known(value: i32) -> Option<i32> {
    (value != UNKNOWN_PROFILE_OR_LEVEL).then_some(value)
}
