// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RemuxError, RemuxResult};


/// Ticks per second of the container-level clock (`AV_TIME_BASE`)
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Rational number used for time bases and frame rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Create a new rational without validation
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Microsecond clock, the unit of container durations and seeks
    pub const fn micros() -> Self {
        Self { num: 1, den: MICROS_PER_SECOND as i32 }
    }

    /// A rational is usable as a scale only when both parts are non-zero
    pub fn is_valid(&self) -> bool {
        self.num != 0 && self.den != 0
    }

    /// Floating point value, `None` when the denominator is zero
    pub fn to_f64(&self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }

    /// Convert ticks in this time base to seconds
    pub fn ticks_to_seconds(&self, ticks: i64) -> Option<f64> {
        self.to_f64().map(|scale| ticks as f64 * scale)
    }

    /// Rescale `value` from one time base to another.
    ///
    /// Computes `value * from.num * to.den / (from.den * to.num)` with a
    /// 128-bit intermediate, rounding to nearest with ties away from zero
    /// (the same rule as `av_rescale_q`). Results outside the `i64` range
    /// saturate. Invalid rationals leave the value untouched.
    pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
        if from == to || !from.is_valid() || !to.is_valid() {
            return value;
        }

        let mut num = value as i128 * from.num as i128 * to.den as i128;
        let mut den = from.den as i128 * to.num as i128;
        if den < 0 {
            num = -num;
            den = -den;
        }

        let half = den / 2;
        let rounded = if num >= 0 {
            (num + half) / den
        } else {
            (num - half) / den
        };

        rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> RemuxResult<Self> {
        let trimmed = time_str.trim();
        let invalid = || RemuxError::InvalidTimeFormat {
            time: trimmed.to_string(),
        };

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if seconds < 0.0 || !seconds.is_finite() {
                return Err(invalid());
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [mm, ss] => (0, mm.parse::<u32>().map_err(|_| invalid())?, *ss),
            [hh, mm, ss] => {
                let hours = hh.parse::<u32>().map_err(|_| invalid())?;
                let minutes = mm.parse::<u32>().map_err(|_| invalid())?;
                if minutes >= 60 {
                    return Err(invalid());
                }
                (hours, minutes, *ss)
            }
            _ => return Err(invalid()),
        };

        let seconds = seconds.parse::<f64>().map_err(|_| invalid())?;
        if !(0.0..60.0).contains(&seconds) {
            return Err(invalid());
        }

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    /// Format as HH:MM:SS.ms
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Half-open extraction window `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Create a validated range; `start` must be non-negative and before `end`
    pub fn new(start: f64, end: f64) -> RemuxResult<Self> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
            return Err(RemuxError::InvalidTimeRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Create a range from parsed time specifications
    pub fn from_specs(start: TimeSpec, end: TimeSpec) -> RemuxResult<Self> {
        Self::new(start.seconds, end.seconds)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the range in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Start position on the microsecond clock
    pub fn start_micros(&self) -> i64 {
        (self.start * MICROS_PER_SECOND as f64).round() as i64
    }

    /// End position on the microsecond clock
    pub fn end_micros(&self) -> i64 {
        (self.end * MICROS_PER_SECOND as f64).round() as i64
    }

    /// Whether a timestamp in `time_base` lies at or past the end of the range.
    ///
    /// The comparison is exact: `ts * num / den >= end_micros / 1e6` is
    /// evaluated in integers. Returns `false` for an unusable time base.
    pub fn reaches_end(&self, ts: i64, time_base: Rational) -> bool {
        if time_base.den == 0 {
            return false;
        }

        let mut lhs = ts as i128 * time_base.num as i128 * MICROS_PER_SECOND as i128;
        let mut rhs = self.end_micros() as i128 * time_base.den as i128;
        if time_base.den < 0 {
            lhs = -lhs;
            rhs = -rhs;
        }
        lhs >= rhs
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            TimeSpec::from_seconds(self.start),
            TimeSpec::from_seconds(self.end)
        )
    }
}

/// Coarse classification of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

/// Video stream attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAttributes {
    pub width: u32,
    pub height: u32,
    /// Average frame rate; `None` when the container reports a zero denominator
    pub framerate: Option<Rational>,
}

impl VideoAttributes {
    /// Frames per second, if known
    pub fn fps(&self) -> Option<f64> {
        self.framerate.and_then(|rate| rate.to_f64())
    }
}

/// Audio stream attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAttributes {
    pub channels: u32,
    pub sample_rate: u32,
}

/// Kind-specific stream details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamDetails {
    Video(VideoAttributes),
    Audio(AudioAttributes),
    Other { medium: String },
}

/// Description of one stream of a source container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Position in the source container
    pub index: usize,
    pub codec_name: String,
    pub time_base: Rational,
    pub profile: Option<i32>,
    pub level: Option<i32>,
    pub details: StreamDetails,
}

impl StreamDescriptor {
    pub fn kind(&self) -> StreamKind {
        match self.details {
            StreamDetails::Video(_) => StreamKind::Video,
            StreamDetails::Audio(_) => StreamKind::Audio,
            StreamDetails::Other { .. } => StreamKind::Other,
        }
    }

    pub fn video(&self) -> Option<&VideoAttributes> {
        match &self.details {
            StreamDetails::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioAttributes> {
        match &self.details {
            StreamDetails::Audio(audio) => Some(audio),
            _ => None,
        }
    }
}

/// Global container metadata, read once at open time.
///
/// Entries keep the order returned by the container and duplicate keys are
/// retained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value stored under `key`, in container order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Complete description of an opened source container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub metadata: Metadata,
    /// Container duration; `None` when the container does not report one
    pub duration: Option<Duration>,
    pub streams: Vec<StreamDescriptor>,
}

impl MediaFile {
    /// Look up a stream by its source index
    pub fn stream(&self, index: usize) -> Option<&StreamDescriptor> {
        self.streams.get(index)
    }

    /// Number of streams of the given kind
    pub fn count(&self, kind: StreamKind) -> usize {
        self.streams.iter().filter(|s| s.kind() == kind).count()
    }

    /// Duration in seconds, if known
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64())
    }
}

/// Input stream index to output stream index table.
///
/// Only selected streams have an entry; a missing input index means the
/// stream is dropped. Output indices are dense, `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMapping {
    entries: BTreeMap<usize, usize>,
}

impl StreamMapping {
    /// Build a mapping from input indices, assigning output indices in
    /// ascending input order
    pub fn from_inputs<I: IntoIterator<Item = usize>>(inputs: I) -> Self {
        let mut sorted: Vec<usize> = inputs.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let entries = sorted
            .into_iter()
            .enumerate()
            .map(|(output, input)| (input, output))
            .collect();
        Self { entries }
    }

    /// Output index for an input stream, `None` if the stream is dropped
    pub fn output_for(&self, input: usize) -> Option<usize> {
        self.entries.get(&input).copied()
    }

    /// `(input, output)` pairs in output order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().map(|(input, output)| (*input, *output))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Random-access points per stream, in source time base ticks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeIndex {
    streams: BTreeMap<usize, Vec<i64>>,
}

impl KeyframeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keyframe; a sequential scan yields ascending timestamps
    pub fn record(&mut self, stream_index: usize, pts: i64) {
        self.streams.entry(stream_index).or_default().push(pts);
    }

    /// Keyframe timestamps of one stream (empty if none were flagged)
    pub fn timestamps(&self, stream_index: usize) -> &[i64] {
        self.streams
            .get(&stream_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keyframe positions of one stream in seconds
    pub fn seconds(&self, stream_index: usize, time_base: Rational) -> Vec<f64> {
        self.timestamps(stream_index)
            .iter()
            .filter_map(|ts| time_base.ticks_to_seconds(*ts))
            .collect()
    }

    /// Latest keyframe at or before `ts` on a stream
    pub fn at_or_before(&self, stream_index: usize, ts: i64) -> Option<i64> {
        let timestamps = self.timestamps(stream_index);
        let count = timestamps.partition_point(|k| *k <= ts);
        count.checked_sub(1).map(|i| timestamps[i])
    }

    /// Streams with at least one keyframe, ascending
    pub fn streams(&self) -> impl Iterator<Item = usize> + '_ {
        self.streams.keys().copied()
    }

    /// Total number of keyframes across all streams
    pub fn len(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// When the copy loop stops once packets cross the end of the range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopPolicy {
    /// The first packet on any selected stream at or past the end stops every stream
    #[default]
    Global,
    /// Each stream stops on its own; the loop ends once all have crossed the end
    PerStream,
}

impl StopPolicy {
    pub fn parse(value: &str) -> RemuxResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(StopPolicy::Global),
            "per-stream" | "per_stream" | "perstream" => Ok(StopPolicy::PerStream),
            other => Err(RemuxError::Config {
                message: format!("Unknown stop policy '{}', expected global or per-stream", other),
            }),
        }
    }
}

impl fmt::Display for StopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopPolicy::Global => write!(f, "global"),
            StopPolicy::PerStream => write!(f, "per-stream"),
        }
    }
}
