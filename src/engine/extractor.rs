//! Range extraction: seek, filter, renormalize and remux packets

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::model::{Rational, StopPolicy, StreamMapping, TimeRange};
use crate::engine::normalizer::TimestampNormalizer;
use crate::error::{RemuxError, RemuxResult};
use crate::output::ContainerWriter;
use crate::ports::{MediaPacket, PacketSink, PacketSource};

/// Phases of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionState {
    Seeking,
    Copying,
    Finalizing,
    Done,
    Failed,
}

/// Per output stream counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamReport {
    pub input_index: usize,
    pub packets: u64,
    /// First normalized pts written, in the output time base
    pub first_pts: Option<i64>,
    /// Last normalized pts written, in the output time base
    pub last_pts: Option<i64>,
    /// Whether the stream reached the end of the range
    pub reached_end: bool,
}

/// Outcome of a successful extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub packets_read: u64,
    pub packets_written: u64,
    /// Packets of streams without a mapping entry
    pub packets_unmapped: u64,
    /// Packets at or past the end of the range that were not written
    pub packets_past_end: u64,
    /// Keyed by output stream index
    pub streams: BTreeMap<usize, StreamReport>,
    pub elapsed: Duration,
}

/// Copies the packets of a time range from a source into a writer
pub struct RangeExtractor {
    policy: StopPolicy,
}

impl Default for RangeExtractor {
    fn default() -> Self {
        Self::new(StopPolicy::default())
    }
}

impl RangeExtractor {
    /// Create an extractor with the given stop policy
    pub fn new(policy: StopPolicy) -> Self {
        Self { policy }
    }

    /// Run one extraction.
    ///
    /// The writer must already hold one output stream per mapping entry and
    /// must not have written its header yet.
    pub fn extract<S, W>(
        &self,
        source: &mut S,
        writer: &mut ContainerWriter<W>,
        mapping: &StreamMapping,
        range: &TimeRange,
    ) -> RemuxResult<ExtractionReport>
    where
        S: PacketSource,
        W: PacketSink<Packet = S::Packet>,
    {
        let started = Instant::now();
        let mut state = ExtractionState::Seeking;

        let result = self.run(source, writer, mapping, range, &mut state);
        match result {
            Ok(mut report) => {
                state = ExtractionState::Done;
                report.elapsed = started.elapsed();
                info!(
                    "Extraction {:?}: {} of {} packets written in {:.2}s",
                    state,
                    report.packets_written,
                    report.packets_read,
                    report.elapsed.as_secs_f64()
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    "Extraction {:?} while {:?}: {}",
                    ExtractionState::Failed,
                    state,
                    e
                );
                Err(e)
            }
        }
    }

    fn run<S, W>(
        &self,
        source: &mut S,
        writer: &mut ContainerWriter<W>,
        mapping: &StreamMapping,
        range: &TimeRange,
        state: &mut ExtractionState,
    ) -> RemuxResult<ExtractionReport>
    where
        S: PacketSource,
        W: PacketSink<Packet = S::Packet>,
    {
        if writer.stream_count() != mapping.len() {
            return Err(RemuxError::Stream {
                message: format!(
                    "Writer has {} streams but the mapping selects {}",
                    writer.stream_count(),
                    mapping.len()
                ),
            });
        }

        // Input time bases indexed by output stream
        let mut input_time_bases = Vec::with_capacity(mapping.len());
        for (input, _) in mapping.iter() {
            let stream = source.media().stream(input).ok_or_else(|| RemuxError::Stream {
                message: format!("Mapped input stream {} does not exist", input),
            })?;
            input_time_bases.push(stream.time_base);
        }

        // Seeking
        info!("Seeking to {:.3}s (backward)", range.start());
        if let Err(e) = source.seek(range.start_micros()) {
            return Err(RemuxError::Seek {
                seconds: range.start(),
                message: e.message,
            });
        }

        writer.write_header()?;

        let output_time_bases: Vec<Rational> = (0..mapping.len())
            .map(|i| writer.time_base(i).unwrap_or(input_time_bases[i]))
            .collect();
        for (i, (input_tb, output_tb)) in input_time_bases
            .iter()
            .zip(output_time_bases.iter())
            .enumerate()
        {
            if !output_tb.is_valid() {
                return Err(RemuxError::Stream {
                    message: format!("Output stream {} has invalid time base {}", i, output_tb),
                });
            }
            debug!("Output stream {}: time base {} -> {}", i, input_tb, output_tb);
        }

        // Copying
        *state = ExtractionState::Copying;
        let mut report = ExtractionReport::default();
        for (input, output) in mapping.iter() {
            report.streams.insert(
                output,
                StreamReport {
                    input_index: input,
                    ..StreamReport::default()
                },
            );
        }

        let mut normalizer = TimestampNormalizer::new();
        let mut finished: HashSet<usize> = HashSet::new();

        loop {
            let mut packet = match source.read_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    debug!("End of source after {} packets", report.packets_read);
                    break;
                }
                Err(e) => {
                    return Err(RemuxError::Read {
                        packets_read: report.packets_read,
                        message: e.message,
                    });
                }
            };
            report.packets_read += 1;

            let Some(output) = mapping.output_for(packet.stream_index()) else {
                report.packets_unmapped += 1;
                continue;
            };

            if finished.contains(&output) {
                report.packets_past_end += 1;
                continue;
            }

            let input_tb = input_time_bases[output];
            if let Some(pts) = packet.pts() {
                if range.reaches_end(pts, input_tb) {
                    report.packets_past_end += 1;
                    finished.insert(output);
                    if let Some(stream) = report.streams.get_mut(&output) {
                        stream.reached_end = true;
                    }

                    match self.policy {
                        StopPolicy::Global => {
                            debug!(
                                "Stream {} reached {:.3}s, stopping all streams",
                                packet.stream_index(),
                                range.end()
                            );
                            break;
                        }
                        StopPolicy::PerStream => {
                            debug!(
                                "Stream {} reached {:.3}s ({} of {} streams done)",
                                packet.stream_index(),
                                range.end(),
                                finished.len(),
                                mapping.len()
                            );
                            if finished.len() == mapping.len() {
                                break;
                            }
                            continue;
                        }
                    }
                }
            }

            let normalized = normalizer.normalize(
                output,
                packet.pts(),
                packet.dts(),
                input_tb,
                output_time_bases[output],
            );
            packet.set_pts(normalized.pts);
            packet.set_dts(normalized.dts);
            packet.set_stream_index(output);
            packet.clear_position();

            writer.write_interleaved(packet)?;

            report.packets_written += 1;
            if let Some(stream) = report.streams.get_mut(&output) {
                stream.packets += 1;
                if let Some(pts) = normalized.pts {
                    stream.first_pts.get_or_insert(pts);
                    stream.last_pts = Some(pts);
                }
            }
        }

        // Finalizing
        *state = ExtractionState::Finalizing;
        writer.write_trailer()?;

        for (output, stream) in &report.streams {
            if stream.packets == 0 {
                warn!(
                    "Output stream {} (input {}) received no packets",
                    output, stream.input_index
                );
            }
        }

        Ok(report)
    }
}
