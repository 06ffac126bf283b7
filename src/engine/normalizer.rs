//! Per-stream timestamp renormalization

use std::collections::HashMap;

use tracing::debug;

use crate::domain::model::Rational;

/// Timestamps of one packet after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    pub pts: Option<i64>,
    pub dts: Option<i64>,
}

/// Shifts every output stream so it starts at zero and rescales its
/// timestamps into the output time base.
///
/// The baseline of a stream is the pts of its first packet carrying a pts.
/// Packets without a pts are passed through untouched and never set a
/// baseline. One normalizer belongs to one extraction.
#[derive(Debug, Default)]
pub struct TimestampNormalizer {
    baselines: HashMap<usize, i64>,
}

impl TimestampNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline of an output stream, in input ticks, once established
    pub fn baseline(&self, stream_index: usize) -> Option<i64> {
        self.baselines.get(&stream_index).copied()
    }

    /// Normalize one packet's timestamps for `stream_index`
    pub fn normalize(
        &mut self,
        stream_index: usize,
        pts: Option<i64>,
        dts: Option<i64>,
        input_time_base: Rational,
        output_time_base: Rational,
    ) -> Normalized {
        let Some(pts) = pts else {
            return Normalized { pts: None, dts };
        };

        let baseline = *self.baselines.entry(stream_index).or_insert_with(|| {
            debug!("Stream {} baseline set to pts {}", stream_index, pts);
            pts
        });

        let shift = |ts: i64| {
            Rational::rescale(
                ts.saturating_sub(baseline),
                input_time_base,
                output_time_base,
            )
        };

        Normalized {
            pts: Some(shift(pts)),
            dts: dts.map(shift),
        }
    }
}
