//! One-shot remux job: select streams, prepare the output, extract

use std::path::Path;

use tracing::{info, warn};

use crate::adapters::libav::{LibavSink, LibavSource};
use crate::domain::model::{StopPolicy, StreamMapping, TimeRange};
use crate::engine::extractor::{ExtractionReport, RangeExtractor};
use crate::error::{RemuxError, RemuxResult};
use crate::output::ContainerWriter;
use crate::ports::{PacketSink, PacketSource};
use crate::streams::StreamSelector;

/// Everything needed for one extraction run.
///
/// A job is consumed by [`RemuxJob::run`]; both containers are released
/// when it finishes, successfully or not.
pub struct RemuxJob<S, W>
where
    S: PacketSource,
    W: PacketSink,
{
    source: S,
    writer: ContainerWriter<W>,
    mapping: StreamMapping,
    range: TimeRange,
    extractor: RangeExtractor,
}

impl RemuxJob<LibavSource, LibavSink> {
    /// Open `input`, create `output` in `format` and prepare a job
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        format: &str,
        range: TimeRange,
        policy: StopPolicy,
    ) -> RemuxResult<Self> {
        let source = LibavSource::open(&input)?;
        let writer = ContainerWriter::open(&output, format)?;
        Self::new(source, writer, range, policy)
    }
}

impl<S, W> RemuxJob<S, W>
where
    S: PacketSource,
    W: PacketSink<Packet = S::Packet, Parameters = S::Parameters>,
{
    /// Build the stream mapping and create one output stream per selected
    /// input stream
    pub fn new(
        source: S,
        mut writer: ContainerWriter<W>,
        range: TimeRange,
        policy: StopPolicy,
    ) -> RemuxResult<Self> {
        let media = source.media();
        let mapping = StreamSelector::select(&media.streams);
        StreamSelector::validate(&mapping, &media.streams)?;

        if let Some(duration) = media.duration_seconds() {
            if range.start() >= duration {
                warn!(
                    "Range starts at {:.3}s, past the source duration {:.3}s",
                    range.start(),
                    duration
                );
            }
        }

        // Mapping iteration order is output order, so stream i lands on index i
        for (input, _) in mapping.iter() {
            let parameters = source.parameters(input).ok_or_else(|| RemuxError::Stream {
                message: format!("No codec parameters for input stream {}", input),
            })?;
            writer.add_stream(&parameters)?;
        }

        info!(
            "Prepared job for {}: range {}, {} streams, stop policy {}",
            source.media().path.display(),
            range,
            mapping.len(),
            policy
        );

        Ok(Self {
            source,
            writer,
            mapping,
            range,
            extractor: RangeExtractor::new(policy),
        })
    }

    pub fn mapping(&self) -> &StreamMapping {
        &self.mapping
    }

    /// Run the extraction and release both containers
    pub fn run(self) -> RemuxResult<ExtractionReport> {
        let Self {
            mut source,
            mut writer,
            mapping,
            range,
            extractor,
        } = self;

        let result = extractor.extract(&mut source, &mut writer, &mapping, &range);

        drop(source);
        drop(writer.close());
        result
    }
}
