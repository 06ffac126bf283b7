//! Stream selection and index mapping

use tracing::{debug, info};

use crate::domain::model::{StreamDescriptor, StreamKind, StreamMapping};
use crate::error::{RemuxError, RemuxResult};

/// Decides which source streams are carried into the output
pub struct StreamSelector;

impl StreamSelector {
    /// Keep video and audio streams, drop everything else.
    ///
    /// Output indices follow input order, compacted.
    pub fn select(streams: &[StreamDescriptor]) -> StreamMapping {
        let mut selected = Vec::new();

        for stream in streams {
            match stream.kind() {
                StreamKind::Video | StreamKind::Audio => selected.push(stream.index),
                StreamKind::Other => {
                    debug!(
                        "Dropping stream {} ({}): not audio or video",
                        stream.index, stream.codec_name
                    );
                }
            }
        }

        let mapping = StreamMapping::from_inputs(selected);
        info!(
            "Selected {} of {} streams: {:?}",
            mapping.len(),
            streams.len(),
            mapping.iter().collect::<Vec<_>>()
        );
        mapping
    }

    /// Check that a mapping fits the streams it was built from
    pub fn validate(mapping: &StreamMapping, streams: &[StreamDescriptor]) -> RemuxResult<()> {
        if mapping.is_empty() {
            return Err(RemuxError::Stream {
                message: "No audio or video streams to copy".to_string(),
            });
        }

        for (input, output) in mapping.iter() {
            let stream = streams.get(input).ok_or_else(|| RemuxError::Stream {
                message: format!("Mapped input stream {} does not exist", input),
            })?;

            if !stream.time_base.is_valid() {
                return Err(RemuxError::Stream {
                    message: format!(
                        "Stream {} (output {}) has an unusable time base {}",
                        input, output, stream.time_base
                    ),
                });
            }
        }

        Ok(())
    }
}
