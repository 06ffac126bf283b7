//! Output container writer

use std::path::Path;

use tracing::{debug, info, warn};

use crate::adapters::libav::LibavSink;
use crate::domain::model::Rational;
use crate::error::{RemuxError, RemuxResult};
use crate::ports::{MediaPacket, PacketSink};

/// Lifecycle of an output container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Streams may still be added
    Configuring,
    /// Header written, packets may be written
    Writing,
    /// Trailer written
    Finished,
}

/// Output container wrapper enforcing header / packets / trailer ordering
pub struct ContainerWriter<W: PacketSink> {
    sink: W,
    stream_count: usize,
    packets_written: u64,
    state: WriterState,
}

impl ContainerWriter<LibavSink> {
    /// Create an output container of an explicit format (e.g. "mp4")
    pub fn open<P: AsRef<Path>>(path: P, format: &str) -> RemuxResult<Self> {
        let sink = LibavSink::create(path, format)?;
        Ok(Self::new(sink))
    }
}

impl<W: PacketSink> ContainerWriter<W> {
    /// Wrap an already created sink
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            stream_count: 0,
            packets_written: 0,
            state: WriterState::Configuring,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn stream_count(&self) -> usize {
        self.stream_count
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    /// Add an output stream copying the given codec parameters
    pub fn add_stream(&mut self, parameters: &W::Parameters) -> RemuxResult<usize> {
        self.expect_state(WriterState::Configuring, "add a stream")?;

        let index = self.sink.add_stream(parameters).map_err(|e| RemuxError::Write {
            stream_index: Some(self.stream_count),
            message: format!("Failed to add stream: {}", e),
        })?;

        if index != self.stream_count {
            return Err(RemuxError::Write {
                stream_index: Some(index),
                message: format!(
                    "Output stream created at index {}, expected {}",
                    index, self.stream_count
                ),
            });
        }

        self.stream_count += 1;
        debug!("Added output stream {}", index);
        Ok(index)
    }

    /// Write the container header
    pub fn write_header(&mut self) -> RemuxResult<()> {
        self.expect_state(WriterState::Configuring, "write the header")?;
        if self.stream_count == 0 {
            return Err(RemuxError::Write {
                stream_index: None,
                message: "Cannot write a header without streams".to_string(),
            });
        }

        self.sink.write_header().map_err(|e| RemuxError::Write {
            stream_index: None,
            message: format!("Failed to write header: {}", e),
        })?;

        self.state = WriterState::Writing;
        debug!("Header written with {} streams", self.stream_count);
        Ok(())
    }

    /// Time base of an output stream, final once the header is written
    pub fn time_base(&self, stream_index: usize) -> Option<Rational> {
        if stream_index >= self.stream_count {
            return None;
        }
        self.sink.time_base(stream_index)
    }

    /// Write one packet, letting the muxer interleave streams
    pub fn write_interleaved(&mut self, packet: W::Packet) -> RemuxResult<()> {
        let stream_index = packet.stream_index();
        self.expect_state(WriterState::Writing, "write a packet")?;

        if stream_index >= self.stream_count {
            return Err(RemuxError::Write {
                stream_index: Some(stream_index),
                message: format!(
                    "Packet names output stream {} but only {} exist",
                    stream_index, self.stream_count
                ),
            });
        }

        self.sink
            .write_interleaved(packet)
            .map_err(|e| RemuxError::Write {
                stream_index: Some(stream_index),
                message: format!("Failed to write packet: {}", e),
            })?;

        self.packets_written += 1;
        Ok(())
    }

    /// Flush interleaving queues and write the trailer
    pub fn write_trailer(&mut self) -> RemuxResult<()> {
        self.expect_state(WriterState::Writing, "write the trailer")?;

        self.sink.write_trailer().map_err(|e| RemuxError::Write {
            stream_index: None,
            message: format!("Failed to write trailer: {}", e),
        })?;

        self.state = WriterState::Finished;
        info!("Trailer written after {} packets", self.packets_written);
        Ok(())
    }

    /// Release the output container and hand back the sink
    pub fn close(self) -> W {
        if self.state != WriterState::Finished {
            warn!("Closing output before the trailer was written; the file is incomplete");
        }
        self.sink
    }

    fn expect_state(&self, expected: WriterState, action: &str) -> RemuxResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RemuxError::Write {
                stream_index: None,
                message: format!("Cannot {} while the writer is {:?}", action, self.state),
            })
        }
    }
}
