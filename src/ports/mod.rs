// Ports - Interface definitions between the pipeline and the container library

use thiserror::Error;

use crate::domain::model::{MediaFile, Rational};

/// Failure reported by a container backend.
///
/// The pipeline lifts it into the matching [`crate::error::RemuxError`]
/// variant, adding the context it knows about (packet count, stream index).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ffmpeg_next::Error> for BackendError {
    fn from(error: ffmpeg_next::Error) -> Self {
        Self::new(error.to_string())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A compressed packet travelling from a source to a sink.
///
/// Packets are owned values; dropping one releases its buffer.
pub trait MediaPacket {
    /// Index of the stream this packet belongs to
    fn stream_index(&self) -> usize;
    fn set_stream_index(&mut self, index: usize);

    fn pts(&self) -> Option<i64>;
    fn set_pts(&mut self, pts: Option<i64>);

    fn dts(&self) -> Option<i64>;
    fn set_dts(&mut self, dts: Option<i64>);

    /// Whether the packet is a random-access point
    fn is_keyframe(&self) -> bool;

    /// Forget the byte position inherited from the source file
    fn clear_position(&mut self);
}

/// Port for reading packets from an opened container
pub trait PacketSource {
    type Packet: MediaPacket;
    /// Codec parameters handed to a sink when creating a matching stream
    type Parameters;

    /// Description of the opened container
    fn media(&self) -> &MediaFile;

    /// Codec parameters of a source stream
    fn parameters(&self, stream_index: usize) -> Option<Self::Parameters>;

    /// Seek to the random-access point at or before `timestamp_us`
    /// (microsecond clock, all streams)
    fn seek(&mut self, timestamp_us: i64) -> BackendResult<()>;

    /// Read the next packet; `Ok(None)` marks a clean end of stream
    fn read_packet(&mut self) -> BackendResult<Option<Self::Packet>>;
}

/// Port for writing packets into a new container
pub trait PacketSink {
    type Packet: MediaPacket;
    type Parameters;

    /// Create an output stream with codec parameters copied from a source
    /// stream; returns its output index
    fn add_stream(&mut self, parameters: &Self::Parameters) -> BackendResult<usize>;

    fn write_header(&mut self) -> BackendResult<()>;

    /// Time base of an output stream; the muxer may change it while
    /// writing the header
    fn time_base(&self, stream_index: usize) -> Option<Rational>;

    fn write_interleaved(&mut self, packet: Self::Packet) -> BackendResult<()>;

    fn write_trailer(&mut self) -> BackendResult<()>;
}
