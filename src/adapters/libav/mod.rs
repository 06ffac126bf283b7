//! libav adapter
//!
//! Implements the packet ports on top of `ffmpeg-next`. Containers are
//! plain owned values: the demuxer context is released when a
//! [`LibavSource`] is dropped and the muxer context, together with its I/O
//! channel, when a [`LibavSink`] is dropped.

use std::path::{Path, PathBuf};

use ffmpeg_next::codec::{self, Id};
use ffmpeg_next::format::context::{Input, Output};
use ffmpeg_next::media::Type;
use ffmpeg_next::util::log::Level;
use ffmpeg_next::Packet;
use tracing::debug;

use crate::domain::model::{MediaFile, Rational};
use crate::error::{RemuxError, RemuxResult};
use crate::ports::{BackendError, BackendResult, MediaPacket, PacketSink, PacketSource};
use crate::probe::{MediaProbe, RawMedium, RawStream};

/// Initialize the libav libraries and set their own log verbosity
pub fn init(log_level: Level) -> RemuxResult<()> {
    ffmpeg_next::init().map_err(|e| RemuxError::FFmpegInit {
        message: e.to_string(),
    })?;
    ffmpeg_next::util::log::set_level(log_level);
    Ok(())
}

/// Parse a libav log level name (`quiet`, `error`, `warning`, `info`, ...)
pub fn parse_log_level(name: &str) -> RemuxResult<Level> {
    match name.to_lowercase().as_str() {
        "quiet" => Ok(Level::Quiet),
        "panic" => Ok(Level::Panic),
        "fatal" => Ok(Level::Fatal),
        "error" => Ok(Level::Error),
        "warning" | "warn" => Ok(Level::Warning),
        "info" => Ok(Level::Info),
        "verbose" => Ok(Level::Verbose),
        "debug" => Ok(Level::Debug),
        "trace" => Ok(Level::Trace),
        other => Err(RemuxError::Config {
            message: format!("Unknown FFmpeg log level: {}", other),
        }),
    }
}

fn rational(value: ffmpeg_next::Rational) -> Rational {
    Rational::new(value.numerator(), value.denominator())
}

/// Packet read from a libav demuxer
pub struct LibavPacket(Packet);

impl LibavPacket {
    pub fn into_inner(self) -> Packet {
        self.0
    }
}

impl MediaPacket for LibavPacket {
    fn stream_index(&self) -> usize {
        self.0.stream()
    }

    fn set_stream_index(&mut self, index: usize) {
        self.0.set_stream(index);
    }

    fn pts(&self) -> Option<i64> {
        self.0.pts()
    }

    fn set_pts(&mut self, pts: Option<i64>) {
        self.0.set_pts(pts);
    }

    fn dts(&self) -> Option<i64> {
        self.0.dts()
    }

    fn set_dts(&mut self, dts: Option<i64>) {
        self.0.set_dts(dts);
    }

    fn is_keyframe(&self) -> bool {
        self.0.is_key()
    }

    fn clear_position(&mut self) {
        self.0.set_position(-1);
    }
}

/// Opened input container
pub struct LibavSource {
    input: Input,
    media: MediaFile,
}

impl LibavSource {
    /// Open a container for reading and describe its streams
    pub fn open<P: AsRef<Path>>(path: P) -> RemuxResult<Self> {
        let path = path.as_ref();
        let input = ffmpeg_next::format::input(&path).map_err(|e| RemuxError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let metadata: Vec<(String, String)> = input
            .metadata()
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let streams: Vec<RawStream> = input.streams().map(|s| raw_stream(&s)).collect();

        let media = MediaProbe::describe(
            PathBuf::from(path),
            metadata,
            input.duration(),
            streams,
        );

        Ok(Self { input, media })
    }

    /// Close the container and keep its description
    pub fn into_media(self) -> MediaFile {
        self.media
    }
}

fn raw_stream(stream: &ffmpeg_next::Stream) -> RawStream {
    let parameters = stream.parameters();
    let medium = match parameters.medium() {
        Type::Video => RawMedium::Video,
        Type::Audio => RawMedium::Audio,
        Type::Subtitle => RawMedium::Other("subtitle".to_string()),
        Type::Data => RawMedium::Other("data".to_string()),
        Type::Attachment => RawMedium::Other("attachment".to_string()),
        _ => RawMedium::Other("unknown".to_string()),
    };
    let decoder_name = codec::decoder::find(parameters.id()).map(|c| c.name().to_string());

    // SAFETY: `parameters` wraps the stream's codecpar, which stays valid
    // while the input context is alive.
    let (width, height, channels, sample_rate, profile, level) = unsafe {
        let par = &*parameters.as_ptr();
        (
            par.width,
            par.height,
            par.ch_layout.nb_channels,
            par.sample_rate,
            par.profile,
            par.level,
        )
    };

    RawStream {
        index: stream.index(),
        medium,
        decoder_name,
        time_base: rational(stream.time_base()),
        avg_frame_rate: rational(stream.avg_frame_rate()),
        width,
        height,
        channels,
        sample_rate,
        profile,
        level,
    }
}

impl PacketSource for LibavSource {
    type Packet = LibavPacket;
    type Parameters = codec::Parameters;

    fn media(&self) -> &MediaFile {
        &self.media
    }

    fn parameters(&self, stream_index: usize) -> Option<codec::Parameters> {
        self.input
            .stream(stream_index)
            .map(|stream| stream.parameters())
    }

    fn seek(&mut self, timestamp_us: i64) -> BackendResult<()> {
        // max_ts = ts: land on the random-access point at or before the target
        self.input.seek(timestamp_us, ..timestamp_us)?;
        Ok(())
    }

    fn read_packet(&mut self) -> BackendResult<Option<LibavPacket>> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(LibavPacket(packet))),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(e) => Err(BackendError::from(e)),
        }
    }
}

/// Output container created in an explicit format
pub struct LibavSink {
    output: Output,
}

impl LibavSink {
    /// Create the destination file and its muxer
    pub fn create<P: AsRef<Path>>(path: P, format: &str) -> RemuxResult<Self> {
        let path = path.as_ref();
        let output = ffmpeg_next::format::output_as(&path, format).map_err(|e| {
            RemuxError::Open {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        debug!("Created {} output: {}", format, path.display());

        Ok(Self { output })
    }
}

impl PacketSink for LibavSink {
    type Packet = LibavPacket;
    type Parameters = codec::Parameters;

    fn add_stream(&mut self, parameters: &codec::Parameters) -> BackendResult<usize> {
        let mut stream = self
            .output
            .add_stream(ffmpeg_next::encoder::find(Id::None))?;
        stream.set_parameters(parameters.clone());
        // Let the muxer pick a tag valid for the destination container
        unsafe {
            (*stream.parameters().as_mut_ptr()).codec_tag = 0;
        }
        Ok(stream.index())
    }

    fn write_header(&mut self) -> BackendResult<()> {
        self.output.write_header()?;
        Ok(())
    }

    fn time_base(&self, stream_index: usize) -> Option<Rational> {
        self.output
            .stream(stream_index)
            .map(|stream| rational(stream.time_base()))
    }

    fn write_interleaved(&mut self, packet: LibavPacket) -> BackendResult<()> {
        packet.into_inner().write_interleaved(&mut self.output)?;
        Ok(())
    }

    fn write_trailer(&mut self) -> BackendResult<()> {
        self.output.write_trailer()?;
        Ok(())
    }
}
