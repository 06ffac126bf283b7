//! In-memory containers implementing the packet ports

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use rangemux::domain::model::{
    AudioAttributes, MediaFile, Metadata, Rational, StreamDescriptor, StreamDetails,
    VideoAttributes,
};
use rangemux::ports::{BackendError, BackendResult, MediaPacket, PacketSink, PacketSource};

pub const VIDEO_TB: Rational = Rational::new(1, 90_000);
pub const AUDIO_TB: Rational = Rational::new(1, 48_000);
pub const MS_TB: Rational = Rational::new(1, 1000);

#[derive(Debug, Clone, PartialEq)]
pub struct FakePacket {
    pub stream: usize,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub key: bool,
    pub position: i64,
}

impl FakePacket {
    pub fn new(stream: usize, pts: i64, key: bool) -> Self {
        Self {
            stream,
            pts: Some(pts),
            dts: Some(pts),
            key,
            position: 0,
        }
    }
}

impl MediaPacket for FakePacket {
    fn stream_index(&self) -> usize {
        self.stream
    }

    fn set_stream_index(&mut self, index: usize) {
        self.stream = index;
    }

    fn pts(&self) -> Option<i64> {
        self.pts
    }

    fn set_pts(&mut self, pts: Option<i64>) {
        self.pts = pts;
    }

    fn dts(&self) -> Option<i64> {
        self.dts
    }

    fn set_dts(&mut self, dts: Option<i64>) {
        self.dts = dts;
    }

    fn is_keyframe(&self) -> bool {
        self.key
    }

    fn clear_position(&mut self) {
        self.position = -1;
    }
}

/// Codec parameters of a fake stream
#[derive(Debug, Clone, PartialEq)]
pub struct FakeParams {
    pub codec: String,
    pub source_index: usize,
}

pub fn video_stream(index: usize, time_base: Rational) -> StreamDescriptor {
    StreamDescriptor {
        index,
        codec_name: "h264".to_string(),
        time_base,
        profile: Some(100),
        level: Some(40),
        details: StreamDetails::Video(VideoAttributes {
            width: 1920,
            height: 1080,
            framerate: Some(Rational::new(30, 1)),
        }),
    }
}

pub fn audio_stream(index: usize, time_base: Rational) -> StreamDescriptor {
    StreamDescriptor {
        index,
        codec_name: "aac".to_string(),
        time_base,
        profile: Some(1),
        level: None,
        details: StreamDetails::Audio(AudioAttributes {
            channels: 2,
            sample_rate: 48_000,
        }),
    }
}

pub fn subtitle_stream(index: usize) -> StreamDescriptor {
    StreamDescriptor {
        index,
        codec_name: "mov_text".to_string(),
        time_base: MS_TB,
        profile: None,
        level: None,
        details: StreamDetails::Other {
            medium: "subtitle".to_string(),
        },
    }
}

pub fn media(streams: Vec<StreamDescriptor>, seconds: Option<u64>) -> MediaFile {
    MediaFile {
        path: PathBuf::from("memory://input"),
        metadata: Metadata::default(),
        duration: seconds.map(Duration::from_secs),
        streams,
    }
}

/// Video on stream 0 (30 fps, keyframe every second) interleaved with
/// 1024-sample audio frames on stream 1, in presentation order
pub fn av_packets(seconds: u32) -> Vec<FakePacket> {
    let mut packets = Vec::new();
    for frame in 0..(seconds as i64 * 30) {
        packets.push(FakePacket::new(0, frame * 3000, frame % 30 == 0));
    }
    let audio_frames = seconds as i64 * 48_000 / 1024;
    for frame in 0..audio_frames {
        packets.push(FakePacket::new(1, frame * 1024, true));
    }
    // Stable sort keeps video first on ties
    packets.sort_by(|a, b| {
        let tb = |p: &FakePacket| if p.stream == 0 { VIDEO_TB } else { AUDIO_TB };
        let ta = a.pts.unwrap_or(0) as i128 * tb(a).num as i128 * tb(b).den as i128;
        let tbb = b.pts.unwrap_or(0) as i128 * tb(b).num as i128 * tb(a).den as i128;
        ta.cmp(&tbb)
    });
    packets
}

pub fn av_media(seconds: u64) -> MediaFile {
    media(
        vec![video_stream(0, VIDEO_TB), audio_stream(1, AUDIO_TB)],
        Some(seconds),
    )
}

/// Source over a fixed packet list
pub struct FakeSource {
    media: MediaFile,
    packets: Vec<FakePacket>,
    cursor: usize,
    reads: usize,
    pub seeks: Vec<i64>,
    pub fail_seek: bool,
    /// Fail the read following this many successful reads
    pub fail_after: Option<usize>,
}

impl FakeSource {
    pub fn new(media: MediaFile, packets: Vec<FakePacket>) -> Self {
        Self {
            media,
            packets,
            cursor: 0,
            reads: 0,
            seeks: Vec::new(),
            fail_seek: false,
            fail_after: None,
        }
    }

    fn micros(&self, packet: &FakePacket) -> Option<i64> {
        let tb = self.media.stream(packet.stream)?.time_base;
        let pts = packet.pts?;
        Some(Rational::rescale(pts, tb, Rational::micros()))
    }
}

impl PacketSource for FakeSource {
    type Packet = FakePacket;
    type Parameters = FakeParams;

    fn media(&self) -> &MediaFile {
        &self.media
    }

    fn parameters(&self, stream_index: usize) -> Option<FakeParams> {
        self.media.stream(stream_index).map(|s| FakeParams {
            codec: s.codec_name.clone(),
            source_index: s.index,
        })
    }

    fn seek(&mut self, timestamp_us: i64) -> BackendResult<()> {
        self.seeks.push(timestamp_us);
        if self.fail_seek {
            return Err(BackendError::new("seek not supported"));
        }
        // Latest keyframe time at or before the target, else the first packet
        let target = self
            .packets
            .iter()
            .filter(|p| p.key)
            .filter_map(|p| self.micros(p))
            .filter(|&t| t <= timestamp_us)
            .max();
        self.cursor = target
            .and_then(|t| {
                self.packets
                    .iter()
                    .position(|p| p.key && self.micros(p) == Some(t))
            })
            .unwrap_or(0);
        Ok(())
    }

    fn read_packet(&mut self) -> BackendResult<Option<FakePacket>> {
        if self.fail_after == Some(self.reads) {
            return Err(BackendError::new("corrupt packet"));
        }
        let packet = self.packets.get(self.cursor).cloned();
        if packet.is_some() {
            self.cursor += 1;
            self.reads += 1;
        }
        Ok(packet)
    }
}

/// Everything a [`FakeSink`] received
#[derive(Debug, Default)]
pub struct SinkLog {
    pub streams: Vec<FakeParams>,
    pub header_written: bool,
    pub trailer_written: bool,
    pub packets: Vec<FakePacket>,
}

impl SinkLog {
    pub fn packets_of(&self, stream: usize) -> Vec<&FakePacket> {
        self.packets.iter().filter(|p| p.stream == stream).collect()
    }
}

/// Sink recording into a shared log
pub struct FakeSink {
    log: Rc<RefCell<SinkLog>>,
    /// Time bases the "muxer" picks when writing the header
    pub output_time_bases: HashMap<usize, Rational>,
    pub fail_write_after: Option<usize>,
    pub misnumber_streams: bool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(SinkLog::default())),
            output_time_bases: HashMap::new(),
            fail_write_after: None,
            misnumber_streams: false,
        }
    }

    pub fn log(&self) -> Rc<RefCell<SinkLog>> {
        Rc::clone(&self.log)
    }
}

impl PacketSink for FakeSink {
    type Packet = FakePacket;
    type Parameters = FakeParams;

    fn add_stream(&mut self, parameters: &FakeParams) -> BackendResult<usize> {
        let mut log = self.log.borrow_mut();
        log.streams.push(parameters.clone());
        let index = log.streams.len() - 1;
        Ok(if self.misnumber_streams { index + 1 } else { index })
    }

    fn write_header(&mut self) -> BackendResult<()> {
        self.log.borrow_mut().header_written = true;
        Ok(())
    }

    fn time_base(&self, stream_index: usize) -> Option<Rational> {
        self.output_time_bases.get(&stream_index).copied()
    }

    fn write_interleaved(&mut self, packet: FakePacket) -> BackendResult<()> {
        let mut log = self.log.borrow_mut();
        if self.fail_write_after == Some(log.packets.len()) {
            return Err(BackendError::new("disk full"));
        }
        log.packets.push(packet);
        Ok(())
    }

    fn write_trailer(&mut self) -> BackendResult<()> {
        self.log.borrow_mut().trailer_written = true;
        Ok(())
    }
}
