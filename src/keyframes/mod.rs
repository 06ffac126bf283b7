//! Keyframe index builder
//!
//! Walks every packet of a source once, front to back, and records the
//! presentation timestamp of each packet flagged as a random-access point.

use tracing::{debug, info, warn};

use crate::domain::model::KeyframeIndex;
use crate::error::{RemuxError, RemuxResult};
use crate::ports::{MediaPacket, PacketSource};

/// Statistics of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub packets: u64,
    pub keyframes: u64,
    /// Keyframes skipped because they carried no pts
    pub keyframes_without_pts: u64,
}

/// Sequential keyframe scanner
pub struct KeyframeScanner {
    /// Enable per-keyframe debug logging
    debug: bool,
}

impl Default for KeyframeScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeScanner {
    /// Create a new keyframe scanner
    pub fn new() -> Self {
        Self { debug: false }
    }

    /// Log every keyframe found
    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Scan a freshly opened source to the end.
    ///
    /// The source must be positioned at its first packet; the scan leaves it
    /// at end of stream, so extraction needs its own handle. On a read error
    /// the result is [`RemuxError::Scan`] carrying the keyframes found so far.
    pub fn scan<S: PacketSource>(&self, source: &mut S) -> RemuxResult<KeyframeIndex> {
        self.scan_with_stats(source).map(|(index, _)| index)
    }

    /// Same as [`KeyframeScanner::scan`], also returning scan statistics
    pub fn scan_with_stats<S: PacketSource>(
        &self,
        source: &mut S,
    ) -> RemuxResult<(KeyframeIndex, ScanStats)> {
        info!("Scanning keyframes of {}", source.media().path.display());

        let mut index = KeyframeIndex::new();
        let mut stats = ScanStats::default();

        loop {
            let packet = match source.read_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "Keyframe scan aborted after {} packets ({} keyframes): {}",
                        stats.packets, stats.keyframes, e
                    );
                    return Err(RemuxError::Scan {
                        message: e.message,
                        partial: index,
                    });
                }
            };
            stats.packets += 1;

            if packet.is_keyframe() {
                match packet.pts() {
                    Some(pts) => {
                        index.record(packet.stream_index(), pts);
                        stats.keyframes += 1;
                        if self.debug {
                            debug!("Keyframe on stream {} at pts {}", packet.stream_index(), pts);
                        }
                    }
                    None => stats.keyframes_without_pts += 1,
                }
            }
            // packet is released here
        }

        if stats.keyframes_without_pts > 0 {
            debug!(
                "Skipped {} keyframes without a pts",
                stats.keyframes_without_pts
            );
        }
        info!(
            "Keyframe scan complete: {} keyframes in {} packets across {} streams",
            stats.keyframes,
            stats.packets,
            index.streams().count()
        );

        Ok((index, stats))
    }
}
