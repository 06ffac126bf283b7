//! Error handling module for rangemux

use thiserror::Error;

use crate::domain::model::KeyframeIndex;

/// Main error type for rangemux operations
#[derive(Error, Debug)]
pub enum RemuxError {
    /// Source or destination container could not be opened or created
    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    /// The requested start position could not be located
    #[error("Failed to seek to {seconds:.3}s: {message}")]
    Seek { seconds: f64, message: String },

    /// Demux failure other than a clean end of stream
    #[error("Failed to read packet after {packets_read} packets: {message}")]
    Read { packets_read: u64, message: String },

    /// Mux, write or flush failure
    #[error("Failed to write output{}: {message}", stream_suffix(.stream_index))]
    Write {
        stream_index: Option<usize>,
        message: String,
    },

    /// Keyframe scan aborted early; the index gathered so far is kept
    #[error("Keyframe scan aborted after {} keyframes: {message}", .partial.len())]
    Scan {
        message: String,
        partial: KeyframeIndex,
    },

    /// Time range validation error
    #[error("Invalid time range: start ({start}) must be non-negative and less than end ({end})")]
    InvalidTimeRange { start: String, end: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// Stream processing error
    #[error("Stream processing error: {message}")]
    Stream { message: String },

    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInit { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Job did not finish in time
    #[error("Job timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

fn stream_suffix(stream_index: &Option<usize>) -> String {
    match stream_index {
        Some(index) => format!(" (stream {})", index),
        None => String::new(),
    }
}

impl RemuxError {
    /// Partial keyframe index carried by a scan failure
    pub fn partial_keyframes(&self) -> Option<&KeyframeIndex> {
        match self {
            RemuxError::Scan { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Result type alias for rangemux operations
pub type RemuxResult<T> = std::result::Result<T, RemuxError>;
