//! Time-range remux engine

pub mod extractor;
pub mod job;
pub mod normalizer;

pub use extractor::{ExtractionReport, ExtractionState, RangeExtractor, StreamReport};
pub use job::RemuxJob;
pub use normalizer::{Normalized, TimestampNormalizer};
