// Adapters - External system implementations

pub mod libav;

pub use libav::{LibavPacket, LibavSink, LibavSource};
