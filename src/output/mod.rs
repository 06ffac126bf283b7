//! Output container writing module

pub mod writer;

pub use writer::{ContainerWriter, WriterState};
