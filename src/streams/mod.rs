//! Stream selection module

pub mod selector;

pub use selector::StreamSelector;
