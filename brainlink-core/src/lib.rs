//! BrainLink Core Library
//!
//! Shared types, error taxonomy, and the reading fan-out bridge for the
//! BrainLink EEG monitor. This crate is used by both the hardware and
//! application components.

pub mod bridge;
pub mod error;
pub mod headset;
pub mod types;

// Re-export commonly used types
pub use bridge::{DisplaySink, ReadingBridge, TransportSink};
pub use error::*;
pub use headset::*;
pub use types::*;
