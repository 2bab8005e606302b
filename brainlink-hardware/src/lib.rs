//! brainlink-hardware
//!
//! Hardware abstraction crate containing the low-level serial device reader
//! and the ThinkGear byte-stream decoder. This crate is used by the monitor
//! application to acquire telemetry from a BrainLink headset.
//
//! Public API:
//! - `reader::DeviceReader` — owns the serial connection and the read loop
//! - `decoder::ThinkGearDecoder` — turns raw bytes into `Reading`s
//! - `reader::available_ports` — helper to enumerate candidate serial ports

pub mod decoder;
pub mod reader;

pub use decoder::{Decoder, ThinkGearDecoder};
pub use reader::{available_ports, DeviceEvent, DeviceReader};
