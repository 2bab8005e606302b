//! Headset hardware abstraction layer
//!
//! Compile-time device parameters for the supported headset variants.
//! The device reader is generic over [`HeadsetConfig`], so adding a new
//! headset model is a matter of implementing the trait with its serial
//! characteristics.

/// Headset hardware configuration trait
///
/// Each headset variant implements this trait to define its serial link
/// parameters.
pub trait HeadsetConfig: Send + Sync + 'static {
    /// Human-readable headset name
    const NAME: &'static str;

    /// Serial communication baud rate
    const BAUD_RATE: u32;

    /// Maximum bytes pulled from the port per read
    const READ_CHUNK: usize;

    /// Blocking-read timeout in seconds; also bounds how long a
    /// cooperative disconnect can take to be observed
    const READ_TIMEOUT_SECS: u64;
}

/// BrainLink Pro headset configuration
///
/// The standard Macrotellect BrainLink device: 115200 baud, ThinkGear
/// byte stream, polled in 512-byte chunks with a 2 second read timeout.
pub struct BrainLinkPro;

impl HeadsetConfig for BrainLinkPro {
    const NAME: &'static str = "BrainLink Pro";
    const BAUD_RATE: u32 = 115_200;
    const READ_CHUNK: usize = 512;
    const READ_TIMEOUT_SECS: u64 = 2;
}

/// Default headset type used throughout the codebase
pub type DefaultHeadset = BrainLinkPro;
