//! Error types for the BrainLink monitor

use thiserror::Error;

/// Core error type for BrainLink monitor operations
#[derive(Error, Debug)]
pub enum BrainLinkError {
    /// Serial port could not be opened (device absent, permission denied,
    /// already in use)
    #[error("Connect failed: {0}")]
    Connect(String),

    /// A reader is already running for this device
    #[error("Already connected")]
    AlreadyConnected,

    /// I/O failure during an active read; forces a disconnect
    #[error("Device lost: {0}")]
    DeviceLost(String),

    /// Failure to deliver a reading to the attached transport client
    #[error("Transport send failed: {0}")]
    TransportSend(String),

    /// No transport client is attached
    #[error("No transport client attached")]
    NoClient,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for BrainLink monitor operations
pub type Result<T> = std::result::Result<T, BrainLinkError>;

impl From<serde_json::Error> for BrainLinkError {
    fn from(err: serde_json::Error) -> Self {
        BrainLinkError::Serialization(err.to_string())
    }
}
