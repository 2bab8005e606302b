//! Core types and data structures for the BrainLink monitor

use serde::{Deserialize, Serialize};

/// WebSocket endpoint bind address
pub const WS_BIND_ADDR: &str = "127.0.0.1:8000";

/// WebSocket endpoint path
pub const WS_PATH: &str = "/eeg";

/// Idle-poll interval of the transport keep-alive loop, in milliseconds
pub const KEEPALIVE_POLL_MS: u64 = 100;

/// One decoded EEG telemetry sample.
///
/// Produced once per decoded frame, fanned out to the display and transport
/// sinks, then discarded. Serializes to the wire record expected by
/// downstream WebSocket consumers: a JSON object with exactly the keys
/// `Signal, Attention, Meditation, Delta, Theta, LowAlpha, HighAlpha,
/// LowBeta, HighBeta, LowGamma, HighGamma`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reading {
    /// Poor-signal quality (0 = good contact, 200 = no contact)
    pub signal: u8,
    /// eSense attention level (0-100)
    pub attention: u8,
    /// eSense meditation level (0-100)
    pub meditation: u8,
    /// Delta band power (0.5-2.75 Hz)
    pub delta: u32,
    /// Theta band power (3.5-6.75 Hz)
    pub theta: u32,
    /// Low alpha band power (7.5-9.25 Hz)
    pub low_alpha: u32,
    /// High alpha band power (10-11.75 Hz)
    pub high_alpha: u32,
    /// Low beta band power (13-16.75 Hz)
    pub low_beta: u32,
    /// High beta band power (18-29.75 Hz)
    pub high_beta: u32,
    /// Low gamma band power (31-39.75 Hz)
    pub low_gamma: u32,
    /// High gamma band power (41-49.75 Hz)
    pub high_gamma: u32,
}

/// Metric names in display order, matching the wire keys.
pub const METRIC_NAMES: [&str; 11] = [
    "Signal",
    "Attention",
    "Meditation",
    "Delta",
    "Theta",
    "LowAlpha",
    "HighAlpha",
    "LowBeta",
    "HighBeta",
    "LowGamma",
    "HighGamma",
];

impl Reading {
    /// Field values in display order, paired with [`METRIC_NAMES`].
    pub fn values(&self) -> [u32; 11] {
        [
            u32::from(self.signal),
            u32::from(self.attention),
            u32::from(self.meditation),
            self.delta,
            self.theta,
            self.low_alpha,
            self.high_alpha,
            self.low_beta,
            self.high_beta,
            self.low_gamma,
            self.high_gamma,
        ]
    }
}

/// Serial connection state, owned by the device reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No device connected, no reader running
    #[default]
    Disconnected,
    /// Device connected, reader loop running
    Connected,
}

impl ConnectionState {
    /// Get a string representation for the operator surface
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
        }
    }
}

/// Transport client state, owned by the transport sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No WebSocket client attached
    #[default]
    NoClient,
    /// One WebSocket client attached and reachable
    ClientAttached,
}

impl TransportState {
    /// Get a string representation for the status indicator
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::ClientAttached => "Connected",
            TransportState::NoClient => "Disconnected",
        }
    }
}
