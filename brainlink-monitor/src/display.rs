//! Display channel
//!
//! The dashboard runs on its own thread and owns all UI state; everything
//! other threads want shown is posted here as a [`DisplayEvent`]. This is
//! the only path by which the reader task, the WebSocket server, and the
//! controller reach the operator surface.

use brainlink_core::{ConnectionState, DisplaySink, Reading, TransportState};
use tokio::sync::mpsc;
use tracing::trace;

/// An update for the operator surface, marshaled onto the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Latest telemetry values
    Reading(Reading),
    /// Serial connection state changed
    SerialStatus(ConnectionState),
    /// WebSocket transport state changed
    TransportStatus(TransportState),
    /// Operator-visible alert line (connect failures, device lost)
    Alert(String),
}

/// [`DisplaySink`] that posts events to the UI thread's receiver.
///
/// Sends never block; if the UI is gone (shutdown in progress) events are
/// silently dropped so producers are not disturbed.
#[derive(Debug, Clone)]
pub struct ChannelDisplay {
    events: mpsc::UnboundedSender<DisplayEvent>,
}

impl ChannelDisplay {
    /// Create a display sink posting to the given channel
    pub fn new(events: mpsc::UnboundedSender<DisplayEvent>) -> Self {
        Self { events }
    }

    fn post(&self, event: DisplayEvent) {
        if self.events.send(event).is_err() {
            trace!("Display channel closed, dropping event");
        }
    }

    /// Update the serial status indicator
    pub fn show_serial_status(&self, state: ConnectionState) {
        self.post(DisplayEvent::SerialStatus(state));
    }

    /// Show an operator-visible alert line
    pub fn alert(&self, message: String) {
        self.post(DisplayEvent::Alert(message));
    }
}

impl DisplaySink for ChannelDisplay {
    fn show_reading(&self, reading: &Reading) {
        self.post(DisplayEvent::Reading(*reading));
    }

    fn show_transport_status(&self, state: TransportState) {
        self.post(DisplayEvent::TransportStatus(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let display = ChannelDisplay::new(tx);

        let reading = Reading {
            attention: 45,
            ..Reading::default()
        };
        display.show_reading(&reading);
        display.show_transport_status(TransportState::ClientAttached);
        display.show_serial_status(ConnectionState::Connected);
        display.alert("hello".to_string());

        assert_eq!(rx.try_recv().unwrap(), DisplayEvent::Reading(reading));
        assert_eq!(
            rx.try_recv().unwrap(),
            DisplayEvent::TransportStatus(TransportState::ClientAttached)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DisplayEvent::SerialStatus(ConnectionState::Connected)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DisplayEvent::Alert("hello".to_string())
        );
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let display = ChannelDisplay::new(tx);

        // Must not panic or propagate
        display.show_reading(&Reading::default());
        display.alert("late".to_string());
    }
}
