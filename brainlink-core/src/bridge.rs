//! Reading fan-out bridge
//!
//! The single callback entry point invoked once per decoded [`Reading`],
//! fanning it out to the display and transport sinks. The two delivery
//! paths are isolated: a transport failure never interrupts display
//! updates, and neither path can unwind into the reader loop.

use crate::error::Result;
use crate::types::{Reading, TransportState};
use tracing::debug;

/// Passive latest-value surface rendered by the operator UI.
///
/// Value updates have no failure path visible to the bridge; an
/// implementation that marshals onto a UI thread must do so through a
/// non-blocking channel.
pub trait DisplaySink: Send + Sync {
    /// Publish all fields of a reading as the latest values
    fn show_reading(&self, reading: &Reading);

    /// Update the transport status indicator
    fn show_transport_status(&self, state: TransportState);
}

/// Single-client outbound message endpoint (WebSocket in production).
///
/// `send_text` must be synchronous and non-blocking; any internal
/// buffering belongs to the transport, not the caller. A send while no
/// client is attached is an error, never queued for later delivery.
///
/// A failed send detaches the failing client before returning, and only
/// that client: the transport owns the client identity, so a new client
/// attaching concurrently must never be evicted by the failure of its
/// predecessor.
pub trait TransportSink: Send + Sync {
    /// Whether a client is currently attached
    fn is_attached(&self) -> bool;

    /// Deliver one text message to the attached client.
    ///
    /// On failure the transport has already transitioned itself to
    /// `NoClient`; the caller's only remaining duty is the status update.
    fn send_text(&self, payload: String) -> Result<()>;
}

/// Fans each decoded reading out to the display and transport sinks.
///
/// Runs synchronously on the reader task. Transport delivery is
/// best-effort and at-most-once: on any send failure the dead client is
/// dropped and the status indicator updated, and the reading is discarded
/// without stalling acquisition.
#[derive(Debug, Clone)]
pub struct ReadingBridge<D, T> {
    display: D,
    transport: T,
}

impl<D: DisplaySink, T: TransportSink> ReadingBridge<D, T> {
    /// Create a new bridge over the given sinks
    pub fn new(display: D, transport: T) -> Self {
        Self { display, transport }
    }

    /// Handle one decoded reading.
    ///
    /// Called by the decoder callback, once per completed frame, in
    /// arrival order. Never returns an error and never panics on sink
    /// failures: the reader loop must continue unaffected.
    pub fn on_reading(&self, reading: &Reading) {
        self.display.show_reading(reading);

        if !self.transport.is_attached() {
            return;
        }

        let delivery = serde_json::to_string(reading)
            .map_err(Into::into)
            .and_then(|payload| self.transport.send_text(payload));

        if let Err(e) = delivery {
            // Expected and frequent: clients connect and disconnect
            // freely. The transport has dropped the dead client itself;
            // flip the indicator, no operator alert.
            debug!("Transport delivery failed, client detached: {}", e);
            self.display.show_transport_status(TransportState::NoClient);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrainLinkError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records every call the bridge makes on the display path
    #[derive(Default, Clone)]
    struct FakeDisplay {
        readings: Arc<Mutex<Vec<Reading>>>,
        statuses: Arc<Mutex<Vec<TransportState>>>,
    }

    impl DisplaySink for FakeDisplay {
        fn show_reading(&self, reading: &Reading) {
            self.readings.lock().unwrap().push(*reading);
        }

        fn show_transport_status(&self, state: TransportState) {
            self.statuses.lock().unwrap().push(state);
        }
    }

    /// Scriptable transport: attached flag, optional send failure,
    /// captured payloads. Honors the sink contract: a failing send
    /// detaches the client itself.
    #[derive(Default, Clone)]
    struct FakeTransport {
        attached: Arc<AtomicBool>,
        fail_sends: Arc<AtomicBool>,
        sent: Arc<Mutex<Vec<String>>>,
        send_attempts: Arc<AtomicUsize>,
    }

    impl FakeTransport {
        fn attached() -> Self {
            let t = Self::default();
            t.attached.store(true, Ordering::SeqCst);
            t
        }
    }

    impl TransportSink for FakeTransport {
        fn is_attached(&self) -> bool {
            self.attached.load(Ordering::SeqCst)
        }

        fn send_text(&self, payload: String) -> Result<()> {
            self.send_attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_sends.load(Ordering::SeqCst) {
                self.attached.store(false, Ordering::SeqCst);
                return Err(BrainLinkError::TransportSend(
                    "connection reset".to_string(),
                ));
            }
            self.sent.lock().unwrap().push(payload);
            Ok(())
        }
    }

    fn sample_reading() -> Reading {
        Reading {
            signal: 200,
            attention: 45,
            meditation: 60,
            ..Reading::default()
        }
    }

    #[test]
    fn test_display_receives_each_reading_once_in_order() {
        let display = FakeDisplay::default();
        let bridge = ReadingBridge::new(display.clone(), FakeTransport::default());

        let readings: Vec<Reading> = (0..5)
            .map(|i| Reading {
                attention: i,
                ..Reading::default()
            })
            .collect();

        for r in &readings {
            bridge.on_reading(r);
        }

        assert_eq!(*display.readings.lock().unwrap(), readings);
    }

    #[test]
    fn test_attached_client_gets_one_send_with_all_keys() {
        let display = FakeDisplay::default();
        let transport = FakeTransport::attached();
        let bridge = ReadingBridge::new(display, transport.clone());

        bridge.on_reading(&sample_reading());

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            r#"{"Signal":200,"Attention":45,"Meditation":60,"Delta":0,"Theta":0,"LowAlpha":0,"HighAlpha":0,"LowBeta":0,"HighBeta":0,"LowGamma":0,"HighGamma":0}"#
        );
    }

    #[test]
    fn test_no_client_means_no_send_attempt() {
        let display = FakeDisplay::default();
        let transport = FakeTransport::default();
        let bridge = ReadingBridge::new(display.clone(), transport.clone());

        bridge.on_reading(&sample_reading());

        assert_eq!(transport.send_attempts.load(Ordering::SeqCst), 0);
        // Display still updated
        assert_eq!(display.readings.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_send_failure_flips_status() {
        let display = FakeDisplay::default();
        let transport = FakeTransport::attached();
        transport.fail_sends.store(true, Ordering::SeqCst);
        let bridge = ReadingBridge::new(display.clone(), transport.clone());

        bridge.on_reading(&sample_reading());

        assert!(!transport.is_attached());
        assert_eq!(
            *display.statuses.lock().unwrap(),
            vec![TransportState::NoClient]
        );
    }

    #[test]
    fn test_send_failure_does_not_evict_a_replacement_client() {
        let display = FakeDisplay::default();
        let transport = FakeTransport::attached();
        transport.fail_sends.store(true, Ordering::SeqCst);
        let bridge = ReadingBridge::new(display.clone(), transport.clone());

        bridge.on_reading(&sample_reading());

        // A new client attaches right after the failed delivery. The
        // bridge issues no detach of its own, so the newcomer stays and
        // the next reading reaches it.
        transport.fail_sends.store(false, Ordering::SeqCst);
        transport.attached.store(true, Ordering::SeqCst);

        bridge.on_reading(&sample_reading());

        assert!(transport.is_attached());
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_send_failure_does_not_disturb_next_reading() {
        let display = FakeDisplay::default();
        let transport = FakeTransport::attached();
        transport.fail_sends.store(true, Ordering::SeqCst);
        let bridge = ReadingBridge::new(display.clone(), transport.clone());

        bridge.on_reading(&sample_reading());
        // Client gone now; next reading still reaches the display with no
        // further send attempts.
        bridge.on_reading(&sample_reading());

        assert_eq!(display.readings.lock().unwrap().len(), 2);
        assert_eq!(transport.send_attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_display_updated_before_transport_failure_handling() {
        let display = FakeDisplay::default();
        let transport = FakeTransport::attached();
        transport.fail_sends.store(true, Ordering::SeqCst);
        let bridge = ReadingBridge::new(display.clone(), transport);

        bridge.on_reading(&sample_reading());

        // The reading reached the display even though the send failed
        assert_eq!(display.readings.lock().unwrap().len(), 1);
    }
}
