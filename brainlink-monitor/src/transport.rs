//! WebSocket transport sink
//!
//! Holds the single active client as an outbound message queue into the
//! socket task. The bridge sends through this slot synchronously and
//! without blocking; the socket task drains the queue and owns the actual
//! WebSocket I/O. A newly attached client replaces the previous sender
//! (last-writer-wins); sends with no client attached are errors, never
//! buffered. A send that fails clears exactly the sender it failed on,
//! under the slot lock, so a concurrently attaching client is never
//! evicted by its predecessor's death.

use std::sync::{Arc, Mutex};

use brainlink_core::{BrainLinkError, Result, TransportSink};
use tokio::sync::mpsc;
use tracing::debug;

type ClientSender = mpsc::UnboundedSender<String>;

/// Shared single-client transport slot.
///
/// Cloned into the bridge (reader task) and the WebSocket server (its own
/// context); the inner mutex is held only for pointer-sized operations and
/// never across an await.
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    slot: Arc<Mutex<Option<ClientSender>>>,
}

impl WsTransport {
    /// Create an empty transport slot (`NoClient`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a client sender, replacing any previous one.
    ///
    /// The replaced client's socket task notices on its next keep-alive
    /// poll and closes itself.
    pub fn attach(&self, sender: ClientSender) {
        let previous = self.slot.lock().unwrap().replace(sender);
        if previous.is_some() {
            debug!("New client replaced an attached one");
        }
    }

    /// Whether `sender` is the currently attached client
    pub fn is_holder(&self, sender: &ClientSender) -> bool {
        self.slot
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|current| current.same_channel(sender))
    }

    /// Clear the slot only if `sender` still owns it.
    ///
    /// Returns `true` if the slot was cleared; `false` means a newer
    /// client had already replaced this one and must not be detached.
    pub fn detach_if_holder(&self, sender: &ClientSender) -> bool {
        let mut guard = self.slot.lock().unwrap();
        if guard.as_ref().is_some_and(|c| c.same_channel(sender)) {
            *guard = None;
            true
        } else {
            false
        }
    }
}

impl TransportSink for WsTransport {
    fn is_attached(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    fn send_text(&self, payload: String) -> Result<()> {
        let mut guard = self.slot.lock().unwrap();
        match guard.as_ref() {
            None => Err(BrainLinkError::NoClient),
            Some(sender) => match sender.send(payload) {
                Ok(()) => Ok(()),
                Err(_) => {
                    // The queue is closed, so this sender is dead. Clear
                    // it while still holding the lock: a newer client
                    // attaching right after the failure keeps the slot.
                    debug!("Client queue closed, clearing slot");
                    *guard = None;
                    Err(BrainLinkError::TransportSend(
                        "client queue closed".to_string(),
                    ))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_with_no_client_is_error() {
        let transport = WsTransport::new();

        assert!(!transport.is_attached());
        assert!(matches!(
            transport.send_text("{}".to_string()),
            Err(BrainLinkError::NoClient)
        ));
    }

    #[test]
    fn test_send_reaches_attached_client() {
        let transport = WsTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.attach(tx);

        transport.send_text("payload".to_string()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), "payload");
    }

    #[test]
    fn test_closed_queue_turns_send_into_error_and_clears_slot() {
        let transport = WsTransport::new();
        let (tx, rx) = mpsc::unbounded_channel();
        transport.attach(tx);
        drop(rx);

        assert!(matches!(
            transport.send_text("{}".to_string()),
            Err(BrainLinkError::TransportSend(_))
        ));
        assert!(!transport.is_attached());
    }

    #[test]
    fn test_failed_send_spares_a_replacement_client() {
        let transport = WsTransport::new();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        transport.attach(dead_tx);
        drop(dead_rx);

        // The dead client is cleared by its own failed send; a client
        // attaching afterwards must not be evicted by that failure.
        assert!(transport.send_text("stale".to_string()).is_err());

        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.attach(tx.clone());

        transport.send_text("fresh".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "fresh");
        assert!(transport.is_holder(&tx));
    }

    #[test]
    fn test_last_writer_wins_replacement() {
        let transport = WsTransport::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        transport.attach(tx1.clone());
        transport.attach(tx2.clone());

        transport.send_text("for-two".to_string()).unwrap();

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), "for-two");
        assert!(!transport.is_holder(&tx1));
        assert!(transport.is_holder(&tx2));
    }

    #[test]
    fn test_detach_if_holder_spares_newer_client() {
        let transport = WsTransport::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        transport.attach(tx1.clone());
        transport.attach(tx2.clone());

        // The replaced client cleaning up after itself must not detach
        // the newer one
        assert!(!transport.detach_if_holder(&tx1));
        assert!(transport.is_attached());

        assert!(transport.detach_if_holder(&tx2));
        assert!(!transport.is_attached());
    }
}
