//! Serial device reader
//!
//! Owns the lifecycle of the serial connection to the headset and drives
//! the read → decode loop on a dedicated task. Disconnection is
//! cooperative: the loop checks a shared flag at each iteration, and the
//! read timeout bounds how long that check can be deferred.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use brainlink_core::{BrainLinkError, ConnectionState, DefaultHeadset, HeadsetConfig, Result};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, warn};

use crate::decoder::Decoder;

/// Asynchronous notifications from the reader loop to the operator surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The device vanished mid-read; the reader has stopped and the
    /// connection state is `Disconnected`
    Lost {
        /// Human-readable failure description for the operator alert
        reason: String,
    },
}

/// Owns the serial connection and the dedicated reader task.
///
/// Generic over [`HeadsetConfig`] for the serial link parameters. At most
/// one reader task exists at a time: a second `connect` while one is live
/// is rejected, and a task that has begun exiting is joined before a new
/// one starts.
pub struct DeviceReader<H: HeadsetConfig = DefaultHeadset> {
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    _headset: PhantomData<H>,
}

impl<H: HeadsetConfig> DeviceReader<H> {
    /// Create a reader in the `Disconnected` state
    pub fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(false)),
            task: None,
            _headset: PhantomData,
        }
    }

    /// Current serial connection state
    pub fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Whether a reader loop is currently supposed to be running
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Open the serial port and start the reader loop.
    ///
    /// On success the state transitions to `Connected` and a dedicated
    /// task runs the read → decode loop until `disconnect` is called or
    /// the device is lost. Decoded readings flow through the decoder's own
    /// callback; `events` receives the out-of-band [`DeviceEvent`]s.
    ///
    /// # Errors
    ///
    /// - [`BrainLinkError::AlreadyConnected`] if a reader loop is live.
    /// - [`BrainLinkError::Connect`] if the port cannot be opened; no task
    ///   is started and the state stays `Disconnected`.
    pub async fn connect<D>(
        &mut self,
        port_name: &str,
        decoder: D,
        events: mpsc::UnboundedSender<DeviceEvent>,
    ) -> Result<()>
    where
        D: Decoder + 'static,
    {
        if let Some(handle) = self.task.take() {
            if self.connected.load(Ordering::SeqCst) && !handle.is_finished() {
                self.task = Some(handle);
                return Err(BrainLinkError::AlreadyConnected);
            }
            // A previous loop has begun exiting; join it so two reader
            // tasks can never overlap.
            self.connected.store(false, Ordering::SeqCst);
            let _ = handle.await;
        }

        debug!("Opening serial port: {}", port_name);
        let port = tokio_serial::new(port_name, H::BAUD_RATE)
            .timeout(Duration::from_secs(H::READ_TIMEOUT_SECS))
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                error!("Failed to open serial port {}: {}", port_name, e);
                BrainLinkError::Connect(format!("Failed to open {}: {}", port_name, e))
            })?;

        info!("Serial port {} opened at {} baud", port_name, H::BAUD_RATE);
        self.connected.store(true, Ordering::SeqCst);

        let connected = self.connected.clone();
        let port_name = port_name.to_string();
        self.task = Some(tokio::spawn(async move {
            read_loop::<H, D>(port, decoder, connected, events, &port_name).await;
        }));

        Ok(())
    }

    /// Request a cooperative disconnect.
    ///
    /// Idempotent and safe to call whether or not a loop is running. The
    /// loop observes the cleared flag at its next iteration boundary, so
    /// teardown completes within one read-timeout interval.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Disconnect requested");
        }
    }

    /// Wait for the reader task to finish, if one was started
    pub async fn join(&mut self) {
        if let Some(handle) = self.task.take() {
            let _ = handle.await;
        }
    }
}

impl<H: HeadsetConfig> Default for DeviceReader<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// The read → decode loop, one instance per connection lifetime.
///
/// Reads up to `H::READ_CHUNK` bytes with the configured timeout and feeds
/// them to the decoder. A timeout is a normal zero-byte read: the loop
/// re-checks the connected flag and reads again. EOF or any I/O error
/// forces `Disconnected` and emits `DeviceEvent::Lost`; there is no
/// auto-retry.
async fn read_loop<H, D>(
    mut port: SerialStream,
    mut decoder: D,
    connected: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<DeviceEvent>,
    port_name: &str,
) where
    H: HeadsetConfig,
    D: Decoder,
{
    let mut buf = vec![0u8; H::READ_CHUNK];
    let read_timeout = Duration::from_secs(H::READ_TIMEOUT_SECS);

    debug!("Reader loop started on {}", port_name);

    while connected.load(Ordering::SeqCst) {
        match timeout(read_timeout, port.read(&mut buf)).await {
            // Zero-byte timeout: nothing arrived, go around and re-check
            // the flag
            Err(_) => continue,
            Ok(Ok(0)) => {
                lost(&connected, &events, "serial port returned EOF");
                break;
            }
            Ok(Ok(n)) => decoder.feed(&buf[..n]),
            Ok(Err(e)) => {
                lost(&connected, &events, &e.to_string());
                break;
            }
        }
    }

    debug!("Reader loop on {} exited", port_name);
    // Port handle dropped here, closing the device
}

fn lost(connected: &AtomicBool, events: &mpsc::UnboundedSender<DeviceEvent>, reason: &str) {
    warn!("Lost connection to device: {}", reason);
    connected.store(false, Ordering::SeqCst);
    let _ = events.send(DeviceEvent::Lost {
        reason: reason.to_string(),
    });
}

/// Enumerate candidate serial ports for the operator's port selector
pub fn available_ports() -> Vec<String> {
    match tokio_serial::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}
