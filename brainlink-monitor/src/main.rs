//! BrainLink EEG Monitor
//!
//! Reads EEG telemetry from a serial-connected BrainLink headset, shows
//! the live values on a terminal dashboard, and republishes each reading
//! over a local WebSocket endpoint for downstream consumers.
//!
//! Thread/task layout:
//! - the main thread runs the dashboard (owner of all UI state);
//! - a controller task owns the device reader and executes UI commands;
//! - the WebSocket server task accepts the single downstream client;
//! - one reader task per connection runs read → decode → fan-out.

mod display;
mod server;
mod transport;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use brainlink_core::{ConnectionState, DefaultHeadset, ReadingBridge};
use brainlink_hardware::{DeviceEvent, DeviceReader, ThinkGearDecoder};
use display::ChannelDisplay;
use tokio::sync::mpsc;
use tracing::{info, warn};
use transport::WsTransport;
use ui::AppCommand;

/// Log file next to the binary; the dashboard owns the terminal, so
/// nothing may log to stdout
const LOG_FILE: &str = "brainlink-monitor.log";

fn main() -> Result<()> {
    init_tracing()?;
    info!("BrainLink monitor starting...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (display_tx, display_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let display = ChannelDisplay::new(display_tx);
    let transport = WsTransport::new();

    runtime.spawn({
        let transport = transport.clone();
        let display = display.clone();
        async move {
            if let Err(e) = server::serve(transport, display).await {
                warn!("WebSocket server stopped: {}", e);
            }
        }
    });

    let controller = runtime.spawn(run_controller(command_rx, display, transport));

    // The dashboard blocks this thread until the operator quits; its final
    // act is sending `Quit`, which the controller uses to wind down.
    ui::run_dashboard(display_rx, command_tx)?;

    let _ = runtime.block_on(controller);
    runtime.shutdown_timeout(Duration::from_secs(3));
    info!("BrainLink monitor stopped");
    Ok(())
}

/// Owns the device reader; executes UI commands and routes device events
/// to the operator surface.
async fn run_controller(
    mut commands: mpsc::UnboundedReceiver<AppCommand>,
    display: ChannelDisplay,
    transport: WsTransport,
) {
    let mut reader = DeviceReader::<DefaultHeadset>::new();
    let (device_tx, mut device_rx) = mpsc::unbounded_channel();
    let bridge = ReadingBridge::new(display.clone(), transport);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    AppCommand::Connect(port) => {
                        let bridge = bridge.clone();
                        let decoder = ThinkGearDecoder::new(move |reading| {
                            bridge.on_reading(&reading);
                        });
                        match reader.connect(&port, decoder, device_tx.clone()).await {
                            Ok(()) => {
                                info!("Connected to {}", port);
                                display.show_serial_status(ConnectionState::Connected);
                            }
                            Err(e) => {
                                warn!("Connect to {} failed: {}", port, e);
                                display.alert(format!("Could not connect: {}", e));
                            }
                        }
                    }
                    AppCommand::Disconnect => {
                        reader.disconnect();
                        display.show_serial_status(ConnectionState::Disconnected);
                    }
                    AppCommand::Quit => {
                        reader.disconnect();
                        break;
                    }
                }
            }
            event = device_rx.recv() => {
                // The sender half lives in this task, so recv never
                // yields None here
                if let Some(DeviceEvent::Lost { reason }) = event {
                    display.show_serial_status(ConnectionState::Disconnected);
                    display.alert(format!("Lost connection to device: {}", reason));
                }
            }
        }
    }

    // Let the reader loop observe the cleared flag and exit
    reader.join().await;
    info!("Controller stopped");
}

/// Initialize the tracing subscriber, writing to a log file.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_file = Arc::new(std::fs::File::create(LOG_FILE)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .init();
    Ok(())
}
