//! WebSocket server
//!
//! Serves the single `/eeg` endpoint on the loopback interface. One client
//! is tracked at a time: a new connection takes over the transport slot
//! and the replaced socket task closes itself on its next keep-alive poll.
//! The server never sends anything except the forwarded readings, and
//! ignores everything the client sends.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use brainlink_core::{DisplaySink, TransportState, KEEPALIVE_POLL_MS, WS_BIND_ADDR, WS_PATH};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::display::ChannelDisplay;
use crate::transport::WsTransport;

/// State shared with the upgrade handler
#[derive(Clone)]
struct ServerState {
    transport: WsTransport,
    display: ChannelDisplay,
}

/// Build the router with the single WebSocket route
pub fn create_router(transport: WsTransport, display: ChannelDisplay) -> Router {
    let state = ServerState { transport, display };

    Router::new()
        .route(WS_PATH, get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the loopback endpoint and serve until the process exits
pub async fn serve(transport: WsTransport, display: ChannelDisplay) -> anyhow::Result<()> {
    let app = create_router(transport, display);
    let listener = tokio::net::TcpListener::bind(WS_BIND_ADDR).await?;
    info!("WebSocket endpoint listening on ws://{}{}", WS_BIND_ADDR, WS_PATH);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per-connection task: owns the socket for its lifetime.
///
/// Outbound readings arrive through the transport slot's queue; inbound
/// messages are drained and ignored. The periodic poll detects that a
/// newer client has taken over the slot, in which case this connection
/// closes itself without touching the slot.
async fn handle_socket(mut socket: WebSocket, state: ServerState) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.transport.attach(tx.clone());
    state
        .display
        .show_transport_status(TransportState::ClientAttached);
    info!("WebSocket client attached");

    let mut poll = tokio::time::interval(Duration::from_millis(KEEPALIVE_POLL_MS));

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(text) = outbound else { break };
                if socket.send(Message::Text(text)).await.is_err() {
                    debug!("WebSocket send failed, closing connection");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    // Client-to-server messages are ignored
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket receive error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
            _ = poll.tick() => {
                if !state.transport.is_holder(&tx) {
                    debug!("Replaced by a newer client, closing connection");
                    break;
                }
            }
        }
    }

    if state.transport.detach_if_holder(&tx) {
        state
            .display
            .show_transport_status(TransportState::NoClient);
    }
    info!("WebSocket client detached");
}
