//! WebSocket handler — the canvas protocol endpoint.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, registers it (which queues the
//! history snapshot), and enters a `select!` loop:
//! - Incoming text frames → decode + dispatch
//! - Frames queued by the broadcast hub → forward to the socket
//!
//! Inbound handling never replies. A frame that fails to decode is logged
//! and dropped; the sender is not told.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register → `history` is the first frame out
//! 2. `stroke` → append + fan out to all; `stroke-update` → relay to others
//! 3. Close or transport error → unregister, nothing broadcast

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{self, ErrorCode, Frame};
use crate::services;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// What an inbound frame did. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Finalized stroke appended at this log index.
    Appended(usize),
    /// Preview relayed to this many peers.
    Relayed(usize),
    /// Malformed or wrong-direction frame, discarded.
    Dropped,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel fed by the broadcast hub.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.client_channel_capacity);

    if let Err(e) = services::session::register(&state, client_id, client_tx).await {
        warn!(%client_id, error = %e, "ws: registration failed");
        return;
    }
    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => match process_inbound_text(&state, client_id, text.as_str()).await {
                        Outcome::Appended(index) => debug!(%client_id, index, "ws: stroke appended"),
                        Outcome::Relayed(peers) => debug!(%client_id, peers, "ws: preview relayed"),
                        Outcome::Dropped => {}
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if let Err(e) = send_frame(&mut socket, &frame).await {
                    debug!(%client_id, error = %e, "ws: socket send failed");
                    break;
                }
            }
        }
    }

    services::session::unregister(&state, client_id).await;
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode one inbound text frame and apply it.
///
/// Kept apart from the socket so tests can drive dispatch directly.
async fn process_inbound_text(state: &AppState, client_id: Uuid, text: &str) -> Outcome {
    let frame = match frame::decode(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(%client_id, code = e.error_code(), error = %e, "ws: dropped inbound frame");
            return Outcome::Dropped;
        }
    };

    match frame {
        Frame::Stroke { stroke, sender_id } => {
            Outcome::Appended(services::stroke::append(state, stroke, sender_id).await)
        }
        Frame::StrokeUpdate { stroke, sender_id } => {
            Outcome::Relayed(services::stroke::relay_preview(state, client_id, sender_id, stroke).await)
        }
        Frame::History { .. } => {
            warn!(%client_id, "ws: dropped client-sent history");
            Outcome::Dropped
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let json = match frame::encode(frame) {
        Ok(j) => j,
        Err(e) => {
            // A frame we built ourselves; skip it rather than drop the connection.
            warn!(code = e.error_code(), error = %e, kind = frame.kind(), "ws: failed to serialize frame");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
