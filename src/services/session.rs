//! Session registry — who is connected right now.
//!
//! DESIGN
//! ======
//! Registration enqueues the history snapshot on the new participant's
//! channel and inserts the channel into the canvas under the same write
//! lock that `stroke::append` takes. A concurrent append therefore lands
//! either in the snapshot or in the channel after it, never both and never
//! neither. Since the channel is FIFO, history is always the first frame.
//!
//! Unregistering synthesizes nothing. Peers showing a preview from the
//! departed participant stop receiving updates and evict it themselves.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::frame::Frame;
use crate::services::stroke::history_frame;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection {0} closed before history delivery")]
    HistoryUndeliverable(Uuid),
}

/// Register a connection and queue its history snapshot.
/// Returns the number of strokes in the snapshot.
///
/// # Errors
///
/// Returns `HistoryUndeliverable` if the connection's channel cannot accept
/// the snapshot; the connection is then not registered.
pub async fn register(state: &AppState, client_id: Uuid, tx: mpsc::Sender<Frame>) -> Result<usize, SessionError> {
    let mut canvas = state.canvas.write().await;
    let history = history_frame(&canvas);
    let count = canvas.log.len();

    tx.try_send(history)
        .map_err(|_| SessionError::HistoryUndeliverable(client_id))?;
    canvas.clients.insert(client_id, tx);

    info!(%client_id, history = count, clients = canvas.clients.len(), "session: registered");
    Ok(count)
}

/// Remove a connection. Returns whether it was registered.
pub async fn unregister(state: &AppState, client_id: Uuid) -> bool {
    let mut canvas = state.canvas.write().await;
    let removed = canvas.clients.remove(&client_id).is_some();
    if removed {
        info!(%client_id, remaining = canvas.clients.len(), "session: unregistered");
    }
    removed
}

pub async fn connected_count(state: &AppState) -> usize {
    state.canvas.read().await.clients.len()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
