//! Broadcast hub — fire-and-forget fan-out to connected participants.
//!
//! DESIGN
//! ======
//! Callers pass the `CanvasState` they already hold locked, so a fan-out is
//! part of the same critical section as the mutation that caused it. Sends
//! use `try_send` and never await: a closed or full recipient channel is that
//! participant's loss and does not delay anyone else.

use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;
use uuid::Uuid;

use crate::frame::Frame;
use crate::state::CanvasState;

/// Send a frame to every connected participant, optionally excluding one.
/// Returns how many recipients accepted the frame.
pub fn broadcast(canvas: &CanvasState, frame: &Frame, exclude: Option<Uuid>) -> usize {
    let mut delivered = 0;
    for (client_id, tx) in &canvas.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        match tx.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                debug!(%client_id, kind = frame.kind(), "broadcast: channel full, skipped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%client_id, kind = frame.kind(), "broadcast: channel closed, skipped");
            }
        }
    }
    delivered
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
