//! Stroke service — the only path into the stroke log.
//!
//! DESIGN
//! ======
//! `append` takes the canvas write lock, appends, and fans the stroke out
//! before releasing it. Two appends can never interleave, so append order is
//! arrival order and every participant's channel receives strokes in log
//! order. Previews are relayed under a read lock and never touch the log.
//!
//! The originator of a finalized stroke is included in its fan-out; it uses
//! the echo to retire its optimistic copy. A preview is never echoed back.

use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::{Frame, SenderId, Stroke};
use crate::services::broadcast::broadcast;
use crate::state::{AppState, CanvasState};

/// Append a finalized stroke and fan it out to every connected participant.
/// Returns the stroke's index in the log.
pub async fn append(state: &AppState, stroke: Stroke, sender_id: Option<SenderId>) -> usize {
    let mut canvas = state.canvas.write().await;
    let index = canvas.log.append(stroke.clone());
    let delivered = broadcast(&canvas, &Frame::stroke(stroke, sender_id), None);
    info!(index, delivered, "stroke: appended");
    index
}

/// Relay a preview to every participant except the originating connection.
/// Returns how many recipients accepted it.
pub async fn relay_preview(state: &AppState, origin: Uuid, sender_id: SenderId, stroke: Stroke) -> usize {
    let canvas = state.canvas.read().await;
    let points = stroke.len();
    let delivered = broadcast(&canvas, &Frame::preview(stroke, sender_id), Some(origin));
    debug!(%origin, points, delivered, "stroke: relayed preview");
    delivered
}

/// Full current log, oldest first.
pub async fn snapshot_history(state: &AppState) -> Vec<Stroke> {
    state.canvas.read().await.log.snapshot()
}

/// The history frame for a canvas the caller already holds locked.
pub(crate) fn history_frame(canvas: &CanvasState) -> Frame {
    Frame::history(canvas.log.snapshot())
}

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;
