//! Participant — one drawing client's event handling, transport excluded.
//!
//! Ties the sync engine to the preview publisher. Every event (local input,
//! inbound text, publisher tick, stale sweep) goes through `&mut self`, so
//! they are processed strictly one at a time. Handlers return the frames to
//! send; the connection layer owns the socket.

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::publisher::PreviewPublisher;
use crate::client::sync::{Applied, Scene, SyncEngine};
use crate::config::ClientConfig;
use crate::frame::{self, ErrorCode, Frame, Point, SenderId, Stroke};

/// Local pointer input, already translated to world space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawInput {
    Begin { point: Point, color: String, width: f64 },
    Extend(Point),
    /// Pointer released.
    End,
    /// Pointer cancelled. Finalizes the stroke like `End`.
    Cancel,
}

#[derive(Debug)]
pub struct Participant {
    engine: SyncEngine,
    publisher: PreviewPublisher,
    config: ClientConfig,
}

impl Participant {
    /// New participant with a freshly generated sender id.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_sender_id(SenderId::generate(), config)
    }

    #[must_use]
    pub fn with_sender_id(sender_id: SenderId, config: ClientConfig) -> Self {
        Self {
            engine: SyncEngine::new(sender_id),
            publisher: PreviewPublisher::new(config.preview_interval),
            config,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        self.engine.scene()
    }

    /// Apply one local input event. Returns frames to send, in order.
    pub fn handle_input(&mut self, input: DrawInput) -> Vec<Frame> {
        match input {
            DrawInput::Begin { point, color, width } => {
                // A begin without an end still finalizes the earlier gesture.
                let out = self.finish_gesture().into_iter().collect();
                self.engine.begin_stroke(point, color, width);
                self.publisher.start();
                out
            }
            DrawInput::Extend(point) => {
                self.engine.extend_stroke(point);
                Vec::new()
            }
            DrawInput::End | DrawInput::Cancel => self.finish_gesture().into_iter().collect(),
        }
    }

    /// Stop the publisher and finalize the active stroke, if any.
    pub fn finish_gesture(&mut self) -> Option<Frame> {
        self.publisher.stop();
        if let Some(Err(e)) = self.engine.active().map(Stroke::validate) {
            warn!(code = e.error_code(), error = %e, "participant: discarded invalid stroke");
        }
        self.engine.finish_stroke()
    }

    /// Wait for the next publisher period. Pending forever while idle.
    pub async fn next_tick(&mut self) {
        self.publisher.tick().await;
    }

    /// Build the preview for the current period. Nothing while idle.
    #[must_use]
    pub fn handle_tick(&self) -> Option<Frame> {
        if !self.publisher.is_active() {
            return None;
        }
        self.engine.preview_frame()
    }

    /// Decode and apply one inbound text frame. Malformed input is dropped.
    pub fn handle_text(&mut self, text: &str, now: Instant) -> Option<Applied> {
        match frame::decode(text) {
            Ok(frame) => {
                let applied = self.engine.apply(frame, now);
                debug!(?applied, "participant: applied frame");
                Some(applied)
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "participant: dropped inbound frame");
                None
            }
        }
    }

    /// Evict previews from senders that went quiet. Returns how many.
    pub fn prune(&mut self, now: Instant) -> usize {
        self.engine
            .prune_stale_previews(now, self.config.preview_stale_after)
    }
}

#[cfg(test)]
#[path = "participant_test.rs"]
mod tests;
