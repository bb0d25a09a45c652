//! Client sync engine — reconciles local drawing with the shared log.
//!
//! DESIGN
//! ======
//! Three pools, rendered independently:
//! - `history`: mirrors the server's stroke log once caught up.
//! - local optimistic strokes: the active gesture plus own strokes that were
//!   finalized but whose echo has not come back yet.
//! - `previews`: the latest in-progress snapshot from each remote sender.
//!
//! The engine is plain data. It is driven one event at a time by a single
//! owner, so nothing here locks.
//!
//! Own strokes leave the optimistic pool when the server echoes them back.
//! An echo retires the oldest unacknowledged stroke equal to it, so a
//! skipped echo strands only its own stroke. History therefore matches the
//! log exactly and an own stroke is never shown twice.
//!
//! A local stroke that fails structural validation is never queued or sent:
//! the server would drop it and no echo would ever retire it.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::frame::{Frame, Point, SenderId, Stroke};

// =============================================================================
// TYPES
// =============================================================================

/// How a stroke should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Full,
    /// Remote in-progress strokes: drawn visibly subdued.
    Reduced,
}

/// Result of applying one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    HistoryReplaced { strokes: usize },
    Finalized { index: usize, own: bool },
    PreviewUpdated,
    /// A preview carrying our own sender id.
    Ignored,
}

#[derive(Debug, Clone)]
struct Preview {
    stroke: Stroke,
    refreshed_at: Instant,
}

/// Owned copy of every pool, for whatever renders the canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub history: Vec<Stroke>,
    pub optimistic: Vec<Stroke>,
    /// Remote previews ordered by sender id.
    pub previews: Vec<(SenderId, Stroke)>,
    pub active: Option<Stroke>,
}

impl Scene {
    /// Every stroke in paint order with its emphasis.
    pub fn items(&self) -> impl Iterator<Item = (&Stroke, Emphasis)> {
        self.history
            .iter()
            .chain(&self.optimistic)
            .map(|s| (s, Emphasis::Full))
            .chain(self.previews.iter().map(|(_, s)| (s, Emphasis::Reduced)))
            .chain(self.active.iter().map(|s| (s, Emphasis::Full)))
    }
}

// =============================================================================
// ENGINE
// =============================================================================

#[derive(Debug)]
pub struct SyncEngine {
    self_id: SenderId,
    history: Vec<Stroke>,
    unacked: VecDeque<Stroke>,
    active: Option<Stroke>,
    previews: HashMap<SenderId, Preview>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(self_id: SenderId) -> Self {
        Self {
            self_id,
            history: Vec::new(),
            unacked: VecDeque::new(),
            active: None,
            previews: HashMap::new(),
        }
    }

    #[must_use]
    pub fn self_id(&self) -> &SenderId {
        &self.self_id
    }

    #[must_use]
    pub fn history(&self) -> &[Stroke] {
        &self.history
    }

    #[must_use]
    pub fn active(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    /// Own strokes sent but not yet echoed by the server.
    #[must_use]
    pub fn unacked_len(&self) -> usize {
        self.unacked.len()
    }

    #[must_use]
    pub fn preview(&self, sender: &SenderId) -> Option<&Stroke> {
        self.previews.get(sender).map(|p| &p.stroke)
    }

    #[must_use]
    pub fn preview_count(&self) -> usize {
        self.previews.len()
    }

    // -------------------------------------------------------------------------
    // inbound
    // -------------------------------------------------------------------------

    /// Apply one inbound frame. Frames must be applied in arrival order.
    pub fn apply(&mut self, frame: Frame, now: Instant) -> Applied {
        match frame {
            Frame::History { strokes } => {
                self.history = strokes;
                self.previews.clear();
                // A snapshot only arrives on a fresh connection, and its log
                // already holds whatever the previous one delivered.
                self.unacked.clear();
                Applied::HistoryReplaced { strokes: self.history.len() }
            }
            Frame::Stroke { stroke, sender_id } => {
                let own = sender_id.as_ref() == Some(&self.self_id);
                if let Some(sender) = &sender_id {
                    self.previews.remove(sender);
                }
                if own {
                    if let Some(pos) = self.unacked.iter().position(|s| *s == stroke) {
                        self.unacked.remove(pos);
                    }
                }
                self.history.push(stroke);
                Applied::Finalized { index: self.history.len() - 1, own }
            }
            Frame::StrokeUpdate { stroke, sender_id } => {
                if sender_id == self.self_id {
                    return Applied::Ignored;
                }
                self.previews
                    .insert(sender_id, Preview { stroke, refreshed_at: now });
                Applied::PreviewUpdated
            }
        }
    }

    /// Drop previews whose sender has gone quiet for longer than `max_age`.
    /// Returns how many were evicted.
    pub fn prune_stale_previews(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.previews.len();
        self.previews
            .retain(|_, p| now.saturating_duration_since(p.refreshed_at) <= max_age);
        before - self.previews.len()
    }

    // -------------------------------------------------------------------------
    // local drawing
    // -------------------------------------------------------------------------

    /// Start a new local stroke. Replaces any unfinished one.
    pub fn begin_stroke(&mut self, start: Point, color: impl Into<String>, width: f64) {
        let mut stroke = Stroke::new(color, width);
        stroke.push(start);
        self.active = Some(stroke);
    }

    /// Append a point to the active stroke. Returns false when idle.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        stroke.push(point);
        true
    }

    /// Finalize the active stroke. Returns the frame to send, at most once
    /// per gesture. An invalid stroke is discarded and nothing is sent.
    pub fn finish_stroke(&mut self) -> Option<Frame> {
        let stroke = self.active.take()?;
        if stroke.validate().is_err() {
            return None;
        }
        self.unacked.push_back(stroke.clone());
        Some(Frame::stroke(stroke, Some(self.self_id.clone())))
    }

    /// Preview frame for the active stroke, if any and if valid.
    #[must_use]
    pub fn preview_frame(&self) -> Option<Frame> {
        self.active
            .as_ref()
            .filter(|s| s.validate().is_ok())
            .map(|s| Frame::preview(s.clone(), self.self_id.clone()))
    }

    // -------------------------------------------------------------------------
    // rendering
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn scene(&self) -> Scene {
        let mut previews: Vec<(SenderId, Stroke)> = self
            .previews
            .iter()
            .map(|(id, p)| (id.clone(), p.stroke.clone()))
            .collect();
        previews.sort_by(|a, b| a.0.cmp(&b.0));

        Scene {
            history: self.history.clone(),
            optimistic: self.unacked.iter().cloned().collect(),
            previews,
            active: self.active.clone(),
        }
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
