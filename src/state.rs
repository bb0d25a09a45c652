//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds one `CanvasState`: the stroke log and the outbound channel of
//! every connected participant, behind a single lock. Appending a stroke and
//! fanning it out happen under one write guard, so the log's order is the
//! order every participant observes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::frame::{Frame, Stroke};

// =============================================================================
// STROKE LOG
// =============================================================================

/// Authoritative append-only sequence of finalized strokes.
///
/// There is no removal or reordering API. A stroke's index is its identity.
#[derive(Debug, Default)]
pub struct StrokeLog {
    strokes: Vec<Stroke>,
}

impl StrokeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized stroke and return its index.
    pub fn append(&mut self, stroke: Stroke) -> usize {
        self.strokes.push(stroke);
        self.strokes.len() - 1
    }

    /// Copy of the full log, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.strokes.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

// =============================================================================
// CANVAS STATE
// =============================================================================

/// The one shared canvas. Kept in memory only; gone on restart.
#[derive(Debug, Default)]
pub struct CanvasState {
    pub log: StrokeLog,
    /// Connected participants: `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
}

impl CanvasState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub canvas: Arc<RwLock<CanvasState>>,
    pub config: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { canvas: Arc::new(RwLock::new(CanvasState::new())), config }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::frame::Point;

    /// Create a test `AppState` with default config.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(ServerConfig::default())
    }

    /// A straight stroke of `n` points along the diagonal.
    #[must_use]
    pub fn diagonal_stroke(n: usize, color: &str) -> Stroke {
        let mut stroke = Stroke::new(color, 3.0);
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let v = i as f64;
            stroke.push(Point::new(v, v));
        }
        stroke
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
