//! Frame — the wire protocol for `sketchsync`.
//!
//! ARCHITECTURE
//! ============
//! Every message on the canvas socket is a JSON text frame tagged by `type`.
//! The set is closed: `history` (server → client, once per connection),
//! `stroke` (a finalized stroke) and `stroke-update` (an ephemeral preview of
//! a stroke still being drawn). Both sides speak the same enum.
//!
//! DESIGN
//! ======
//! - Structural validation happens in `decode`. Anything that fails it is a
//!   `FrameError` and the caller drops the message without replying.
//! - Strokes carry no identity field. A finalized stroke is identified by its
//!   position in the stroke log.
//! - `senderId` is an opaque per-connection correlation token, used only to
//!   pair previews with the stroke that supersedes them.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// GEOMETRY
// =============================================================================

/// A world-space coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered point sequence with its visual attributes.
///
/// Grows while its gesture is active; immutable once finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
}

impl Stroke {
    /// Start an empty stroke with the given color token and width.
    #[must_use]
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self { points: Vec::new(), color: color.into(), width }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check structural well-formedness.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found: no points, a non-finite
    /// coordinate, an empty color token, or a width that is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.points.is_empty() {
            return Err(FrameError::EmptyStroke);
        }
        if let Some(index) = self
            .points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(FrameError::NonFinitePoint { index });
        }
        if self.color.trim().is_empty() {
            return Err(FrameError::EmptyColor);
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(FrameError::InvalidWidth(self.width));
        }
        Ok(())
    }
}

// =============================================================================
// SENDER ID
// =============================================================================

/// Ephemeral per-connection correlation token. Not an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(String);

impl SenderId {
    /// Generate a fresh token for one connection lifetime.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SenderId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SenderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// FRAME
// =============================================================================

/// The closed set of protocol messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Frame {
    /// Full stroke log, sent once to a newly connected participant.
    History { strokes: Vec<Stroke> },
    /// A finalized stroke. `senderId` is absent when the origin is unknown.
    Stroke {
        stroke: Stroke,
        #[serde(rename = "senderId", default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<SenderId>,
    },
    /// Ephemeral snapshot of a stroke still being drawn.
    StrokeUpdate {
        stroke: Stroke,
        #[serde(rename = "senderId")]
        sender_id: SenderId,
    },
}

impl Frame {
    #[must_use]
    pub fn history(strokes: Vec<Stroke>) -> Self {
        Self::History { strokes }
    }

    #[must_use]
    pub fn stroke(stroke: Stroke, sender_id: Option<SenderId>) -> Self {
        Self::Stroke { stroke, sender_id }
    }

    #[must_use]
    pub fn preview(stroke: Stroke, sender_id: SenderId) -> Self {
        Self::StrokeUpdate { stroke, sender_id }
    }

    /// Wire name of the variant, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::History { .. } => "history",
            Self::Stroke { .. } => "stroke",
            Self::StrokeUpdate { .. } => "stroke-update",
        }
    }

    #[must_use]
    pub fn sender_id(&self) -> Option<&SenderId> {
        match self {
            Self::History { .. } => None,
            Self::Stroke { sender_id, .. } => sender_id.as_ref(),
            Self::StrokeUpdate { sender_id, .. } => Some(sender_id),
        }
    }

    /// Structural validation of every stroke and sender id in the frame.
    ///
    /// # Errors
    ///
    /// Returns the first `FrameError` found.
    pub fn validate(&self) -> Result<(), FrameError> {
        match self {
            Self::History { strokes } => strokes.iter().try_for_each(Stroke::validate),
            Self::Stroke { stroke, sender_id } => {
                if sender_id.as_ref().is_some_and(|s| s.as_str().is_empty()) {
                    return Err(FrameError::EmptySenderId);
                }
                stroke.validate()
            }
            Self::StrokeUpdate { stroke, sender_id } => {
                if sender_id.as_str().is_empty() {
                    return Err(FrameError::EmptySenderId);
                }
                stroke.validate()
            }
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Parse and validate one inbound text frame.
///
/// # Errors
///
/// Returns `FrameError::Json` for unparsable input, unknown `type` values, or
/// missing required fields, and a structural variant for well-typed frames
/// that fail validation.
pub fn decode(text: &str) -> Result<Frame, FrameError> {
    let frame: Frame = serde_json::from_str(text)?;
    frame.validate()?;
    Ok(frame)
}

/// Serialize a frame for the wire.
///
/// # Errors
///
/// Returns `FrameError::Json` if serialization fails.
pub fn encode(frame: &Frame) -> Result<String, FrameError> {
    Ok(serde_json::to_string(frame)?)
}

// =============================================================================
// ERRORS
// =============================================================================

/// Grepable error code for structured log lines.
pub trait ErrorCode: fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stroke has no points")]
    EmptyStroke,
    #[error("stroke point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("stroke color is empty")]
    EmptyColor,
    #[error("stroke width must be positive and finite, got {0}")]
    InvalidWidth(f64),
    #[error("sender id is empty")]
    EmptySenderId,
}

impl ErrorCode for FrameError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "E_INVALID_JSON",
            Self::EmptyStroke => "E_EMPTY_STROKE",
            Self::NonFinitePoint { .. } => "E_NON_FINITE_POINT",
            Self::EmptyColor => "E_EMPTY_COLOR",
            Self::InvalidWidth(_) => "E_INVALID_WIDTH",
            Self::EmptySenderId => "E_EMPTY_SENDER_ID",
        }
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
