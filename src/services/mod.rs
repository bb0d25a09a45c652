//! Canvas services used by the websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the stroke log and fan-out so route handlers can
//! stay focused on protocol translation.

pub mod broadcast;
pub mod session;
pub mod stroke;
