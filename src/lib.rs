//! Shared freehand canvas: stroke log, fan-out hub, and participant sync.

pub mod client;
pub mod config;
pub mod frame;
pub mod routes;
pub mod services;
pub mod state;
