//! Participant side of the protocol.
//!
//! ARCHITECTURE
//! ============
//! `sync` holds the three stroke pools and reconciles inbound frames.
//! `publisher` is the gesture-scoped preview timer. `participant` ties them
//! together without any I/O, and `connection` drives a participant over a
//! real websocket.

pub mod connection;
pub mod participant;
pub mod publisher;
pub mod sync;
