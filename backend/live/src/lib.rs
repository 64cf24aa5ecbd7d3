//! Adapter for the real Pulse Drive backend.
//!
//! Triggers workflows over HTTP and streams agent events over a WebSocket.
//! Any failure is reported to the caller, which falls back to the local
//! simulator.

pub mod client;
pub mod stream;
pub mod wire;

pub use client::{HttpLiveSource, DEFAULT_BASE_URL};
pub use wire::parse_message;
