//! Maestro Protocol
//!
//! Shared types for communication between the Maestro orchestration server
//! and its console. Stream frames are serialized as JSON over WebSocket;
//! the `rest` module carries the request/response bodies of the HTTP API.

use uuid::Uuid;

// Re-exports
pub mod client;
pub mod rest;
pub mod server;
pub mod types;

pub use client::ClientMessage;
pub use server::{FinalOutput, LogEvent, ServerMessage};
pub use types::*;

/// Generate a new unique ID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
