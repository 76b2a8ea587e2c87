//! Web server module for the operation relay.
//!
//! This module contains the Axum web server that forwards serialized
//! operations between connected replicas.

pub mod routes;
pub mod websocket;

// Re-export main server functionality
pub use routes::{HealthResponse, create_router, serve};
pub use websocket::{DEFAULT_BUFFER, Relay, RelaySession, RelayState};
