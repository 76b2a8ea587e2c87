//! Route handlers for the relay web server.
//!
//! This module contains the HTTP route handlers and the router for the Axum server.

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::{Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::server::websocket::{RelaySession, RelayState};

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
}

/// Basic health check endpoint
pub async fn health(State(state): State<RelayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: state.connections(),
    })
}

/// WebSocket connection handler for the relay
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    // Subscribe before answering the handshake so that a client never misses
    // frames published after its connection is accepted.
    let subscription = state.subscribe();
    ws.on_upgrade(move |socket| RelaySession::new(socket, state, subscription).handle())
}

/// Creates and configures the main application router
pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ws", get(ws_handler))
        .with_state(state)
}

/// Serves the relay on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, state: RelayState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("Relay listening on http://{}", addr);
    info!("  GET /health  - Health check");
    info!("  GET /api/ws  - Operation relay (websocket)");

    axum::serve(listener, create_router(state)).await
}
