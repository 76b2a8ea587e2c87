//! WebSocket session management for the operation relay.
//!
//! Every text frame received from one connection is forwarded verbatim to
//! every other connection. The relay does not parse operations, keep
//! history, order frames across senders, or acknowledge anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Default number of frames a slow session may fall behind before it loses some.
pub const DEFAULT_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
struct Frame {
    origin: u64,
    text: Arc<str>,
}

/// Shared fan-out hub for all sessions.
pub struct Relay {
    tx: broadcast::Sender<Frame>,
    next_connection: AtomicU64,
    connections: AtomicUsize,
}

/// Shared application state
pub type RelayState = Arc<Relay>;

impl Relay {
    pub fn new(buffer: usize) -> RelayState {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Arc::new(Relay {
            tx,
            next_connection: AtomicU64::new(0),
            connections: AtomicUsize::new(0),
        })
    }

    /// Number of open sessions.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Registers a listener for frames published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            id: self.next_connection.fetch_add(1, Ordering::SeqCst),
            rx: self.tx.subscribe(),
        }
    }

    fn publish(&self, origin: u64, text: String) {
        let frame = Frame {
            origin,
            text: Arc::from(text),
        };
        if self.tx.send(frame).is_err() {
            debug!(origin, "no sessions to relay to");
        }
    }
}

/// A connection's place in the fan-out.
pub struct Subscription {
    id: u64,
    rx: broadcast::Receiver<Frame>,
}

/// One client connection to the relay
pub struct RelaySession {
    socket: WebSocket,
    state: RelayState,
    subscription: Subscription,
    session_id: String,
}

impl RelaySession {
    pub fn new(socket: WebSocket, state: RelayState, subscription: Subscription) -> Self {
        let session_id = generate_session_id(subscription.id);
        Self {
            socket,
            state,
            subscription,
            session_id,
        }
    }

    /// Handle the WebSocket connection lifecycle
    pub async fn handle(self) {
        let RelaySession {
            socket,
            state,
            subscription: Subscription { id, mut rx },
            session_id,
        } = self;

        let open = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
        info!(session = %session_id, connections = open, "relay session established");

        let (mut sink, mut stream) = socket.split();

        let forward_session = session_id.clone();
        let mut forward = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(frame) if frame.origin == id => {}
                    Ok(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame.text.to_string())).await {
                            debug!(session = %forward_session, error = %e, "failed to forward frame");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(session = %forward_session, skipped, "session lagged behind, frames dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let receive = async {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        debug!(session = %session_id, bytes = text.len(), "relaying frame");
                        state.publish(id, text);
                    }
                    Ok(Message::Binary(_)) => {
                        debug!(session = %session_id, "ignoring binary frame");
                    }
                    Ok(Message::Close(_)) => {
                        info!(session = %session_id, "relay session closed by client");
                        break;
                    }
                    Ok(_) => {
                        // Ping/pong is answered by the websocket layer
                    }
                    Err(e) => {
                        warn!(session = %session_id, error = %e, "websocket error");
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = &mut forward => {}
            _ = receive => {}
        }
        forward.abort();

        let open = state.connections.fetch_sub(1, Ordering::SeqCst) - 1;
        info!(session = %session_id, connections = open, "relay session ended");
    }
}

/// Generate a unique session ID
pub fn generate_session_id(connection: u64) -> String {
    format!("session_{}_{}", Utc::now().timestamp_millis(), connection)
}
