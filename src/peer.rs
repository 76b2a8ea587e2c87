//! Relay client: connects one replica to an operation relay.
//!
//! Local edits made through a [`Peer`] are serialized by the document's change
//! callback and queued to a writer task; a reader task merges every frame the
//! relay forwards. The document sits behind a [`SharedDocument`] lock so both
//! tasks and the caller can reach it.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::crdt::{DocumentConfig, DocumentError, NodeId, SharedDocument};

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("relay connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A replica wired to a relay.
pub struct Peer {
    document: SharedDocument,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Peer {
    /// Connects to the relay at `url` (for example `ws://127.0.0.1:3000/api/ws`)
    /// with a fresh, empty replica for `site`.
    pub async fn connect(url: &str, site: &str) -> Result<Self, PeerError> {
        let (outbox, mut outgoing) = mpsc::unbounded_channel::<String>();

        let document = DocumentConfig::new(site)
            .on_local_change(move |_, op| match op.to_json() {
                Ok(json) => {
                    if outbox.send(json).is_err() {
                        debug!("relay writer stopped, local operation not sent");
                    }
                }
                Err(e) => error!(error = %e, "failed to encode local operation"),
            })
            .build()?
            .into_shared();

        let (stream, _) = connect_async(url).await?;
        info!(%url, %site, "connected to relay");
        let (mut sink, mut source) = stream.split();

        let writer = tokio::spawn(async move {
            while let Some(json) = outgoing.recv().await {
                if let Err(e) = sink.send(Message::Text(json)).await {
                    warn!(error = %e, "failed to send operation to relay");
                    break;
                }
            }
        });

        let replica = Arc::clone(&document);
        let reader = tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(json)) => {
                        let outcome = replica.lock().apply_json(&json);
                        debug!(?outcome, "merged relayed operation");
                    }
                    Ok(Message::Close(_)) => {
                        info!("relay closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "relay connection failed");
                        break;
                    }
                }
            }
        });

        Ok(Peer {
            document,
            reader,
            writer,
        })
    }

    pub fn insert(&self, index: usize, content: impl Into<String>) -> Result<NodeId, DocumentError> {
        self.document.lock().insert(index, content)
    }

    pub fn delete(&self, index: usize) -> Result<NodeId, DocumentError> {
        self.document.lock().delete(index)
    }

    pub fn text(&self) -> String {
        self.document.lock().text()
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
