/**
 * Connection Handles
 *
 * A `ConnectionHandle` is the registry's non-owning view of one live
 * connection: who it belongs to and how to queue a frame for it. The
 * transport itself stays with the session that accepted it; frames queued
 * here are drained by that session's writer task.
 *
 * Handles are cheap to clone. The outbound queue is bounded, so a peer that
 * stops reading eventually makes `send` time out instead of growing memory.
 */
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

/// Process-unique connection identifier
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Why the server is closing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Another connection registered for the same room and user
    Evicted,
    /// The handshake was rejected
    Rejected,
    /// The session ended normally
    Normal,
}

/// A frame queued for one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close(CloseReason),
}

impl Outbound {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Outbound::Text(text) => Some(text),
            Outbound::Close(_) => None,
        }
    }
}

/// Failure to queue a frame for a connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("write to connection {id} timed out after {timeout:?}")]
    TimedOut { id: ConnectionId, timeout: Duration },
}

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    room_id: Arc<str>,
    user_id: Arc<str>,
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue
    pub fn new(room_id: &str, user_id: &str, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::with_sender(room_id, user_id, tx), rx)
    }

    /// Create a handle over an existing outbound queue
    pub fn with_sender(room_id: &str, user_id: &str, tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            id: next_connection_id(),
            room_id: Arc::from(room_id),
            user_id: Arc::from(user_id),
            tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue a text frame, waiting at most `timeout` for queue space
    pub async fn send_text(&self, text: String, timeout: Duration) -> Result<(), SendError> {
        match self.tx.send_timeout(Outbound::Text(text), timeout).await {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendTimeoutError::Closed(_)) => Err(SendError::Closed(self.id)),
            Err(mpsc::error::SendTimeoutError::Timeout(_)) => Err(SendError::TimedOut {
                id: self.id,
                timeout,
            }),
        }
    }

    /// Ask the connection's writer to close the transport
    ///
    /// Does not wait: a full queue means the writer is already behind, and a
    /// closed queue means it is already gone.
    pub fn close(&self, reason: CloseReason) {
        if let Err(e) = self.tx.try_send(Outbound::Close(reason)) {
            tracing::debug!(connection_id = self.id, error = %e, "close request not queued");
        }
    }
}
