//! Message Log
//!
//! Durable, per-room, append-only storage of chat messages with range
//! queries for catch-up.
//!
//! # Backends
//!
//! - **`memory`** - `InMemoryLog`, either a capped list handing out offset
//!   cursors or a trimmed stream handing out id cursors. Not durable.
//! - **`sqlite`** - `SqliteLog`, durable across restarts, offset cursors.
//!
//! # Entries and cursors
//!
//! Every entry carries a per-room sequence number and a time-sortable entry
//! id, both strictly increasing in append order. Every backend answers both
//! `range_after_offset` and `range_after_id`, so a cursor handed out before a
//! backend change is still usable within its own form.
//!
//! # Trimming
//!
//! Rooms are trimmed to the newest `max_len` entries after an append. The trim
//! is a separate step from the append and may race with it; readers must
//! treat the disappearance of very old entries as normal.

pub mod cursor;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::{DecodeError, Message};

pub use cursor::{Cursor, CursorError};
pub use memory::{CursorScheme, InMemoryLog};
pub use sqlite::SqliteLog;

/// Default per-room retention
pub const DEFAULT_MAX_LEN: usize = 5000;

/// One stored message and its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Per-room sequence number, starting at 1
    pub seq: u64,
    /// Per-room strictly increasing entry id
    pub entry_id: Uuid,
    pub message: Message,
}

impl LogEntry {
    /// The entry's position in the given cursor form
    pub fn cursor(&self, scheme: CursorScheme) -> Cursor {
        match scheme {
            CursorScheme::CappedList => Cursor::Offset(self.seq),
            CursorScheme::TrimmedStream => Cursor::Id(self.entry_id),
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    /// The backend could not be reached or refused the operation
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored entry no longer decodes as a message
    #[error("corrupt entry {seq} in room '{room_id}': {source}")]
    Corrupt {
        room_id: String,
        seq: u64,
        #[source]
        source: DecodeError,
    },

    /// No entry id sorts after the newest one stored for the room
    #[error("entry ids exhausted in room '{room_id}'")]
    IdsExhausted { room_id: String },
}

pub type LogResult<T> = Result<T, LogError>;

#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Append one message to a room and return the cursor assigned to it
    async fn append(&self, room_id: &str, message: &Message) -> LogResult<Cursor>;

    /// Entries with a sequence number greater than `after`, oldest first
    async fn range_after_offset(&self, room_id: &str, after: u64) -> LogResult<Vec<LogEntry>>;

    /// Entries positioned after the entry known by `after`, oldest first
    ///
    /// `after` may be an entry id or the id of the message stored in it. When
    /// no retained entry carries it, entries with a greater entry id are
    /// returned.
    async fn range_after_id(&self, room_id: &str, after: Uuid) -> LogResult<Vec<LogEntry>>;

    /// Entries after a cursor of either form, oldest first
    ///
    /// `None` and start cursors return the whole retained history.
    async fn range(&self, room_id: &str, from: Option<Cursor>) -> LogResult<Vec<LogEntry>> {
        match from {
            None => self.range_after_offset(room_id, 0).await,
            Some(Cursor::Offset(after)) => self.range_after_offset(room_id, after).await,
            Some(Cursor::Id(after)) if after.is_nil() => self.range_after_offset(room_id, 0).await,
            Some(Cursor::Id(after)) => self.range_after_id(room_id, after).await,
        }
    }

    /// The newest `limit` entries, oldest first
    async fn recent(&self, room_id: &str, limit: usize) -> LogResult<Vec<LogEntry>> {
        let mut entries = self.range_after_offset(room_id, 0).await?;
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        Ok(entries)
    }

    /// Cursor form returned by `append`
    fn scheme(&self) -> CursorScheme;

    fn backend_name(&self) -> &'static str;

    fn is_durable(&self) -> bool;
}
