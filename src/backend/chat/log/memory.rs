//! In-memory message log.
//!
//! Keeps each room's entries in a bounded `VecDeque` behind a
//! `tokio::sync::RwLock`. Entries are stored in their encoded form and decoded
//! on read, so this backend exercises the same codec path as a durable one.
//!
//! Two cursor schemes are available:
//! - `CappedList` trims to exactly `max_len` after every append and hands out
//!   offset cursors.
//! - `TrimmedStream` lets a room overshoot `max_len` by a small slack before
//!   trimming back (approximate trim) and hands out id cursors.
//!
//! Not durable: everything is lost when the process exits.
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::cursor::next_entry_id;
use super::{Cursor, LogEntry, LogError, LogResult, MessageLog};
use crate::shared::codec;
use crate::shared::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorScheme {
    /// Offset cursors, exact trim
    CappedList,
    /// Id cursors, approximate trim
    TrimmedStream,
}

#[derive(Debug)]
struct StoredEntry {
    seq: u64,
    entry_id: Uuid,
    message_id: Uuid,
    payload: String,
}

#[derive(Debug, Default)]
struct RoomLog {
    next_seq: u64,
    last_id: Option<Uuid>,
    entries: VecDeque<StoredEntry>,
}

impl RoomLog {
    fn record(&mut self, message_id: Uuid, payload: String) -> Option<(u64, Uuid)> {
        let entry_id = next_entry_id(self.last_id, message_id)?;
        self.next_seq += 1;
        self.last_id = Some(entry_id);
        self.entries.push_back(StoredEntry {
            seq: self.next_seq,
            entry_id,
            message_id,
            payload,
        });
        Some((self.next_seq, entry_id))
    }

    /// Sequence number of the newest entry known by `id`, as entry id or
    /// message id
    fn resolve(&self, id: Uuid) -> Option<u64> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.entry_id == id || entry.message_id == id)
            .map(|entry| entry.seq)
    }

    fn decode_from(&self, room_id: &str, start: usize) -> LogResult<Vec<LogEntry>> {
        self.entries
            .range(start..)
            .map(|entry| {
                let message = codec::decode_message(entry.payload.as_bytes()).map_err(|source| {
                    LogError::Corrupt {
                        room_id: room_id.to_string(),
                        seq: entry.seq,
                        source,
                    }
                })?;
                Ok(LogEntry {
                    seq: entry.seq,
                    entry_id: entry.entry_id,
                    message,
                })
            })
            .collect()
    }
}

pub struct InMemoryLog {
    scheme: CursorScheme,
    max_len: usize,
    rooms: RwLock<HashMap<String, RoomLog>>,
}

impl InMemoryLog {
    pub fn new(scheme: CursorScheme, max_len: usize) -> Self {
        Self {
            scheme,
            max_len: max_len.max(1),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn capped_list(max_len: usize) -> Self {
        Self::new(CursorScheme::CappedList, max_len)
    }

    pub fn trimmed_stream(max_len: usize) -> Self {
        Self::new(CursorScheme::TrimmedStream, max_len)
    }

    /// Number of entries currently retained for a room
    pub async fn len(&self, room_id: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map_or(0, |room| room.entries.len())
    }

    fn trim_threshold(&self) -> usize {
        match self.scheme {
            CursorScheme::CappedList => self.max_len,
            CursorScheme::TrimmedStream => self.max_len + (self.max_len / 10).max(1),
        }
    }

    async fn trim(&self, room_id: &str) {
        let threshold = self.trim_threshold();
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(room_id) {
            if room.entries.len() > threshold {
                let excess = room.entries.len() - self.max_len;
                room.entries.drain(..excess);
                tracing::debug!(room_id, dropped = excess, "trimmed in-memory log");
            }
        }
    }

    async fn collect(
        &self,
        room_id: &str,
        keep: impl Fn(&StoredEntry) -> bool,
    ) -> LogResult<Vec<LogEntry>> {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(room_id) else {
            return Ok(Vec::new());
        };
        let start = room.entries.partition_point(|entry| !keep(entry));
        room.decode_from(room_id, start)
    }
}

#[async_trait]
impl MessageLog for InMemoryLog {
    async fn append(&self, room_id: &str, message: &Message) -> LogResult<Cursor> {
        let payload = codec::encode(message);
        let (seq, entry_id) = {
            let mut rooms = self.rooms.write().await;
            rooms
                .entry(room_id.to_string())
                .or_default()
                .record(message.id, payload)
                .ok_or_else(|| LogError::IdsExhausted {
                    room_id: room_id.to_string(),
                })?
        };
        self.trim(room_id).await;

        Ok(match self.scheme {
            CursorScheme::CappedList => Cursor::Offset(seq),
            CursorScheme::TrimmedStream => Cursor::Id(entry_id),
        })
    }

    async fn range_after_offset(&self, room_id: &str, after: u64) -> LogResult<Vec<LogEntry>> {
        self.collect(room_id, |entry| entry.seq > after).await
    }

    async fn range_after_id(&self, room_id: &str, after: Uuid) -> LogResult<Vec<LogEntry>> {
        let resolved = {
            let rooms = self.rooms.read().await;
            rooms.get(room_id).and_then(|room| room.resolve(after))
        };
        match resolved {
            Some(seq) => self.range_after_offset(room_id, seq).await,
            // trimmed away or never seen
            None => self.collect(room_id, |entry| entry.entry_id > after).await,
        }
    }

    async fn recent(&self, room_id: &str, limit: usize) -> LogResult<Vec<LogEntry>> {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(room_id) else {
            return Ok(Vec::new());
        };
        room.decode_from(room_id, room.entries.len().saturating_sub(limit))
    }

    fn scheme(&self) -> CursorScheme {
        self.scheme
    }

    fn backend_name(&self) -> &'static str {
        match self.scheme {
            CursorScheme::CappedList => "memory-list",
            CursorScheme::TrimmedStream => "memory-stream",
        }
    }

    fn is_durable(&self) -> bool {
        false
    }
}
