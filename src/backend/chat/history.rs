/**
 * Catch-up Query Service
 *
 * Answers "messages after cursor X" for a room. Used for the replay a
 * session sends right after its handshake, and by the HTTP history
 * endpoint.
 *
 * Callers never need to know which cursor form a room's log hands out: both
 * forms are routed to the matching range query. A room with no history, or
 * one that does not exist yet, yields an empty result rather than an error.
 */
use std::sync::Arc;

use crate::backend::chat::log::{Cursor, LogEntry, LogResult, MessageLog};
use crate::shared::Message;

/// One page of history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Oldest first
    pub messages: Vec<Message>,
    /// Cursor to pass next time to continue after this page
    pub next_cursor: Option<Cursor>,
}

#[derive(Clone)]
pub struct HistoryService {
    log: Arc<dyn MessageLog>,
}

impl HistoryService {
    pub fn new(log: Arc<dyn MessageLog>) -> Self {
        Self { log }
    }

    /// Messages after `from`, oldest first
    ///
    /// `None` or a start cursor returns the full retained history.
    pub async fn get_history(&self, room_id: &str, from: Option<Cursor>) -> LogResult<Vec<Message>> {
        let entries = self.log.range(room_id, from).await?;
        Ok(into_messages(entries))
    }

    /// Messages after `from` plus the cursor to continue from
    ///
    /// When nothing new exists the given cursor is handed back unchanged.
    pub async fn page(&self, room_id: &str, from: Option<Cursor>) -> LogResult<HistoryPage> {
        let entries = self.log.range(room_id, from).await?;
        let scheme = self.log.scheme();
        let next_cursor = entries.last().map(|entry| entry.cursor(scheme)).or(from);
        tracing::debug!(room_id, count = entries.len(), "history page served");
        Ok(HistoryPage {
            messages: into_messages(entries),
            next_cursor,
        })
    }

    /// The newest `limit` messages, oldest first
    pub async fn catch_up(&self, room_id: &str, limit: usize) -> LogResult<Vec<Message>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self.log.recent(room_id, limit).await?;
        Ok(into_messages(entries))
    }
}

fn into_messages(entries: Vec<LogEntry>) -> Vec<Message> {
    entries.into_iter().map(|entry| entry.message).collect()
}
