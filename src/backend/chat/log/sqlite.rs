/**
 * SQLite Message Log
 *
 * Durable message log backed by a single SQLite table:
 *
 * ```sql
 * message_log(room_id TEXT, seq INTEGER, entry_id TEXT, message_id TEXT,
 *             body TEXT, PRIMARY KEY (room_id, seq))
 * ```
 *
 * `body` holds the encoded envelope. `entry_id` is the hyphenated UUID, whose
 * lexical order matches its numeric order, so id ranges are plain string
 * comparisons. `message_id` lets a client resume from the id of the last
 * message it saw. Appends hand out offset cursors. The schema is created on
 * open.
 */
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::cursor::next_entry_id;
use super::{Cursor, CursorScheme, LogEntry, LogError, LogResult, MessageLog};
use crate::shared::codec;
use crate::shared::{DecodeError, Message};

impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        LogError::StorageUnavailable(err.to_string())
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    seq: i64,
    entry_id: String,
    body: String,
}

pub struct SqliteLog {
    pool: SqlitePool,
    max_len: usize,
    /// Serializes appends from this process so seq and entry id are read and
    /// written without interleaving
    append_lock: Mutex<()>,
}

impl SqliteLog {
    /// Open (creating if needed) the database at `url`
    pub async fn connect(url: &str, max_len: usize) -> LogResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        // every connection to an in-memory database is a separate database
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool, max_len).await
    }

    /// Use an existing pool, creating the schema if needed
    pub async fn from_pool(pool: SqlitePool, max_len: usize) -> LogResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS message_log (
                room_id  TEXT    NOT NULL,
                seq      INTEGER NOT NULL,
                entry_id TEXT    NOT NULL,
                message_id TEXT  NOT NULL DEFAULT '',
                body     TEXT    NOT NULL,
                PRIMARY KEY (room_id, seq)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS message_log_room_entry ON message_log (room_id, entry_id)",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS message_log_room_message ON message_log (room_id, message_id)",
        )
        .execute(&pool)
        .await?;

        tracing::info!(max_len, "SQLite message log ready");

        Ok(Self {
            pool,
            max_len: max_len.max(1),
            append_lock: Mutex::new(()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn trim(&self, room_id: &str) -> LogResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM message_log
            WHERE room_id = ?1
              AND seq <= (SELECT MAX(seq) FROM message_log WHERE room_id = ?1) - ?2
            "#,
        )
        .bind(room_id)
        .bind(self.max_len as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(room_id, dropped = result.rows_affected(), "trimmed SQLite log");
        }
        Ok(())
    }

    fn into_entries(room_id: &str, rows: Vec<EntryRow>) -> LogResult<Vec<LogEntry>> {
        rows.into_iter()
            .map(|row| {
                let seq = row.seq as u64;
                let corrupt = |source: DecodeError| LogError::Corrupt {
                    room_id: room_id.to_string(),
                    seq,
                    source,
                };
                let entry_id = Uuid::parse_str(&row.entry_id)
                    .map_err(|e| corrupt(DecodeError::malformed("entry_id", e.to_string())))?;
                let message = codec::decode_message(row.body.as_bytes()).map_err(corrupt)?;
                Ok(LogEntry {
                    seq,
                    entry_id,
                    message,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MessageLog for SqliteLog {
    async fn append(&self, room_id: &str, message: &Message) -> LogResult<Cursor> {
        let body = codec::encode(message);

        let seq = {
            let _guard = self.append_lock.lock().await;
            let mut tx = self.pool.begin().await?;

            let last: Option<(i64, String)> = sqlx::query_as(
                "SELECT seq, entry_id FROM message_log WHERE room_id = ?1 ORDER BY seq DESC LIMIT 1",
            )
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?;

            let (last_seq, last_id) = match last {
                Some((seq, id)) => (seq, Uuid::parse_str(&id).ok()),
                None => (0, None),
            };
            let seq = last_seq + 1;
            let entry_id = next_entry_id(last_id, message.id).ok_or_else(|| LogError::IdsExhausted {
                room_id: room_id.to_string(),
            })?;

            sqlx::query(
                "INSERT INTO message_log (room_id, seq, entry_id, message_id, body) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(room_id)
            .bind(seq)
            .bind(entry_id.to_string())
            .bind(message.id.to_string())
            .bind(&body)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            seq as u64
        };

        // Retention is best effort; the append itself already succeeded.
        if let Err(e) = self.trim(room_id).await {
            tracing::warn!(room_id, error = %e, "failed to trim SQLite log");
        }

        Ok(Cursor::Offset(seq))
    }

    async fn range_after_offset(&self, room_id: &str, after: u64) -> LogResult<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT seq, entry_id, body FROM message_log WHERE room_id = ?1 AND seq > ?2 ORDER BY seq ASC",
        )
        .bind(room_id)
        .bind(i64::try_from(after).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Self::into_entries(room_id, rows)
    }

    async fn range_after_id(&self, room_id: &str, after: Uuid) -> LogResult<Vec<LogEntry>> {
        let resolved: Option<i64> = sqlx::query_scalar(
            "SELECT seq FROM message_log WHERE room_id = ?1 AND (entry_id = ?2 OR message_id = ?2) ORDER BY seq DESC LIMIT 1",
        )
        .bind(room_id)
        .bind(after.to_string())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(seq) = resolved {
            return self.range_after_offset(room_id, seq.max(0) as u64).await;
        }

        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT seq, entry_id, body FROM message_log WHERE room_id = ?1 AND entry_id > ?2 ORDER BY seq ASC",
        )
        .bind(room_id)
        .bind(after.to_string())
        .fetch_all(&self.pool)
        .await?;

        Self::into_entries(room_id, rows)
    }

    async fn recent(&self, room_id: &str, limit: usize) -> LogResult<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT seq, entry_id, body FROM message_log WHERE room_id = ?1 ORDER BY seq DESC LIMIT ?2",
        )
        .bind(room_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Self::into_entries(room_id, rows)?;
        entries.reverse();
        Ok(entries)
    }

    fn scheme(&self) -> CursorScheme {
        CursorScheme::CappedList
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn is_durable(&self) -> bool {
        true
    }
}
