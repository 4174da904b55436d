//! Message log integration tests
//!
//! Durability across reopen, concurrent appends, and registry bookkeeping
//! under churn.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use talkroom::backend::chat::log::{Cursor, InMemoryLog, MessageLog, SqliteLog};
use talkroom::backend::realtime::{ConnectionHandle, ConnectionRegistry};
use talkroom::shared::Message;

use crate::assert_ok;
use crate::common::assert_strictly_increasing;

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("talkroom.db").display())
}

#[tokio::test]
async fn test_sqlite_log_survives_reopen() {
    let dir = assert_ok!(tempfile::tempdir());
    let url = database_url(&dir);

    let log = assert_ok!(SqliteLog::connect(&url, 100).await);
    let mut written = Vec::new();
    for content in ["one", "two", "three"] {
        let message = Message::text("r1", "alice", content);
        assert_ok!(log.append("r1", &message).await);
        written.push(message);
    }
    log.pool().close().await;
    drop(log);

    let reopened = assert_ok!(SqliteLog::connect(&url, 100).await);
    let entries = assert_ok!(reopened.range("r1", None).await);
    let messages: Vec<_> = entries.iter().map(|e| e.message.clone()).collect();
    assert_eq!(messages, written);

    let next = assert_ok!(reopened.append("r1", &Message::text("r1", "bob", "four")).await);
    assert_eq!(next, Cursor::Offset(4));
}

#[tokio::test]
async fn test_sqlite_log_answers_id_cursors_after_reopen() {
    let dir = assert_ok!(tempfile::tempdir());
    let url = database_url(&dir);

    let first = Message::text("r1", "alice", "one");
    let second = Message::text("r1", "alice", "two");
    {
        let log = assert_ok!(SqliteLog::connect(&url, 100).await);
        assert_ok!(log.append("r1", &first).await);
        assert_ok!(log.append("r1", &second).await);
        log.pool().close().await;
    }

    let log = assert_ok!(SqliteLog::connect(&url, 100).await);
    let after = assert_ok!(log.range("r1", Some(Cursor::Id(first.id))).await);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].message, second);
}

async fn append_concurrently(log: Arc<dyn MessageLog>, writers: usize, per_writer: usize) {
    let mut tasks = Vec::new();
    for writer in 0..writers {
        let log = log.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..per_writer {
                let message = Message::text("r1", format!("w{writer}"), format!("{n}"));
                log.append("r1", &message).await.expect("append succeeds");
            }
        }));
    }
    for task in tasks {
        assert_ok!(task.await);
    }
}

async fn assert_consistent_ordering(log: &dyn MessageLog, expected: usize) {
    let entries = assert_ok!(log.range("r1", None).await);
    assert_eq!(entries.len(), expected);

    let seqs: Vec<_> = entries.iter().map(|e| e.seq).collect();
    let entry_ids: Vec<_> = entries.iter().map(|e| e.entry_id).collect();
    assert_strictly_increasing(&seqs);
    assert_strictly_increasing(&entry_ids);
    assert_eq!(seqs.first(), Some(&1));
    assert_eq!(seqs.last(), Some(&(expected as u64)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_in_memory() {
    let log: Arc<dyn MessageLog> = Arc::new(InMemoryLog::trimmed_stream(1000));
    append_concurrently(log.clone(), 8, 25).await;
    assert_consistent_ordering(log.as_ref(), 200).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_sqlite() {
    let dir = assert_ok!(tempfile::tempdir());
    let log: Arc<dyn MessageLog> = Arc::new(assert_ok!(SqliteLog::connect(&database_url(&dir), 1000).await));
    append_concurrently(log.clone(), 4, 10).await;
    assert_consistent_ordering(log.as_ref(), 40).await;
}

#[tokio::test]
async fn test_registry_drops_rooms_under_churn() {
    let registry = Arc::new(ConnectionRegistry::new(Duration::from_millis(100)));

    let mut tasks = Vec::new();
    for n in 0..16 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let room = format!("room-{}", n % 4);
            let user = format!("user-{n}");
            let (handle, _rx) = ConnectionHandle::new(&room, &user, 4);
            registry.register(handle.clone()).await;
            tokio::task::yield_now().await;
            assert!(registry.deregister(&room, &user, handle.id()).await);
        }));
    }
    for task in tasks {
        assert_ok!(task.await);
    }

    assert_eq!(registry.room_count().await, 0);
}
