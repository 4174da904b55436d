//! In-process room session harness
//!
//! Runs real `RoomSession`s against channel-backed streams instead of
//! sockets. Each `TestClient` owns the inbound side of one session and the
//! receiving end of its outbound queue.

use std::convert::Infallible;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use talkroom::backend::chat::log::{Cursor, CursorScheme, LogEntry, LogError, LogResult, MessageLog};
use talkroom::backend::chat::{InboundFrame, RoomSession};
use talkroom::backend::error::BackendError;
use talkroom::backend::realtime::{CloseReason, Outbound};
use talkroom::backend::server::AppState;
use talkroom::shared::Message;

/// How long a test waits for a frame it expects
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a test waits to be sure no frame arrives
pub const SILENCE: Duration = Duration::from_millis(150);

pub struct TestClient {
    pub room_id: String,
    pub user_id: String,
    inbound: Option<mpsc::Sender<Result<InboundFrame, Infallible>>>,
    outbound: mpsc::Receiver<Outbound>,
    task: JoinHandle<Result<(), BackendError>>,
}

impl TestClient {
    /// Start a session and send `handshake` as its first frame
    pub fn start(app: &AppState, handshake: Value) -> Self {
        let room_id = handshake["room_id"].as_str().unwrap_or_default().to_string();
        let user_id = handshake["user_id"].as_str().unwrap_or_default().to_string();

        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        let (outbound_tx, outbound_rx) = mpsc::channel(app.config.outbound_queue);
        let session = RoomSession::new(app.clone(), outbound_tx);
        let task = tokio::spawn(session.run(ReceiverStream::new(inbound_rx)));

        inbound_tx
            .try_send(Ok(InboundFrame::Text(handshake.to_string())))
            .expect("handshake fits in the inbound queue");

        Self {
            room_id,
            user_id,
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
            task,
        }
    }

    /// Join `room_id` as `user_id` and wait until the session is registered
    pub async fn connect(app: &AppState, room_id: &str, user_id: &str) -> Self {
        let client = Self::start(app, serde_json::json!({ "room_id": room_id, "user_id": user_id }));
        let registered = tokio::time::timeout(RECV_TIMEOUT, async {
            while !app.registry.contains(room_id, user_id).await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(registered.is_ok(), "{user_id} was never registered in {room_id}");
        client
    }

    pub async fn send(&self, frame: Value) {
        self.send_raw(&frame.to_string()).await;
    }

    pub async fn send_raw(&self, text: &str) {
        self.inbound
            .as_ref()
            .expect("client is still connected")
            .send(Ok(InboundFrame::Text(text.to_string())))
            .await
            .expect("session is still reading");
    }

    pub async fn send_text(&self, content: &str) {
        self.send(serde_json::json!({ "kind": "text", "content": content })).await;
    }

    /// Next outbound frame
    pub async fn recv(&mut self) -> Outbound {
        match tokio::time::timeout(RECV_TIMEOUT, self.outbound.recv()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => panic!("{}: outbound queue closed", self.user_id),
            Err(_) => panic!("{}: no frame within {:?}", self.user_id, RECV_TIMEOUT),
        }
    }

    /// Next frame, which must be a text frame holding JSON
    pub async fn recv_json(&mut self) -> Value {
        match self.recv().await {
            Outbound::Text(text) => serde_json::from_str(&text).expect("outbound frames are JSON"),
            other => panic!("{}: expected a text frame, got {:?}", self.user_id, other),
        }
    }

    /// Skip frames until one of the given kind arrives
    pub async fn recv_kind(&mut self, kind: &str) -> Value {
        loop {
            let frame = self.recv_json().await;
            if frame["kind"] == kind {
                return frame;
            }
        }
    }

    /// Next frame, which must be a close request
    pub async fn recv_close(&mut self) -> CloseReason {
        loop {
            match self.recv().await {
                Outbound::Close(reason) => return reason,
                Outbound::Text(_) => continue,
            }
        }
    }

    /// Assert that nothing arrives for a short while
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(frame)) = tokio::time::timeout(SILENCE, self.outbound.recv()).await {
            panic!("{}: expected silence, got {:?}", self.user_id, frame);
        }
    }

    /// Close the inbound stream and wait for the session to finish
    pub async fn disconnect(mut self) -> Result<(), BackendError> {
        self.inbound.take();
        tokio::time::timeout(RECV_TIMEOUT, self.task)
            .await
            .expect("session finished after disconnect")
            .expect("session task did not panic")
    }

    /// Wait for a session that ends on its own (rejected handshake)
    pub async fn finish(self) -> (Result<(), BackendError>, mpsc::Receiver<Outbound>) {
        let result = tokio::time::timeout(RECV_TIMEOUT, self.task)
            .await
            .expect("session finished")
            .expect("session task did not panic");
        (result, self.outbound)
    }
}

/// A message log whose backend is always unreachable for writes
pub struct FailingLog;

#[async_trait]
impl MessageLog for FailingLog {
    async fn append(&self, _room_id: &str, _message: &Message) -> LogResult<Cursor> {
        Err(LogError::StorageUnavailable("connection refused".to_string()))
    }

    async fn range_after_offset(&self, _room_id: &str, _after: u64) -> LogResult<Vec<LogEntry>> {
        Ok(Vec::new())
    }

    async fn range_after_id(&self, _room_id: &str, _after: Uuid) -> LogResult<Vec<LogEntry>> {
        Ok(Vec::new())
    }

    fn scheme(&self) -> CursorScheme {
        CursorScheme::CappedList
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }

    fn is_durable(&self) -> bool {
        false
    }
}
