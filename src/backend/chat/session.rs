/**
 * Room Session Coordinator
 *
 * Drives one connection from handshake to teardown.
 *
 * # States
 *
 * ```text
 * Connecting -> AwaitingHandshake -> Active -> Closing -> Closed
 *                      |                           ^
 *                      +---------------------------+   (handshake rejected)
 * ```
 *
 * - **AwaitingHandshake**: the first frame must be `{room_id, user_id}` and
 *   arrive within the handshake timeout. The claims are vetted by the
 *   identity provider and the room directory. On success the connection is
 *   registered, the recent history is replayed to it alone, and the rest of
 *   the room is told the user joined.
 * - **Active**: every frame is decoded and dispatched by kind. Content is
 *   stamped with the session's identity, appended to the log and then
 *   broadcast. Typing is broadcast to the others and never stored. Unknown
 *   kinds and malformed payloads are logged and skipped.
 * - **Closing**: the connection is deregistered and, unless it was evicted by
 *   a newer connection of the same user, the room is told the user left.
 *
 * Teardown runs exactly once per session. A session dropped mid-flight (its
 * task cancelled) still deregisters through `Drop`.
 *
 * The coordinator never touches a socket: it reads `InboundFrame`s from any
 * stream and writes `Outbound` frames into a queue drained elsewhere.
 */
use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{field, Instrument, Span};

use crate::backend::auth::Claims;
use crate::backend::error::BackendError;
use crate::backend::realtime::{CloseReason, ConnectionHandle, Outbound};
use crate::backend::server::state::AppState;
use crate::shared::codec;
use crate::shared::{DecodeError, Inbound, Message, RoomEvent, TypingBody};

/// Whether a content message is echoed back to its sender
///
/// Clients are not assumed to render an optimistic local copy, so the sender
/// receives the persisted form like every other peer.
pub const ECHO_TO_SENDER: bool = true;

/// A frame read from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingHandshake,
    Active,
    Closing,
    Closed,
}

pub struct RoomSession {
    app: AppState,
    outbound: mpsc::Sender<Outbound>,
    state: SessionState,
    handle: Option<ConnectionHandle>,
    closed: bool,
}

impl RoomSession {
    /// Create a session writing to `outbound`
    ///
    /// The receiving end of `outbound` belongs to the transport's writer.
    pub fn new(app: AppState, outbound: mpsc::Sender<Outbound>) -> Self {
        Self {
            app,
            outbound,
            state: SessionState::Connecting,
            handle: None,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session until the inbound stream ends
    ///
    /// # Errors
    ///
    /// Only handshake failures are returned (`HandshakeInvalid`,
    /// `Unauthorized`, `Forbidden`). Faults after the handshake are scoped to
    /// one message and never end the session.
    pub async fn run<S, E>(mut self, mut inbound: S) -> Result<(), BackendError>
    where
        S: Stream<Item = Result<InboundFrame, E>> + Unpin,
        E: Display,
    {
        let span = tracing::info_span!("room_session", room_id = field::Empty, user_id = field::Empty);

        async {
            self.transition(SessionState::AwaitingHandshake);
            let result = self.handshake(&mut inbound).await;
            match &result {
                Ok(()) => {
                    self.transition(SessionState::Active);
                    self.read_loop(&mut inbound).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "handshake rejected");
                    if let Err(e) = self.outbound.try_send(Outbound::Close(CloseReason::Rejected)) {
                        tracing::debug!(error = %e, "rejection close not queued");
                    }
                }
            }
            self.close().await;
            result
        }
        .instrument(span)
        .await
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    async fn handshake<S, E>(&mut self, inbound: &mut S) -> Result<(), BackendError>
    where
        S: Stream<Item = Result<InboundFrame, E>> + Unpin,
        E: Display,
    {
        let first = tokio::time::timeout(self.app.config.handshake_timeout, inbound.next())
            .await
            .map_err(|_| BackendError::handshake("timed out waiting for handshake"))?;

        let bytes = match first {
            Some(Ok(InboundFrame::Text(text))) => text.into_bytes(),
            Some(Ok(InboundFrame::Binary(bytes))) => bytes,
            Some(Ok(InboundFrame::Close)) | None => {
                return Err(BackendError::handshake("connection closed before handshake"))
            }
            Some(Err(e)) => return Err(BackendError::handshake(format!("read failed: {e}"))),
        };

        let handshake = codec::decode_handshake(&bytes).map_err(|e| BackendError::handshake(e.to_string()))?;
        if !handshake.is_complete() {
            return Err(BackendError::handshake("room_id and user_id are required"));
        }

        let user_id = self.app.identity.verify_handshake(&Claims::from(&handshake)).await?;
        let room_id = handshake.room_id.trim().to_string();
        if !self.app.rooms.is_member(&room_id, &user_id).await {
            return Err(BackendError::forbidden(&room_id, &user_id));
        }

        let span = Span::current();
        span.record("room_id", room_id.as_str());
        span.record("user_id", user_id.as_str());

        let handle = ConnectionHandle::with_sender(&room_id, &user_id, self.outbound.clone());
        if let Some(evicted) = self.app.registry.register(handle.clone()).await {
            tracing::info!(evicted = evicted.id(), "closing replaced connection");
            evicted.close(CloseReason::Evicted);
        }
        self.handle = Some(handle.clone());

        self.replay_recent(&handle).await;

        let display_name = self.app.users.display_name(&user_id).await;
        let joined = RoomEvent::user_joined(&room_id, &user_id, display_name);
        self.app
            .registry
            .broadcast(&room_id, &joined.to_json(), &[user_id.as_str()])
            .await;

        Ok(())
    }

    /// Send the newest retained messages to this connection only
    async fn replay_recent(&self, handle: &ConnectionHandle) {
        let timeout = self.app.registry.write_timeout();
        let messages = match self
            .app
            .history
            .catch_up(handle.room_id(), self.app.config.catch_up_limit)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "catch-up unavailable, continuing without it");
                return;
            }
        };

        let count = messages.len();
        for message in &messages {
            if let Err(e) = handle.send_text(codec::encode(message), timeout).await {
                tracing::warn!(error = %e, "catch-up interrupted");
                return;
            }
        }
        tracing::debug!(count, "catch-up delivered");
    }

    async fn read_loop<S, E>(&mut self, inbound: &mut S)
    where
        S: Stream<Item = Result<InboundFrame, E>> + Unpin,
        E: Display,
    {
        while let Some(frame) = inbound.next().await {
            let bytes = match frame {
                Ok(InboundFrame::Text(text)) => text.into_bytes(),
                Ok(InboundFrame::Binary(bytes)) => bytes,
                Ok(InboundFrame::Close) => {
                    tracing::debug!("close frame received");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "read failed");
                    break;
                }
            };
            self.dispatch(&bytes).await;
        }
    }

    async fn dispatch(&self, bytes: &[u8]) {
        let Some(handle) = &self.handle else {
            return;
        };
        match codec::decode(bytes) {
            Ok(Inbound::Content(message)) => self.publish(handle, message).await,
            Ok(Inbound::Typing(typing)) => self.relay_typing(handle, typing).await,
            Err(DecodeError::UnknownKind { kind }) => {
                tracing::warn!(kind = %kind, "ignoring frame of unknown kind");
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed frame");
            }
        }
    }

    /// Persist a content message, then broadcast it
    async fn publish(&self, handle: &ConnectionHandle, mut message: Message) {
        let room_id = handle.room_id();
        let user_id = handle.user_id();

        message.ensure_id();
        message.room_id = room_id.to_string();
        message.author_id = user_id.to_string();
        message.stamp();

        if let Err(e) = self.app.log.append(room_id, &message).await {
            tracing::error!(message_id = %message.id, error = %e, "append failed, message not delivered");
            let notice = RoomEvent::delivery_failed(room_id, message.id, e.to_string());
            if let Err(e) = handle.send_text(notice.to_json(), self.app.registry.write_timeout()).await {
                tracing::warn!(error = %e, "delivery failure notice not sent");
            }
            return;
        }

        tracing::debug!(message_id = %message.id, kind = message.kind(), "message appended");
        let sender = [user_id];
        let exclude: &[&str] = if ECHO_TO_SENDER { &[] } else { &sender };
        self.app
            .registry
            .broadcast(room_id, &codec::encode(&message), exclude)
            .await;
    }

    async fn relay_typing(&self, handle: &ConnectionHandle, typing: TypingBody) {
        let event = RoomEvent::typing(handle.room_id(), handle.user_id(), typing.is_typing);
        self.app
            .registry
            .broadcast(handle.room_id(), &event.to_json(), &[handle.user_id()])
            .await;
    }

    /// Deregister and announce the departure; runs once
    async fn close(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        self.transition(SessionState::Closing);

        if let Some(handle) = self.handle.take() {
            depart(&self.app, &handle).await;
        }
        if let Err(e) = self.outbound.try_send(Outbound::Close(CloseReason::Normal)) {
            tracing::debug!(error = %e, "close not queued");
        }
        self.transition(SessionState::Closed);
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let app = self.app.clone();
                runtime.spawn(async move { depart(&app, &handle).await });
            }
            Err(_) => tracing::error!(
                room_id = handle.room_id(),
                user_id = handle.user_id(),
                "session dropped outside a runtime, connection left registered"
            ),
        }
    }
}

/// Remove a connection and tell the room, unless it was already replaced
async fn depart(app: &AppState, handle: &ConnectionHandle) {
    let removed = app
        .registry
        .deregister(handle.room_id(), handle.user_id(), handle.id())
        .await;
    if !removed {
        tracing::debug!("connection was replaced, not announcing departure");
        return;
    }
    let left = RoomEvent::user_left(handle.room_id(), handle.user_id());
    app.registry
        .broadcast(handle.room_id(), &left.to_json(), &[handle.user_id()])
        .await;
}
