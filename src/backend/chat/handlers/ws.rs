/**
 * WebSocket Room Handler
 *
 * `GET /chat` upgrades to a WebSocket and runs a `RoomSession` over it.
 *
 * The socket is split in two:
 * - the reader half becomes the session's `InboundFrame` stream (ping and
 *   pong frames are answered by axum and never reach the session)
 * - the writer half is owned by a task draining the connection's outbound
 *   queue; every socket write is bounded by the broadcast write timeout
 */

use std::fmt::Display;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::backend::chat::session::{InboundFrame, RoomSession};
use crate::backend::realtime::{CloseReason, Outbound};
use crate::backend::server::state::AppState;

/// Upgrade the connection and hand it to a room session
pub async fn handle_chat_socket(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(app_state, socket))
}

async fn serve_socket(app_state: AppState, socket: WebSocket) {
    let (sink, stream) = socket.split();

    let (tx, rx) = mpsc::channel(app_state.config.outbound_queue);
    let writer = tokio::spawn(write_frames(sink, rx, app_state.config.broadcast_write_timeout));

    let inbound = stream.filter_map(|frame| async move {
        match frame {
            Ok(WsMessage::Text(text)) => Some(Ok(InboundFrame::Text(text.as_str().to_owned()))),
            Ok(WsMessage::Binary(bytes)) => Some(Ok(InboundFrame::Binary(bytes.to_vec()))),
            Ok(WsMessage::Close(_)) => Some(Ok(InboundFrame::Close)),
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => None,
            Err(e) => Some(Err(e)),
        }
    });

    if let Err(e) = RoomSession::new(app_state, tx).run(Box::pin(inbound)).await {
        tracing::debug!(error = %e, "session ended during handshake");
    }

    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "socket writer task failed");
    }
}

fn close_frame(reason: CloseReason) -> CloseFrame {
    let (code, text) = match reason {
        CloseReason::Normal => (close_code::NORMAL, "bye"),
        CloseReason::Rejected => (close_code::POLICY, "handshake rejected"),
        CloseReason::Evicted => (close_code::AWAY, "replaced by a newer connection"),
    };
    CloseFrame {
        code,
        reason: text.into(),
    }
}

/// Drain the outbound queue into the socket until a close is requested, a
/// write fails, or every sender is gone
async fn write_frames<S>(mut sink: S, mut rx: mpsc::Receiver<Outbound>, timeout: Duration)
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    while let Some(frame) = rx.recv().await {
        let (message, last) = match frame {
            Outbound::Text(text) => (WsMessage::Text(text.into()), false),
            Outbound::Close(reason) => (WsMessage::Close(Some(close_frame(reason))), true),
        };

        match tokio::time::timeout(timeout, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "socket write failed");
                break;
            }
            Err(_) => {
                tracing::warn!(?timeout, "socket write timed out, dropping connection");
                break;
            }
        }
        if last {
            break;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "socket close failed");
    }
}
