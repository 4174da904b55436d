/**
 * Room Events
 *
 * Outbound frames that are not persisted messages: presence (joined/left),
 * typing indicators, and delivery failures reported back to a sender.
 * They share the envelope convention of a `kind` discriminator.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::message::now_rfc3339;

/// Event delivered to the connections of a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RoomEvent {
    /// A user registered a connection in the room
    UserJoined {
        room_id: String,
        user_id: String,
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    /// A user's connection left the room
    UserLeft {
        room_id: String,
        user_id: String,
        timestamp: String,
    },
    /// A user started or stopped typing
    Typing {
        room_id: String,
        user_id: String,
        is_typing: bool,
    },
    /// A message from this connection was not stored and was not broadcast
    DeliveryFailed {
        room_id: String,
        message_id: Uuid,
        reason: String,
    },
}

impl RoomEvent {
    /// Create a joined event
    pub fn user_joined(room_id: &str, user_id: &str, display_name: Option<String>) -> Self {
        Self::UserJoined {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            timestamp: now_rfc3339(),
            display_name,
        }
    }

    /// Create a left event
    pub fn user_left(room_id: &str, user_id: &str) -> Self {
        Self::UserLeft {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            timestamp: now_rfc3339(),
        }
    }

    /// Create a typing event
    pub fn typing(room_id: &str, user_id: &str, is_typing: bool) -> Self {
        Self::Typing {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            is_typing,
        }
    }

    /// Create a delivery failure notice
    pub fn delivery_failed(room_id: &str, message_id: Uuid, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            room_id: room_id.to_string(),
            message_id,
            reason: reason.into(),
        }
    }

    /// Wire name of this event's kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserJoined { .. } => "userJoined",
            Self::UserLeft { .. } => "userLeft",
            Self::Typing { .. } => "typing",
            Self::DeliveryFailed { .. } => "deliveryFailed",
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, kind = self.kind(), "failed to serialize room event");
            format!(r#"{{"kind":"{}"}}"#, self.kind())
        })
    }
}
