/**
 * Message Envelope
 *
 * This module defines the Message envelope shared by the wire and the
 * message log. Every message kind shares the same header fields (`id`,
 * `room_id`, `author_id`, `timestamp`) and adds its own payload, selected by
 * the `kind` discriminator.
 *
 * Serialized form of a text message:
 *
 * ```json
 * {"id":"0190...","room_id":"r1","author_id":"u1","timestamp":"2024-05-01T10:00:00+00:00","kind":"text","content":"hi"}
 * ```
 *
 * The message `id` is a UUIDv7 assigned once by the authoring side and never
 * rewritten afterwards. Storage never invents message ids.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted chat message
///
/// # Fields
/// * `id` - Time-sortable UUIDv7, nil until assigned
/// * `room_id` - Opaque room identifier
/// * `author_id` - Opaque user identifier, stamped from the handshake identity
/// * `timestamp` - RFC3339 creation time, stamped if absent
/// * `body` - Kind-specific payload
///
/// # Example
/// ```rust
/// use talkroom::shared::Message;
///
/// let message = Message::text("r1", "u1", "hello");
/// assert!(!message.id.is_nil());
/// assert_eq!(message.kind(), "text");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Message id, nil when the client did not supply one
    #[serde(default, skip_serializing_if = "Uuid::is_nil")]
    pub id: Uuid,
    /// Room this message belongs to
    #[serde(default)]
    pub room_id: String,
    /// Author of the message
    #[serde(default)]
    pub author_id: String,
    /// RFC3339 timestamp
    #[serde(default)]
    pub timestamp: String,
    /// Kind-specific payload, tagged by `kind`
    #[serde(flatten)]
    pub body: MessageBody,
}

/// Payload of a content message, discriminated by `kind`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MessageBody {
    /// Plain text
    #[serde(alias = "message")]
    Text(TextBody),
    /// Image reference
    Image(ImageBody),
}

/// Text payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBody {
    pub content: String,
}

/// Image payload
///
/// The image itself lives elsewhere; the log only keeps the reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageBody {
    pub image_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

impl From<TextBody> for MessageBody {
    fn from(body: TextBody) -> Self {
        MessageBody::Text(body)
    }
}

impl From<ImageBody> for MessageBody {
    fn from(body: ImageBody) -> Self {
        MessageBody::Image(body)
    }
}

impl MessageBody {
    /// Wire name of this payload's kind
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::Text(_) => "text",
            MessageBody::Image(_) => "image",
        }
    }
}

impl Message {
    /// Create a new message with a fresh id and the current timestamp
    pub fn new(room_id: impl Into<String>, author_id: impl Into<String>, body: MessageBody) -> Self {
        Self {
            id: Uuid::now_v7(),
            room_id: room_id.into(),
            author_id: author_id.into(),
            timestamp: now_rfc3339(),
            body,
        }
    }

    /// Create a new text message
    pub fn text(room_id: impl Into<String>, author_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            room_id,
            author_id,
            MessageBody::Text(TextBody {
                content: content.into(),
            }),
        )
    }

    /// Wire name of this message's kind
    pub fn kind(&self) -> &'static str {
        self.body.kind()
    }

    /// Assign a UUIDv7 id if the message has no usable one yet
    ///
    /// Returns the message id. A client-assigned id is kept when
    /// `is_plausible_id` accepts it and replaced otherwise.
    pub fn ensure_id(&mut self) -> Uuid {
        if !is_plausible_id(self.id) {
            self.id = Uuid::now_v7();
        }
        self.id
    }

    /// Set the timestamp to now if it is empty
    pub fn stamp(&mut self) {
        if self.timestamp.is_empty() {
            self.timestamp = now_rfc3339();
        }
    }
}

/// First frame of every connection
///
/// Both the snake_case field names and the older camelCase ones are accepted.
/// `token` is handed to the identity provider untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Handshake {
    #[serde(default, alias = "roomId")]
    pub room_id: String,
    #[serde(default, alias = "userId")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Handshake {
    pub fn new(room_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            user_id: user_id.into(),
            token: None,
        }
    }

    /// Both identifiers present and not blank
    pub fn is_complete(&self) -> bool {
        !self.room_id.trim().is_empty() && !self.user_id.trim().is_empty()
    }
}

/// How far ahead of the server clock a client-assigned id may be
pub const MAX_ID_SKEW_MS: i64 = 60_000;

/// Whether `id` is a UUIDv7 whose timestamp is not ahead of now by more than
/// `MAX_ID_SKEW_MS`
///
/// The nil id and ids of any other version are rejected.
pub fn is_plausible_id(id: Uuid) -> bool {
    if id.get_version_num() != 7 {
        return false;
    }
    // the top 48 bits of a UUIDv7 are unix milliseconds
    let millis = (id.as_u128() >> 80) as i64;
    millis <= chrono::Utc::now().timestamp_millis() + MAX_ID_SKEW_MS
}

/// Get the current time as an RFC3339 string
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
