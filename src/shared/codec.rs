/**
 * Envelope Codec
 *
 * Encoding and decoding of room envelopes.
 *
 * # Two-phase decode
 *
 * `decode` first reads only the `kind` discriminator, looks it up in the
 * kind registry (`KINDS`), and then hands the whole frame to that kind's
 * decoder. The dispatch never names a concrete kind: supporting a new kind
 * means adding a payload type and one registry row.
 *
 * # Kind classes
 *
 * - `Content` kinds become a `Message`, are persisted and broadcast.
 * - `Ephemeral` kinds (typing) are broadcast to the other peers and never
 *   persisted.
 */
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::shared::error::DecodeError;
use crate::shared::message::{Handshake, ImageBody, Message, MessageBody, TextBody};

/// How the session treats a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClass {
    Content,
    Ephemeral,
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A message to persist and broadcast
    Content(Message),
    /// A typing indicator
    Typing(TypingBody),
}

impl Inbound {
    pub fn class(&self) -> KindClass {
        match self {
            Inbound::Content(_) => KindClass::Content,
            Inbound::Typing(_) => KindClass::Ephemeral,
        }
    }
}

/// Typing indicator payload
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TypingBody {
    #[serde(default, alias = "isTyping")]
    pub is_typing: bool,
}

/// One row of the kind registry
pub struct KindSpec {
    /// Canonical wire name
    pub name: &'static str,
    /// Older names accepted on input
    pub aliases: &'static [&'static str],
    pub class: KindClass,
    decode: fn(&[u8]) -> Result<Inbound, serde_json::Error>,
}

impl KindSpec {
    fn matches(&self, kind: &str) -> bool {
        self.name == kind || self.aliases.contains(&kind)
    }
}

/// The kind registry
pub static KINDS: &[KindSpec] = &[
    KindSpec {
        name: "text",
        aliases: &["message"],
        class: KindClass::Content,
        decode: decode_content::<TextBody>,
    },
    KindSpec {
        name: "image",
        aliases: &[],
        class: KindClass::Content,
        decode: decode_content::<ImageBody>,
    },
    KindSpec {
        name: "typing",
        aliases: &[],
        class: KindClass::Ephemeral,
        decode: decode_typing,
    },
];

/// Look up a kind by its wire name or alias
pub fn lookup(kind: &str) -> Option<&'static KindSpec> {
    KINDS.iter().find(|spec| spec.matches(kind))
}

#[derive(Deserialize)]
struct KindProbe {
    kind: Option<String>,
}

/// Header fields every content kind shares
#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    room_id: String,
    #[serde(default)]
    author_id: String,
    #[serde(default)]
    timestamp: String,
}

fn decode_content<B>(bytes: &[u8]) -> Result<Inbound, serde_json::Error>
where
    B: DeserializeOwned + Into<MessageBody>,
{
    let header: Header = serde_json::from_slice(bytes)?;
    let body: B = serde_json::from_slice(bytes)?;
    Ok(Inbound::Content(Message {
        id: header.id.unwrap_or_else(Uuid::nil),
        room_id: header.room_id,
        author_id: header.author_id,
        timestamp: header.timestamp,
        body: body.into(),
    }))
}

fn decode_typing(bytes: &[u8]) -> Result<Inbound, serde_json::Error> {
    Ok(Inbound::Typing(serde_json::from_slice(bytes)?))
}

/// Decode one inbound frame
///
/// # Errors
///
/// * `DecodeError::UnknownKind` - the discriminator is not registered
/// * `DecodeError::MalformedPayload` - the frame is not a JSON object with a
///   string `kind`, or the payload does not fit its kind
pub fn decode(bytes: &[u8]) -> Result<Inbound, DecodeError> {
    let probe: KindProbe =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::malformed("", e.to_string()))?;
    let kind = probe
        .kind
        .ok_or_else(|| DecodeError::malformed("", "missing field `kind`"))?;
    let spec = lookup(&kind).ok_or_else(|| DecodeError::unknown_kind(&kind))?;
    (spec.decode)(bytes).map_err(|e| DecodeError::malformed(kind, e.to_string()))
}

/// Decode a stored message
///
/// Log backends use this on read; only content kinds are valid here.
pub fn decode_message(bytes: &[u8]) -> Result<Message, DecodeError> {
    match decode(bytes)? {
        Inbound::Content(message) => Ok(message),
        Inbound::Typing(_) => Err(DecodeError::malformed("typing", "not a content kind")),
    }
}

/// Decode the handshake frame
pub fn decode_handshake(bytes: &[u8]) -> Result<Handshake, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::malformed("handshake", e.to_string()))
}

/// Encode a message for the wire or the log
///
/// A message without a timestamp is stamped with the current time first.
pub fn encode(message: &Message) -> String {
    if message.timestamp.is_empty() {
        let mut stamped = message.clone();
        stamped.stamp();
        return encode_stamped(&stamped);
    }
    encode_stamped(message)
}

fn encode_stamped(message: &Message) -> String {
    serde_json::to_string(message).unwrap_or_else(|e| {
        tracing::error!(error = %e, message_id = %message.id, "failed to serialize message");
        String::from("{}")
    })
}
