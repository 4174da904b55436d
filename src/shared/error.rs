//! Shared Error Types
//!
//! This module defines the error types produced by the transport-agnostic
//! half of the crate. They describe why an inbound frame could not be turned
//! into a room envelope.
//!
//! # Error Categories
//!
//! - `UnknownKind` - the `kind` discriminator names no registered kind
//! - `MalformedPayload` - the kind is known but its fields do not parse
//!
//! Both are scoped to a single frame. A session that hits either one logs it
//! and keeps reading.
//!
//! # Usage
//!
//! ```rust
//! use talkroom::shared::error::DecodeError;
//!
//! let error = DecodeError::unknown_kind("sticker");
//! assert!(error.to_string().contains("sticker"));
//! ```
use thiserror::Error;

/// Failure to decode one inbound frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The `kind` discriminator is not in the kind registry
    #[error("unknown message kind '{kind}'")]
    UnknownKind {
        /// The discriminator exactly as received
        kind: String,
    },

    /// The payload could not be parsed for its declared kind
    ///
    /// A frame without any readable `kind` field is reported here with an
    /// empty kind.
    #[error("malformed payload for kind '{kind}': {message}")]
    MalformedPayload {
        /// The discriminator, empty when it could not be read
        kind: String,
        /// Parser message
        message: String,
    },
}

impl DecodeError {
    /// Create a new unknown kind error
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }

    /// Create a new malformed payload error
    pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The discriminator this error is about
    pub fn kind(&self) -> &str {
        match self {
            Self::UnknownKind { kind } => kind,
            Self::MalformedPayload { kind, .. } => kind,
        }
    }
}
