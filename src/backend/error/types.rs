/**
 * Backend Error Types
 *
 * The error taxonomy of the chat backend. Every variant is scoped to one
 * connection, one message or one request; none of them is fatal to the
 * process.
 *
 * # Error Categories
 *
 * ## Connection errors
 *
 * - `HandshakeInvalid` - the first frame was missing, malformed or incomplete;
 *   the connection closes without registration
 * - `Unauthorized` - the identity provider rejected the claims
 * - `Forbidden` - the user is not a member of the room
 *
 * ## Message errors
 *
 * - `Decode` - unknown kind or malformed payload; the read loop continues
 * - `StorageUnavailable` - the message log could not be reached; the message
 *   is dropped and the sender is told
 * - `TransportWriteFailed` - one peer's write failed during a broadcast
 *
 * ## Request errors
 *
 * - `InvalidCursor` - a history cursor that is neither an id nor an offset
 * - `Handler` - anything else a handler wants to answer with a given status
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::auth::Unauthorized;
use crate::backend::chat::log::{CursorError, LogError};
use crate::backend::realtime::SendError;
use crate::backend::server::config::ConfigError;
use crate::shared::DecodeError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use talkroom::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handshake("missing room_id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid handshake: {message}")]
    HandshakeInvalid { message: String },

    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    #[error("user '{user_id}' is not a member of room '{room_id}'")]
    Forbidden { room_id: String, user_id: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("transport write failed: {0}")]
    TransportWriteFailed(#[from] SendError),

    #[error(transparent)]
    InvalidCursor(#[from] CursorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{message}")]
    Handler {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<LogError> for BackendError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::StorageUnavailable(message) => Self::StorageUnavailable { message },
            other @ (LogError::Corrupt { .. } | LogError::IdsExhausted { .. }) => {
                Self::internal(other.to_string())
            }
        }
    }
}

impl BackendError {
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::HandshakeInvalid {
            message: message.into(),
        }
    }

    pub fn forbidden(room_id: &str, user_id: &str) -> Self {
        Self::Forbidden {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Create a handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandshakeInvalid`, `Decode`, `InvalidCursor` - 400 Bad Request
    /// - `Unauthorized` - 401 Unauthorized
    /// - `Forbidden` - 403 Forbidden
    /// - `StorageUnavailable` - 503 Service Unavailable
    /// - `Handler` - uses the status code from the error
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandshakeInvalid { .. } | Self::Decode(_) | Self::InvalidCursor(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Handler { status, .. } => *status,
            Self::TransportWriteFailed(_) | Self::Config(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}
