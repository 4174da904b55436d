//! Chat Backend Module
//!
//! Server-side room chat:
//!
//! - **`log`** - the per-room message log and its backends
//! - **`history`** - the Catch-up Query Service over the log
//! - **`session`** - the Room Session Coordinator, one per connection
//! - **`handlers`** - the HTTP and WebSocket entry points
//!
//! # Control Flow
//!
//! ```text
//! client ──ws──> handlers::ws ──> session::RoomSession
//!                                   ├── handshake ──> realtime::ConnectionRegistry::register
//!                                   ├── catch-up  ──> history::HistoryService
//!                                   └── read loop ──> codec::decode
//!                                                      ├── content: log::MessageLog::append, then broadcast
//!                                                      └── typing:  broadcast to the others
//! ```

/// Message log
pub mod log;

/// Catch-up queries
pub mod history;

/// Room session coordinator
pub mod session;

/// HTTP handlers
pub mod handlers;

pub use history::{HistoryPage, HistoryService};
pub use session::{InboundFrame, RoomSession, SessionState};
