//! Chat Handlers Module
//!
//! Axum handlers for the chat endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and documentation
//! ├── ws.rs       - GET /chat, WebSocket room sessions
//! └── history.rs  - GET /messages, catch-up over HTTP
//! ```

/// WebSocket upgrade into a room session
pub mod ws;

/// History endpoint
pub mod history;

pub use history::{get_messages, HistoryQuery, HistoryResponse};
pub use ws::handle_chat_socket;
