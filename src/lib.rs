//! Talkroom - Main Library
//!
//! Talkroom is the real-time core of a chat backend: persistent WebSocket
//! connections scoped to rooms, fan-out of new messages to everyone in the
//! room, a durable per-room message log, and catch-up from a cursor for
//! reconnecting clients.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by servers and clients
//!   - The `Message` envelope and its kinds
//!   - The two-phase codec and its kind registry
//!   - Room events (joined, left, typing, delivery failure)
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Message log backends (in-memory list, in-memory stream, SQLite)
//!   - Connection registry and broadcast
//!   - Room session coordinator
//!   - Catch-up query service and the Axum routes
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the backend modules and the `talkroom-server`
//!   binary. On by default.
//!
//! # Usage
//!
//! ```rust,no_run
//! use talkroom::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, _state) = create_app(ServerConfig::default()).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Wire Protocol
//!
//! The first frame of a connection is a handshake:
//!
//! ```json
//! {"room_id": "r1", "user_id": "u1"}
//! ```
//!
//! Every later frame is an envelope with a `kind`:
//!
//! ```json
//! {"kind": "text", "content": "hi"}
//! {"kind": "image", "image_url": "https://cdn/x.png", "name": "x.png", "size": 1024}
//! {"kind": "typing", "is_typing": true}
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
