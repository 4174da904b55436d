//! Backend Module
//!
//! All server-side code of the chat backend. Only compiled with the `ssr`
//! feature.
//!
//! # Architecture
//!
//! - **`server`** - configuration, application state, initialization
//! - **`routes`** - router assembly
//! - **`chat`** - message log, catch-up queries, room sessions, handlers
//! - **`realtime`** - connection registry and fan-out
//! - **`auth`** - identity provider seam
//! - **`directory`** - room membership and user display names
//! - **`middleware`** - auth and origin checks
//! - **`error`** - `BackendError`
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - talkroom-server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── chat/           - Log, history, sessions, handlers
//! ├── realtime/       - Registry and broadcast
//! ├── auth/           - Identity provider
//! ├── directory.rs    - Room and user directories
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Thread Safety
//!
//! One task per connection runs its session. The tasks share the
//! `ConnectionRegistry` (one `RwLock`) and the `MessageLog` (internally
//! synchronized) through `AppState`.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Chat-related backend functionality
pub mod chat;

/// Real-time delivery
pub mod realtime;

/// Backend error types
pub mod error;

/// Identity verification
pub mod auth;

/// Room and user directories
pub mod directory;

/// Middleware for request processing
pub mod middleware;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
