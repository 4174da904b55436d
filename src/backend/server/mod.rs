//! Server Module
//!
//! Process wiring for the chat backend.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── config.rs       - ServerConfig loaded from the environment
//! ├── state.rs        - AppState and FromRef implementations
//! └── init.rs         - Message log selection and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::from_env` (after `dotenv`)
//! 2. **Message Log**: open the backend named by `LOG_BACKEND`
//! 3. **State Creation**: registry, history service, collaborators
//! 4. **Router Creation**: routes, middleware, tracing
//!
//! # Example
//!
//! ```rust,no_run
//! use talkroom::backend::server::{config::ServerConfig, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, _state) = create_app(ServerConfig::from_env()?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:18000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::{create_app, open_message_log};
pub use state::AppState;
