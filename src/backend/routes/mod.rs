//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation, health, tracing layer
//! └── chat_routes.rs  - /chat and /messages with their middleware
//! ```

/// Main router creation
pub mod router;

/// Chat-related routes
pub mod chat_routes;

// Re-export commonly used functions
pub use router::create_router;
