//! Backend Error Module
//!
//! Error types of the chat backend and their HTTP conversion.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - BackendError and its status mapping
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! Lower layers keep their own narrow errors (`DecodeError`, `LogError`,
//! `SendError`, `Unauthorized`, `CursorError`, `ConfigError`); all of them
//! convert into `BackendError` with `?`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
