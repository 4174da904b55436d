//! Middleware Module
//!
//! HTTP middleware for the chat backend.
//!
//! - **`auth`** - attaches the identity-provider-vetted user to a request
//! - **`origin`** - rejects WebSocket upgrades from disallowed origins
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//! use talkroom::backend::middleware::auth_middleware;
//!
//! let protected = Router::new()
//!     .route("/messages", get(get_messages))
//!     .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));
//! ```

pub mod auth;
pub mod origin;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser, USER_ID_HEADER};
pub use origin::{origin_allowed, origin_guard};
