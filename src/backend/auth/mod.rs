//! Authentication Module
//!
//! Identity is owned by an external collaborator. This module only defines
//! the seam the room sessions and the HTTP middleware call through:
//!
//! - **`identity`** - `IdentityProvider`, `Claims`, `Unauthorized`, and the
//!   `TrustedIdentity` default
//!
//! # Authentication Flow
//!
//! 1. **WebSocket**: the handshake's `user_id` and optional `token` are
//!    passed to `verify_handshake`; a rejection closes the connection before
//!    it is registered.
//! 2. **HTTP**: the auth middleware reads the `x-user-id` header (and an
//!    optional bearer token), asks the same provider, and stores the result
//!    as `AuthenticatedUser` in the request extensions.

/// Identity provider seam
pub mod identity;

pub use identity::{Claims, IdentityProvider, TrustedIdentity, Unauthorized};
