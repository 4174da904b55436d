/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require an
 * authenticated user. Credentials are not checked here: the presented user
 * id (header `x-user-id`) and optional bearer token are handed to the
 * configured `IdentityProvider`, and the user id it vouches for is attached
 * to the request.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::Claims;
use crate::backend::server::state::AppState;

/// Header carrying the pre-authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user data attached by `auth_middleware`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Authentication middleware
///
/// This middleware:
/// 1. Reads the user id from the `x-user-id` header
/// 2. Reads an optional `Authorization: Bearer <token>`
/// 3. Asks the identity provider to vouch for them
/// 4. Attaches `AuthenticatedUser` to the request extensions
///
/// Returns 401 Unauthorized if the header is missing or the provider refuses.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing {} header", USER_ID_HEADER);
            StatusCode::UNAUTHORIZED
        })?;

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let claims = Claims::new(user_id, token);
    let user_id = app_state
        .identity
        .verify_handshake(&claims)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "identity provider refused request");
            StatusCode::UNAUTHORIZED
        })?;

    request.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// Fails with 401 on routes that are not behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                StatusCode::UNAUTHORIZED
            })?;

        Ok(AuthUser(user))
    }
}
