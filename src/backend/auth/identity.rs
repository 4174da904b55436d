/**
 * Identity Verification
 *
 * Credential checks are not done here. An `IdentityProvider` receives the
 * claims a connection presents (the user id from the handshake or the HTTP
 * header, plus an optional token) and answers with the user id to trust, or
 * `Unauthorized`.
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::shared::Handshake;

/// Identity claims presented by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: String,
    pub token: Option<String>,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, token: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token,
        }
    }
}

impl From<&Handshake> for Claims {
    fn from(handshake: &Handshake) -> Self {
        Self {
            user_id: handshake.user_id.clone(),
            token: handshake.token.clone(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unauthorized: {0}")]
pub struct Unauthorized(pub String);

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Vet the claims and return the user id they prove
    async fn verify_handshake(&self, claims: &Claims) -> Result<String, Unauthorized>;
}

/// Trusts the presented user id as long as it is not blank
///
/// For deployments where an upstream proxy has already authenticated the
/// caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedIdentity;

#[async_trait]
impl IdentityProvider for TrustedIdentity {
    async fn verify_handshake(&self, claims: &Claims) -> Result<String, Unauthorized> {
        let user_id = claims.user_id.trim();
        if user_id.is_empty() {
            return Err(Unauthorized("missing user id".to_string()));
        }
        Ok(user_id.to_string())
    }
}
