//! Authentication context
//!
//! Identity lives with an external auth service; this server only resolves
//! the bearer token it issued into an explicit [`AuthContext`] that is
//! passed to whatever needs it. The resolver is a trait so tests inject
//! their own.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated actor for one request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
}

/// Resolves a bearer token to an identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<AuthContext>;
}

/// Default verifier: the token is the opaque subject the external auth
/// service issued. Nothing is minted or validated here.
pub struct OpaqueTokenVerifier;

#[async_trait]
impl IdentityVerifier for OpaqueTokenVerifier {
    async fn verify(&self, token: &str) -> Option<AuthContext> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(AuthContext {
            user_id: token.to_string(),
        })
    }
}

/// Extractor for routes that require an authenticated actor.
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::AuthRequired)?;

        let token = header.strip_prefix("Bearer ").ok_or(AppError::AuthRequired)?;

        state
            .identity()
            .verify(token)
            .await
            .map(CurrentUser)
            .ok_or(AppError::AuthRequired)
    }
}
