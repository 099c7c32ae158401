//! Caller identity.
//!
//! Requests may carry `Authorization: Bearer <jwt>`. The [`Caller`]
//! extractor verifies it through the configured [`TokenVerifier`]; requests
//! without the header are anonymous. Identity fields in request bodies
//! (`requesterId`, `userId`) are reconciled by [`Caller::resolve`].

pub mod jwt;
pub mod key_cache;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

pub use jwt::JwtVerifier;
pub use key_cache::{KeySource, SigningKeyCache, StaticSecret};

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::GatewayError;

/// Identity-layer failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The presented token is malformed, expired or badly signed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The verification key could not be loaded.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
}

impl AuthError {
    /// Returns `true` when the caller's credentials were rejected (as
    /// opposed to the server failing to check them).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidToken(_))
    }
}

/// Turns a bearer token into a user id.
#[async_trait]
pub trait TokenVerifier: Send + Sync + std::fmt::Debug {
    /// Verifies `token` and returns its subject.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for rejected tokens and
    /// [`AuthError::KeyUnavailable`] when verification cannot run.
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

/// The verified caller of a request; `None` when anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    /// Reconciles the token identity with an identity named in the body.
    ///
    /// A body identity that contradicts the token is forbidden. Without a
    /// token the body identity is used only when `trust_body` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] on a mismatch.
    pub fn resolve(
        self,
        body_identity: Option<&str>,
        trust_body: bool,
    ) -> Result<Option<UserId>, GatewayError> {
        let claimed = body_identity.map(str::trim).filter(|s| !s.is_empty());
        match (self.0, claimed) {
            (Some(token_user), Some(claimed)) if token_user.as_str() != claimed => Err(
                GatewayError::Forbidden("body identity does not match the token".to_string()),
            ),
            (Some(token_user), _) => Ok(Some(token_user)),
            (None, Some(claimed)) if trust_body => Ok(Some(UserId::new(claimed))),
            (None, _) => Ok(None),
        }
    }

    /// The caller's id, or [`GatewayError::Unauthorized`] when anonymous.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] for anonymous callers.
    pub fn required(self) -> Result<UserId, GatewayError> {
        self.0.ok_or(GatewayError::Unauthorized)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("authorization header is not ASCII".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("expected a bearer token".to_string()))?;
    Ok(Some(token))
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(Self(None));
        };
        let Some(verifier) = state.verifier.as_ref() else {
            return Err(AuthError::InvalidToken(
                "token verification is not configured".to_string(),
            )
            .into());
        };
        let user = verifier.verify(token).await?;
        Ok(Self(Some(user)))
    }
}
