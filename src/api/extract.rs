//! Request extractors whose rejections use the gateway error envelope.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use serde::de::DeserializeOwned;

use crate::domain::LeagueId;
use crate::error::GatewayError;

/// `axum::Json` with [`GatewayError`] rejections.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(GatewayError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with [`GatewayError`] rejections.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(GatewayError))]
pub struct ApiQuery<T>(pub T);

/// A JSON body that may be omitted entirely; an empty body yields
/// `T::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| GatewayError::Validation(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| GatewayError::Validation(format!("invalid JSON body: {e}")))
    }
}

/// Parses a league id path segment. Malformed ids are reported as an
/// unknown league.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] when `raw` is not a UUID.
pub fn league_id(raw: &str) -> Result<LeagueId, GatewayError> {
    LeagueId::parse(raw).ok_or(GatewayError::NotFound("league"))
}
