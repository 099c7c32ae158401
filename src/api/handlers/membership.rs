//! Membership handlers: join by invite code, list own memberships.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{JoinRequest, MembershipDto};
use crate::api::extract::OptionalJson;
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /join/{code}` — Join the league behind an invite code.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] if the caller is already a member and
/// [`GatewayError::NotFound`] for unknown codes.
#[utoipa::path(
    post,
    path = "/api/v1/join/{code}",
    tag = "Memberships",
    summary = "Join a league",
    description = "Creates a membership for the caller in the league the invite code points to. Codes are case-insensitive.",
    params(
        ("code" = String, Path, description = "Invite code"),
    ),
    request_body(content = JoinRequest, description = "Optional user identity"),
    responses(
        (status = 201, description = "Membership created", body = MembershipDto),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Unknown invite code", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn join_league(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
    OptionalJson(body): OptionalJson<JoinRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = caller.resolve(body.user_id.as_deref(), state.trust_body_identity)?;
    let membership = state
        .league_service
        .join_league(&code, user.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(MembershipDto::from(membership))))
}

/// `GET /memberships` — Leagues the caller has joined.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] for anonymous callers.
#[utoipa::path(
    get,
    path = "/api/v1/memberships",
    tag = "Memberships",
    summary = "List own memberships",
    description = "Returns every membership of the caller.",
    responses(
        (status = 200, description = "Memberships", body = Vec<MembershipDto>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_memberships(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, GatewayError> {
    let user = caller.required()?;
    let memberships = state.league_service.list_memberships(&user).await?;
    let data: Vec<MembershipDto> = memberships.into_iter().map(Into::into).collect();
    Ok(Json(data))
}

/// Membership routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/join/{code}", post(join_league))
        .route("/memberships", get(list_memberships))
}
