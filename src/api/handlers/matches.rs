//! Roster and match-log handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::{
    AddPlayerRequest, CreateMatchRequest, LimitParams, MatchDto, PlayerDto, RequesterBody,
};
use crate::api::extract::{ApiJson, ApiQuery, OptionalJson, league_id};
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /leagues/{id}/players` — League roster.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for unknown or hidden leagues.
#[utoipa::path(
    get,
    path = "/api/v1/leagues/{id}/players",
    tag = "Matches",
    summary = "List players",
    description = "Returns the league roster ordered by normalized name.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    responses(
        (status = 200, description = "Roster", body = Vec<PlayerDto>),
        (status = 404, description = "League not found", body = ErrorResponse),
    )
)]
pub async fn list_players(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let players = state
        .league_service
        .list_players(id, caller.0.as_ref())
        .await?;
    let data: Vec<PlayerDto> = players.into_iter().map(Into::into).collect();
    Ok(Json(data))
}

/// `POST /leagues/{id}/players` — Add a player to the roster.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] if the normalized name is taken.
#[utoipa::path(
    post,
    path = "/api/v1/leagues/{id}/players",
    tag = "Matches",
    summary = "Add a player",
    description = "Registers a roster entry. Names are compared case-insensitively after collapsing whitespace. Owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    request_body = AddPlayerRequest,
    responses(
        (status = 201, description = "Player added", body = PlayerDto),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "League not found", body = ErrorResponse),
        (status = 409, description = "Player already exists", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn add_player(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddPlayerRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let requester = caller.resolve(req.requester_id.as_deref(), state.trust_body_identity)?;
    let player = state
        .league_service
        .add_player(id, requester.as_ref(), &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(PlayerDto::from(player))))
}

/// `POST /leagues/{id}/matches` — Record a match.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for malformed participants and
/// [`GatewayError::Conflict`] when another write won the race.
#[utoipa::path(
    post,
    path = "/api/v1/leagues/{id}/matches",
    tag = "Matches",
    summary = "Record a match",
    description = "Appends a two-player match to the league log. Unknown player names join the roster. Owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match recorded", body = MatchDto),
        (status = 400, description = "Invalid participants", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "League not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification, retry", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_match(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CreateMatchRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let requester = caller.resolve(req.requester_id.as_deref(), state.trust_body_identity)?;
    let game = state
        .league_service
        .record_match(id, requester.as_ref(), &req.entries())
        .await?;
    Ok((StatusCode::CREATED, Json(MatchDto::from(game))))
}

/// `GET /leagues/{id}/matches` — Newest matches first.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for unknown or hidden leagues.
#[utoipa::path(
    get,
    path = "/api/v1/leagues/{id}/matches",
    tag = "Matches",
    summary = "List matches",
    description = "Returns the newest matches of the league.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
        LimitParams,
    ),
    responses(
        (status = 200, description = "Matches, newest first", body = Vec<MatchDto>),
        (status = 400, description = "Invalid limit", body = ErrorResponse),
        (status = 404, description = "League not found", body = ErrorResponse),
    )
)]
pub async fn list_matches(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let matches = state
        .league_service
        .list_matches(id, caller.0.as_ref(), params.limit)
        .await?;
    let data: Vec<MatchDto> = matches.into_iter().map(Into::into).collect();
    Ok(Json(data))
}

/// `DELETE /leagues/{id}/matches/last` — Undo the newest match.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] when there is no match and
/// [`GatewayError::Conflict`] when the match log changed concurrently.
#[utoipa::path(
    delete,
    path = "/api/v1/leagues/{id}/matches/last",
    tag = "Matches",
    summary = "Delete the newest match",
    description = "Removes the most recent match. Fails with 409 if another match was recorded in the meantime. Owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    request_body(content = RequesterBody, description = "Optional requester identity"),
    responses(
        (status = 200, description = "Deleted match", body = MatchDto),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "League or match not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification, retry", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_last_match(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    OptionalJson(body): OptionalJson<RequesterBody>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let requester = caller.resolve(body.requester_id.as_deref(), state.trust_body_identity)?;
    let deleted = state
        .league_service
        .delete_last_match(id, requester.as_ref())
        .await?;
    Ok(Json(MatchDto::from(deleted)))
}

/// Roster and match routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leagues/{id}/players", get(list_players).post(add_player))
        .route("/leagues/{id}/matches", get(list_matches).post(create_match))
        .route("/leagues/{id}/matches/last", delete(delete_last_match))
}
