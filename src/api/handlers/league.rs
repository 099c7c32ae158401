//! League handlers: create, list, get, rename, rotate invite.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateLeagueRequest, InviteCodeResponse, LeagueDto, LimitParams, RenameLeagueRequest,
    RequesterBody,
};
use crate::api::extract::{ApiJson, ApiQuery, OptionalJson, league_id};
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /leagues` — Create a league owned by the caller.
///
/// # Errors
///
/// Returns [`GatewayError`] for anonymous callers or an invalid name.
#[utoipa::path(
    post,
    path = "/api/v1/leagues",
    tag = "Leagues",
    summary = "Create a league",
    description = "Creates a league owned by the caller with a fresh invite code.",
    request_body = CreateLeagueRequest,
    responses(
        (status = 201, description = "League created", body = LeagueDto),
        (status = 400, description = "Invalid name or visibility", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 409, description = "Invite code allocation failed, retry", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_league(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(req): ApiJson<CreateLeagueRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let owner = caller
        .resolve(req.requester_id.as_deref(), state.trust_body_identity)?
        .ok_or(GatewayError::Unauthorized)?;
    let league = state
        .league_service
        .create_league(&owner, &req.name, req.visibility)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(LeagueDto::for_viewer(league, Some(&owner))),
    ))
}

/// `GET /leagues` — Leagues owned by the caller, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] for anonymous callers.
#[utoipa::path(
    get,
    path = "/api/v1/leagues",
    tag = "Leagues",
    summary = "List own leagues",
    description = "Returns the leagues owned by the caller, newest first.",
    responses(
        (status = 200, description = "Owned leagues", body = Vec<LeagueDto>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_owned_leagues(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, GatewayError> {
    let owner = caller.required()?;
    let leagues = state.league_service.list_owned_leagues(&owner).await?;
    let data: Vec<LeagueDto> = leagues
        .into_iter()
        .map(|l| LeagueDto::for_viewer(l, Some(&owner)))
        .collect();
    Ok(Json(data))
}

/// `GET /leagues/public` — Public leagues, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for a limit outside 1–200.
#[utoipa::path(
    get,
    path = "/api/v1/leagues/public",
    tag = "Leagues",
    summary = "List public leagues",
    description = "Returns public leagues, newest first. Invite codes are omitted.",
    params(LimitParams),
    responses(
        (status = 200, description = "Public leagues", body = Vec<LeagueDto>),
        (status = 400, description = "Invalid limit", body = ErrorResponse),
    )
)]
pub async fn list_public_leagues(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let leagues = state.league_service.list_public_leagues(params.limit).await?;
    let data: Vec<LeagueDto> = leagues
        .into_iter()
        .map(|l| LeagueDto::for_viewer(l, caller.0.as_ref()))
        .collect();
    Ok(Json(data))
}

/// `GET /leagues/{id}` — League metadata.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for unknown or hidden leagues.
#[utoipa::path(
    get,
    path = "/api/v1/leagues/{id}",
    tag = "Leagues",
    summary = "Get a league",
    description = "Returns league metadata. The invite code is included for the owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    responses(
        (status = 200, description = "League", body = LeagueDto),
        (status = 404, description = "League not found", body = ErrorResponse),
    )
)]
pub async fn get_league(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let viewer = caller.0;
    let league = state.league_service.get_league(id, viewer.as_ref()).await?;
    Ok(Json(LeagueDto::for_viewer(league, viewer.as_ref())))
}

/// `PATCH /leagues/{id}` — Rename a league.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller is not the owner or the name is
/// invalid.
#[utoipa::path(
    patch,
    path = "/api/v1/leagues/{id}",
    tag = "Leagues",
    summary = "Rename a league",
    description = "Changes the league name. Owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    request_body = RenameLeagueRequest,
    responses(
        (status = 200, description = "Renamed league", body = LeagueDto),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "League not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn rename_league(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RenameLeagueRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let requester = caller.resolve(req.requester_id.as_deref(), state.trust_body_identity)?;
    let league = state
        .league_service
        .rename_league(id, requester.as_ref(), &req.name)
        .await?;
    Ok(Json(LeagueDto::for_viewer(league, requester.as_ref())))
}

/// `POST /leagues/{id}/invite:rotate` — Replace the invite code.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller is not the owner or no code
/// could be allocated.
#[utoipa::path(
    post,
    path = "/api/v1/leagues/{id}/invite:rotate",
    tag = "Leagues",
    summary = "Rotate the invite code",
    description = "Issues a new invite code. The previous code stops working immediately. Owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    request_body(content = RequesterBody, description = "Optional requester identity"),
    responses(
        (status = 200, description = "New invite code", body = InviteCodeResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "League not found", body = ErrorResponse),
        (status = 409, description = "Invite code allocation failed, retry", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn rotate_invite(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    OptionalJson(body): OptionalJson<RequesterBody>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let requester = caller.resolve(body.requester_id.as_deref(), state.trust_body_identity)?;
    let league = state
        .league_service
        .rotate_invite(id, requester.as_ref())
        .await?;
    Ok(Json(InviteCodeResponse {
        league_id: league.id,
        invite_code: league.invite_code,
    }))
}

/// League routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leagues", post(create_league).get(list_owned_leagues))
        .route("/leagues/public", get(list_public_leagues))
        .route("/leagues/{id}", get(get_league).patch(rename_league))
        .route("/leagues/{id}/invite:rotate", post(rotate_invite))
}
