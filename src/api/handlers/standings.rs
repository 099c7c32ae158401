//! Standings handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::StandingsResponse;
use crate::api::extract::league_id;
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /leagues/{id}/standings` — Ranked standings.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for unknown or hidden leagues.
#[utoipa::path(
    get,
    path = "/api/v1/leagues/{id}/standings",
    tag = "Standings",
    summary = "Get standings",
    description = "Computes standings from the newest matches on every request. Ordered by win percentage, wins, point differential, then name.",
    params(
        ("id" = uuid::Uuid, Path, description = "League UUID"),
    ),
    responses(
        (status = 200, description = "Ranked standings", body = StandingsResponse),
        (status = 404, description = "League not found", body = ErrorResponse),
    )
)]
pub async fn get_standings(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = league_id(&id)?;
    let standings = state
        .league_service
        .standings(id, caller.0.as_ref())
        .await?;
    Ok(Json(StandingsResponse::new(id, standings)))
}

/// Standings routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/leagues/{id}/standings", get(get_standings))
}
