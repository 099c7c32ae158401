//! OpenAPI document for the REST API.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    AddPlayerRequest, CreateLeagueRequest, CreateMatchRequest, InviteCodeResponse, JoinRequest,
    LeagueDto, MatchDto, MembershipDto, ParticipantDto, ParticipantInput, PlayerDto,
    RenameLeagueRequest, RequesterBody, StandingRowDto, StandingsResponse,
};
use super::handlers::system::HealthResponse;
use crate::domain::Visibility;
use crate::error::{ErrorBody, ErrorResponse};

/// Registers the bearer-token security scheme.
struct BearerAddon;

impl Modify for BearerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    modifiers(&BearerAddon),
    info(
        title = "ladder-gateway",
        description = "Recreational leagues: invite-code membership, match logging and standings."
    ),
    paths(
        super::handlers::league::create_league,
        super::handlers::league::list_owned_leagues,
        super::handlers::league::list_public_leagues,
        super::handlers::league::get_league,
        super::handlers::league::rename_league,
        super::handlers::league::rotate_invite,
        super::handlers::membership::join_league,
        super::handlers::membership::list_memberships,
        super::handlers::matches::list_players,
        super::handlers::matches::add_player,
        super::handlers::matches::create_match,
        super::handlers::matches::list_matches,
        super::handlers::matches::delete_last_match,
        super::handlers::standings::get_standings,
        super::handlers::system::health_handler,
    ),
    components(schemas(
        AddPlayerRequest,
        CreateLeagueRequest,
        CreateMatchRequest,
        ErrorBody,
        ErrorResponse,
        HealthResponse,
        InviteCodeResponse,
        JoinRequest,
        LeagueDto,
        MatchDto,
        MembershipDto,
        ParticipantDto,
        ParticipantInput,
        PlayerDto,
        RenameLeagueRequest,
        RequesterBody,
        StandingRowDto,
        StandingsResponse,
        Visibility,
    )),
    tags(
        (name = "Leagues", description = "League lifecycle"),
        (name = "Memberships", description = "Joining leagues"),
        (name = "Matches", description = "Roster and match log"),
        (name = "Standings", description = "Derived rankings"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/leagues",
            "/api/v1/leagues/public",
            "/api/v1/leagues/{id}",
            "/api/v1/leagues/{id}/invite:rotate",
            "/api/v1/join/{code}",
            "/api/v1/memberships",
            "/api/v1/leagues/{id}/players",
            "/api/v1/leagues/{id}/matches",
            "/api/v1/leagues/{id}/matches/last",
            "/api/v1/leagues/{id}/standings",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "undocumented: {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let schemes = doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer"));
        assert_eq!(schemes, Some(true));
    }
}
