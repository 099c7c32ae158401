//! Match and roster DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{LeagueId, Match, MatchId, Participant, Player, UserId};
use crate::service::MatchEntry;

/// One side of a submitted match.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParticipantInput {
    /// Player name; unknown names join the roster.
    pub name: String,
    /// Points scored (non-negative).
    pub points: u32,
}

/// Request body for `POST /leagues/{id}/matches`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    /// Exactly two participants.
    pub participants: Vec<ParticipantInput>,
    /// Acting user; only honoured when body identity is trusted.
    #[serde(default)]
    pub requester_id: Option<String>,
}

impl CreateMatchRequest {
    /// Participants as service input.
    #[must_use]
    pub fn entries(&self) -> Vec<MatchEntry> {
        self.participants
            .iter()
            .map(|p| MatchEntry {
                name: p.name.clone(),
                points: p.points,
            })
            .collect()
    }
}

/// A match participant as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    /// Roster key.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Points scored.
    pub points: u32,
}

impl From<Participant> for ParticipantDto {
    fn from(p: Participant) -> Self {
        Self {
            player_id: p.player_id,
            name: p.name,
            points: p.points,
        }
    }
}

/// A match as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    /// Match identifier.
    pub id: MatchId,
    /// Owning league.
    pub league_id: LeagueId,
    /// Position in the league's match log (1-based).
    pub seq: u64,
    /// The two participants.
    pub participants: Vec<ParticipantDto>,
    /// Recording timestamp.
    pub created_at: DateTime<Utc>,
    /// Recording user, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl From<Match> for MatchDto {
    fn from(m: Match) -> Self {
        Self {
            id: m.id,
            league_id: m.league_id,
            seq: m.seq,
            participants: m.participants.into_iter().map(Into::into).collect(),
            created_at: m.created_at,
            created_by: m.created_by,
        }
    }
}

/// Request body for `POST /leagues/{id}/players`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayerRequest {
    /// Player name.
    pub name: String,
    /// Acting user; only honoured when body identity is trusted.
    #[serde(default)]
    pub requester_id: Option<String>,
}

/// A roster entry as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    /// Roster key (normalized lowercase name).
    pub id: String,
    /// Display name (first-seen spelling).
    pub name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Player> for PlayerDto {
    fn from(p: Player) -> Self {
        Self {
            id: p.id,
            name: p.name,
            created_at: p.created_at,
        }
    }
}
