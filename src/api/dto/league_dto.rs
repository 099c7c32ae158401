//! League and membership DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{League, LeagueId, Membership, UserId, Visibility};

/// Request body for `POST /leagues`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeagueRequest {
    /// League name, 2–40 characters after trimming.
    pub name: String,
    /// `public` or `private`.
    pub visibility: Visibility,
    /// Owner; only honoured when body identity is trusted.
    #[serde(default)]
    pub requester_id: Option<String>,
}

/// Request body for `PATCH /leagues/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameLeagueRequest {
    /// New league name.
    pub name: String,
    /// Acting user; only honoured when body identity is trusted.
    #[serde(default)]
    pub requester_id: Option<String>,
}

/// League as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeagueDto {
    /// League identifier.
    pub id: LeagueId,
    /// Display name.
    pub name: String,
    /// Owning user.
    pub owner_id: UserId,
    /// Current invite code; present for the owner only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    /// `public` or `private`.
    pub visibility: Visibility,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl LeagueDto {
    /// Projects a league for `viewer`, hiding the invite code from
    /// everyone but the owner.
    #[must_use]
    pub fn for_viewer(league: League, viewer: Option<&UserId>) -> Self {
        let is_owner = viewer.is_some_and(|v| league.is_owned_by(v));
        Self {
            id: league.id,
            name: league.name,
            owner_id: league.owner_id,
            invite_code: is_owner.then_some(league.invite_code),
            visibility: league.visibility,
            created_at: league.created_at,
        }
    }
}

/// Response body for `POST /leagues/{id}/invite:rotate`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteCodeResponse {
    /// League identifier.
    pub league_id: LeagueId,
    /// The new invite code.
    pub invite_code: String,
}

/// Request body for `POST /join/{code}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Joining user; only honoured when body identity is trusted.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Membership as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDto {
    /// League joined.
    pub league_id: LeagueId,
    /// Member.
    pub user_id: UserId,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
}

impl From<Membership> for MembershipDto {
    fn from(m: Membership) -> Self {
        Self {
            league_id: m.league_id,
            user_id: m.user_id,
            joined_at: m.joined_at,
        }
    }
}
