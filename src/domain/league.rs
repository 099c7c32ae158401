//! League aggregate, visibility and name validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LeagueId, UserId};
use crate::error::GatewayError;

/// Minimum league name length, in characters, after trimming.
pub const MIN_LEAGUE_NAME_CHARS: usize = 2;

/// Maximum league name length, in characters, after trimming.
pub const MAX_LEAGUE_NAME_CHARS: usize = 40;

/// Who may read a league's roster, matches and standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Readable by anyone, including anonymous callers.
    Public,
    /// Readable by the owner only.
    Private,
}

impl Visibility {
    /// Lowercase wire/storage form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// League metadata record. Exactly one per league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    /// Unique league identifier (immutable).
    pub id: LeagueId,
    /// Display name, already trimmed and validated.
    pub name: String,
    /// User who created the league and may mutate it.
    pub owner_id: UserId,
    /// Current invite code. Resolves to this league only.
    pub invite_code: String,
    /// Read visibility.
    pub visibility: Visibility,
    /// Creation timestamp (immutable).
    pub created_at: DateTime<Utc>,
}

impl League {
    /// Creates a league owned by `owner_id`, stamped with the current time.
    #[must_use]
    pub fn new(name: String, owner_id: UserId, invite_code: String, visibility: Visibility) -> Self {
        Self {
            id: LeagueId::new(),
            name,
            owner_id,
            invite_code,
            visibility,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` when `user` owns the league.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }
}

/// Trims and bounds-checks a league name.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] when the trimmed name is shorter
/// than [`MIN_LEAGUE_NAME_CHARS`] or longer than [`MAX_LEAGUE_NAME_CHARS`].
pub fn validate_league_name(raw: &str) -> Result<String, GatewayError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(MIN_LEAGUE_NAME_CHARS..=MAX_LEAGUE_NAME_CHARS).contains(&len) {
        return Err(GatewayError::Validation(format!(
            "league name must be {MIN_LEAGUE_NAME_CHARS}-{MAX_LEAGUE_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}
