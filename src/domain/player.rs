//! League roster entries and player-name normalization.
//!
//! A player is not a global account: identity is the normalized name within
//! one league. `"  Kyle   B "` and `"kyle b"` are the same player; the
//! spelling seen first becomes the display name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LeagueId;
use crate::error::GatewayError;

/// Maximum player name length, in characters, after normalization.
pub const MAX_PLAYER_NAME_CHARS: usize = 40;

/// A normalized player name and the roster key derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerName {
    /// Trimmed name with internal whitespace collapsed.
    pub display: String,
    /// Lowercased display name; unique within a league.
    pub key: String,
}

impl PlayerName {
    /// Normalizes a raw player name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for empty names or names longer
    /// than [`MAX_PLAYER_NAME_CHARS`].
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let len = display.chars().count();
        if len == 0 || len > MAX_PLAYER_NAME_CHARS {
            return Err(GatewayError::Validation(format!(
                "player name must be 1-{MAX_PLAYER_NAME_CHARS} characters"
            )));
        }
        let key = display.to_lowercase();
        Ok(Self { display, key })
    }
}

/// Roster entry of a league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Roster key (normalized lowercase name).
    pub id: String,
    /// League the player belongs to.
    pub league_id: LeagueId,
    /// Display name.
    pub name: String,
    /// When the player was first registered.
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Creates a roster entry from a normalized name.
    #[must_use]
    pub fn new(league_id: LeagueId, name: PlayerName) -> Self {
        Self {
            id: name.key,
            league_id,
            name: name.display,
            created_at: Utc::now(),
        }
    }
}
