//! Type-safe identifiers for leagues, matches and users.
//!
//! [`LeagueId`] and [`MatchId`] wrap [`uuid::Uuid`] (v4) so they cannot be
//! confused with each other. [`UserId`] wraps the opaque subject string
//! handed out by the identity provider.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a league.
///
/// Generated once at league creation and immutable thereafter. Appears in
/// the league partition key (`LEAGUE#<id>`) and in every mirror item that
/// points back to the league.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct LeagueId(uuid::Uuid);

impl LeagueId {
    /// Creates a new random `LeagueId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `LeagueId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a path segment into a `LeagueId`.
    ///
    /// Returns `None` for anything that is not a UUID; callers treat that
    /// the same as an unknown league.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for LeagueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for LeagueId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique identifier for a logged match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MatchId(uuid::Uuid);

impl MatchId {
    /// Creates a new random `MatchId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque user identifier (the verified token subject).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a subject string.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    /// Returns the subject as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(subject: &str) -> Self {
        Self(subject.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        let a = LeagueId::new();
        let b = LeagueId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_uuid_format() {
        let id = LeagueId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn parse_accepts_display_output() {
        let id = LeagueId::new();
        assert_eq!(LeagueId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(LeagueId::parse("not-a-league"), None);
        assert_eq!(LeagueId::parse(""), None);
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let Ok(json) = serde_json::to_string(&UserId::from("u1")) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"u1\"");
    }
}
