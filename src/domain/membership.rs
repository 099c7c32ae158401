//! League membership created by joining with an invite code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LeagueId, UserId};

/// Association of a user with a league. At most one per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// League joined.
    pub league_id: LeagueId,
    /// Joining user.
    pub user_id: UserId,
    /// When the join succeeded.
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a membership stamped with the current time.
    #[must_use]
    pub fn new(league_id: LeagueId, user_id: UserId) -> Self {
        Self {
            league_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}
