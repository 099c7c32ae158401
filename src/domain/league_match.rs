//! Logged matches: two participants, their point totals and ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LeagueId, MatchId, UserId};

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Roster key of the player.
    pub player_id: String,
    /// Display name at the time the match was logged.
    pub name: String,
    /// Points scored.
    pub points: u32,
}

/// An immutable match record. Only the newest match of a league may be
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Unique match identifier.
    pub id: MatchId,
    /// Owning league.
    pub league_id: LeagueId,
    /// Per-league sequence number; defines chronological order.
    pub seq: u64,
    /// Participants; well-formed matches have exactly two.
    pub participants: Vec<Participant>,
    /// When the match was logged.
    pub created_at: DateTime<Utc>,
    /// Who logged the match.
    #[serde(default)]
    pub created_by: Option<UserId>,
}

/// Result of a two-player match from the first participant's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First participant scored more.
    FirstWins,
    /// Second participant scored more.
    SecondWins,
    /// Equal scores.
    Tie,
}

impl Match {
    /// Returns both participants when the match has exactly two distinct
    /// players, `None` otherwise.
    #[must_use]
    pub fn pair(&self) -> Option<(&Participant, &Participant)> {
        match self.participants.as_slice() {
            [a, b] if a.player_id != b.player_id => Some((a, b)),
            _ => None,
        }
    }

    /// Outcome of a well-formed match.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        let (a, b) = self.pair()?;
        Some(match a.points.cmp(&b.points) {
            std::cmp::Ordering::Greater => Outcome::FirstWins,
            std::cmp::Ordering::Less => Outcome::SecondWins,
            std::cmp::Ordering::Equal => Outcome::Tie,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, points: u32) -> Participant {
        Participant {
            player_id: id.to_string(),
            name: id.to_string(),
            points,
        }
    }

    fn game(participants: Vec<Participant>) -> Match {
        Match {
            id: MatchId::new(),
            league_id: LeagueId::new(),
            seq: 1,
            participants,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    #[test]
    fn outcome_by_points() {
        let m = game(vec![participant("a", 11), participant("b", 8)]);
        assert_eq!(m.outcome(), Some(Outcome::FirstWins));
        let m = game(vec![participant("a", 3), participant("b", 8)]);
        assert_eq!(m.outcome(), Some(Outcome::SecondWins));
        let m = game(vec![participant("a", 5), participant("b", 5)]);
        assert_eq!(m.outcome(), Some(Outcome::Tie));
    }

    #[test]
    fn malformed_matches_have_no_outcome() {
        assert_eq!(game(vec![participant("a", 1)]).outcome(), None);
        assert_eq!(
            game(vec![participant("a", 1), participant("a", 2)]).outcome(),
            None
        );
        assert_eq!(
            game(vec![
                participant("a", 1),
                participant("b", 2),
                participant("c", 3)
            ])
            .outcome(),
            None
        );
    }
}
