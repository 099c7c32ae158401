//! Standings DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{LeagueId, StandingRow, Standings};

/// One ranked line of the standings table.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StandingRowDto {
    /// 1-based rank.
    pub rank: usize,
    /// Roster key.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Matches tied.
    pub ties: u32,
    /// Decided matches (`wins + losses`).
    pub games: u32,
    /// `W-L` (or `W-L-T`).
    pub record: String,
    /// Win fraction rounded to three decimals.
    pub win_pct: f64,
    /// Win percentage for display, e.g. `"66.7%"`.
    pub win_pct_display: String,
    /// Points scored.
    pub points_for: u64,
    /// Points conceded.
    pub points_against: u64,
    /// `pointsFor - pointsAgainst`.
    pub point_diff: i64,
    /// Signed streak: positive wins, negative losses.
    pub streak: i32,
    /// `W<n>`, `L<n>` or `-`.
    pub streak_label: String,
}

impl From<StandingRow> for StandingRowDto {
    fn from(row: StandingRow) -> Self {
        let record = row.record();
        let streak_label = row.streak_label();
        let thousandths = row.win_pct_thousandths;
        Self {
            rank: row.rank,
            player_id: row.player_id,
            name: row.name,
            wins: row.wins,
            losses: row.losses,
            ties: row.ties,
            games: row.games,
            record,
            win_pct: row.win_pct,
            win_pct_display: format!("{}.{}%", thousandths / 10, thousandths % 10),
            points_for: row.points_for,
            points_against: row.points_against,
            point_diff: row.point_diff,
            streak: row.streak,
            streak_label,
        }
    }
}

/// Response body for `GET /leagues/{id}/standings`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    /// League identifier.
    pub league_id: LeagueId,
    /// Well-formed matches that contributed.
    pub match_count: usize,
    /// Ranked rows.
    pub rows: Vec<StandingRowDto>,
}

impl StandingsResponse {
    /// Wraps computed standings for `league_id`.
    #[must_use]
    pub fn new(league_id: LeagueId, standings: Standings) -> Self {
        Self {
            league_id,
            match_count: standings.match_count,
            rows: standings.rows.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(wins: u32, losses: u32, thousandths: u32, streak: i32) -> StandingRow {
        StandingRow {
            rank: 1,
            player_id: "kyle".into(),
            name: "Kyle".into(),
            wins,
            losses,
            ties: 0,
            games: wins + losses,
            win_pct_thousandths: thousandths,
            win_pct: f64::from(thousandths) / 1000.0,
            points_for: 11,
            points_against: 8,
            point_diff: 3,
            streak,
        }
    }

    #[test]
    fn percentages_render_with_one_decimal() {
        assert_eq!(StandingRowDto::from(row(1, 0, 1000, 1)).win_pct_display, "100.0%");
        assert_eq!(StandingRowDto::from(row(2, 1, 667, -1)).win_pct_display, "66.7%");
        assert_eq!(StandingRowDto::from(row(0, 1, 0, -1)).win_pct_display, "0.0%");
    }

    #[test]
    fn labels_are_precomputed() {
        let dto = StandingRowDto::from(row(1, 0, 1000, 1));
        assert_eq!(dto.record, "1-0");
        assert_eq!(dto.streak_label, "W1");
    }
}
