//! Ranked standings derived from a league's match log.
//!
//! Standings are never stored. Every read folds the (bounded) match log
//! into per-player tallies, derives win percentage and point differential,
//! and sorts with a total, deterministic order:
//!
//! 1. win percentage, descending
//! 2. wins, descending
//! 3. point differential, descending
//! 4. display name, ascending (case-sensitive)
//! 5. player id, ascending
//!
//! Win percentage is compared in integer thousandths so equal records
//! always tie exactly.

use std::collections::BTreeMap;

use super::league_match::{Match, Outcome};

/// Newest matches folded into standings unless configured otherwise.
pub const DEFAULT_MATCH_WINDOW: usize = 500;

/// One ranked line of the standings table.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingRow {
    /// 1-based position in the table.
    pub rank: usize,
    /// Roster key.
    pub player_id: String,
    /// Display name from the player's most recent match.
    pub name: String,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Matches tied (not part of `games`).
    pub ties: u32,
    /// `wins + losses`.
    pub games: u32,
    /// `wins / games` in thousandths, rounded half up.
    pub win_pct_thousandths: u32,
    /// `wins / games` rounded to three decimals; 0 without decided games.
    pub win_pct: f64,
    /// Points scored.
    pub points_for: u64,
    /// Points conceded.
    pub points_against: u64,
    /// `points_for - points_against`.
    pub point_diff: i64,
    /// Signed run of consecutive wins (positive) or losses (negative).
    pub streak: i32,
}

impl StandingRow {
    /// `W-L`, or `W-L-T` when the player has ties.
    #[must_use]
    pub fn record(&self) -> String {
        if self.ties > 0 {
            format!("{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            format!("{}-{}", self.wins, self.losses)
        }
    }

    /// `W3`, `L1`, or `-` without a streak.
    #[must_use]
    pub fn streak_label(&self) -> String {
        match self.streak {
            0 => "-".to_string(),
            s if s > 0 => format!("W{s}"),
            s => format!("L{}", s.unsigned_abs()),
        }
    }
}

/// Computed standings for one league.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Standings {
    /// Ranked rows.
    pub rows: Vec<StandingRow>,
    /// Number of well-formed matches that contributed.
    pub match_count: usize,
}

#[derive(Debug, Default)]
struct Tally {
    name: String,
    wins: u32,
    losses: u32,
    ties: u32,
    points_for: u64,
    points_against: u64,
    streak: i32,
}

impl Tally {
    fn score(&mut self, name: &str, scored: u32, conceded: u32) {
        name.clone_into(&mut self.name);
        self.points_for += u64::from(scored);
        self.points_against += u64::from(conceded);
    }

    fn win(&mut self) {
        self.wins += 1;
        self.streak = if self.streak > 0 { self.streak + 1 } else { 1 };
    }

    fn loss(&mut self) {
        self.losses += 1;
        self.streak = if self.streak < 0 { self.streak - 1 } else { -1 };
    }
}

fn win_pct_thousandths(wins: u32, games: u32) -> u32 {
    if games == 0 {
        return 0;
    }
    let (wins, games) = (u64::from(wins), u64::from(games));
    let rounded = (wins * 2000 + games) / (games * 2);
    u32::try_from(rounded).unwrap_or(1000)
}

/// Folds match logs into [`Standings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandingsAggregator;

impl StandingsAggregator {
    /// Computes standings from matches ordered newest first.
    ///
    /// Matches without exactly two distinct participants are skipped.
    /// Ties add points but no win, loss or streak change.
    #[must_use]
    pub fn compute(matches_newest_first: &[Match]) -> Standings {
        let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
        let mut match_count = 0;

        for game in matches_newest_first.iter().rev() {
            let (Some((a, b)), Some(outcome)) = (game.pair(), game.outcome()) else {
                continue;
            };
            match_count += 1;

            tallies
                .entry(a.player_id.as_str())
                .or_default()
                .score(&a.name, a.points, b.points);
            tallies
                .entry(b.player_id.as_str())
                .or_default()
                .score(&b.name, b.points, a.points);

            let (winner, loser) = match outcome {
                Outcome::FirstWins => (a, b),
                Outcome::SecondWins => (b, a),
                Outcome::Tie => {
                    for id in [a.player_id.as_str(), b.player_id.as_str()] {
                        tallies.entry(id).or_default().ties += 1;
                    }
                    continue;
                }
            };
            tallies.entry(winner.player_id.as_str()).or_default().win();
            tallies.entry(loser.player_id.as_str()).or_default().loss();
        }

        let mut rows: Vec<StandingRow> = tallies
            .into_iter()
            .map(|(player_id, t)| {
                let games = t.wins + t.losses;
                let thousandths = win_pct_thousandths(t.wins, games);
                let point_diff = i64::try_from(t.points_for).unwrap_or(i64::MAX)
                    - i64::try_from(t.points_against).unwrap_or(i64::MAX);
                StandingRow {
                    rank: 0,
                    player_id: player_id.to_string(),
                    name: t.name,
                    wins: t.wins,
                    losses: t.losses,
                    ties: t.ties,
                    games,
                    win_pct_thousandths: thousandths,
                    win_pct: f64::from(thousandths) / 1000.0,
                    points_for: t.points_for,
                    points_against: t.points_against,
                    point_diff,
                    streak: t.streak,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.win_pct_thousandths
                .cmp(&a.win_pct_thousandths)
                .then(b.wins.cmp(&a.wins))
                .then(b.point_diff.cmp(&a.point_diff))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        for (position, row) in rows.iter_mut().enumerate() {
            row.rank = position + 1;
        }

        Standings { rows, match_count }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::league_match::Participant;
    use crate::domain::{LeagueId, MatchId};
    use chrono::Utc;

    /// Builds a newest-first log from `(a, a_points, b, b_points)` tuples
    /// given in chronological order.
    fn log(games: &[(&str, u32, &str, u32)]) -> Vec<Match> {
        let league_id = LeagueId::new();
        let mut matches: Vec<Match> = games
            .iter()
            .zip(1u64..)
            .map(|(&(a, ap, b, bp), seq)| Match {
                id: MatchId::new(),
                league_id,
                seq,
                participants: vec![
                    Participant {
                        player_id: a.to_lowercase(),
                        name: a.to_string(),
                        points: ap,
                    },
                    Participant {
                        player_id: b.to_lowercase(),
                        name: b.to_string(),
                        points: bp,
                    },
                ],
                created_at: Utc::now(),
                created_by: None,
            })
            .collect();
        matches.reverse();
        matches
    }

    fn row<'a>(standings: &'a Standings, name: &str) -> &'a StandingRow {
        let Some(row) = standings.rows.iter().find(|r| r.name == name) else {
            panic!("no row for {name}");
        };
        row
    }

    #[test]
    fn single_match_scenario() {
        let standings = StandingsAggregator::compute(&log(&[("Kyle", 11, "Max", 8)]));
        assert_eq!(standings.match_count, 1);

        let kyle = row(&standings, "Kyle");
        assert_eq!(kyle.rank, 1);
        assert_eq!(kyle.record(), "1-0");
        assert!((kyle.win_pct - 1.0).abs() < f64::EPSILON);
        assert_eq!(kyle.streak_label(), "W1");
        assert_eq!(kyle.point_diff, 3);

        let max = row(&standings, "Max");
        assert_eq!(max.rank, 2);
        assert_eq!(max.record(), "0-1");
        assert!(max.win_pct.abs() < f64::EPSILON);
        assert_eq!(max.streak_label(), "L1");
        assert_eq!(max.point_diff, -3);
    }

    #[test]
    fn streak_follows_chronological_results() {
        // Ann's results: W, W, L, W.
        let games = [
            ("Ann", 11, "Bob", 5),
            ("Ann", 11, "Bob", 7),
            ("Ann", 4, "Bob", 11),
            ("Ann", 11, "Bob", 9),
        ];
        let mut seen = Vec::new();
        for end in 1..=games.len() {
            let standings = StandingsAggregator::compute(&log(&games[..end]));
            seen.push(row(&standings, "Ann").streak);
        }
        assert_eq!(seen, vec![1, 2, -1, 1]);
    }

    #[test]
    fn losing_streak_is_negative() {
        let standings = StandingsAggregator::compute(&log(&[
            ("Ann", 11, "Bob", 5),
            ("Ann", 1, "Bob", 11),
            ("Ann", 2, "Bob", 11),
            ("Ann", 3, "Bob", 11),
        ]));
        assert_eq!(row(&standings, "Ann").streak, -3);
        assert_eq!(row(&standings, "Ann").streak_label(), "L3");
        assert_eq!(row(&standings, "Bob").streak, 3);
    }

    #[test]
    fn ties_add_points_only() {
        let standings = StandingsAggregator::compute(&log(&[
            ("Ann", 11, "Bob", 5),
            ("Ann", 7, "Bob", 7),
        ]));
        let ann = row(&standings, "Ann");
        assert_eq!((ann.wins, ann.losses, ann.ties, ann.games), (1, 0, 1, 1));
        assert_eq!(ann.points_for, 18);
        assert_eq!(ann.points_against, 12);
        assert_eq!(ann.streak, 1);
        assert_eq!(ann.record(), "1-0-1");
        assert_eq!(standings.match_count, 2);
    }

    #[test]
    fn only_ties_means_zero_percent() {
        let standings = StandingsAggregator::compute(&log(&[("Ann", 3, "Bob", 3)]));
        let ann = row(&standings, "Ann");
        assert_eq!(ann.games, 0);
        assert!(ann.win_pct.abs() < f64::EPSILON);
        assert_eq!(ann.streak_label(), "-");
    }

    #[test]
    fn win_pct_rounds_to_three_decimals() {
        assert_eq!(win_pct_thousandths(2, 3), 667);
        assert_eq!(win_pct_thousandths(1, 3), 333);
        assert_eq!(win_pct_thousandths(1, 8), 125);
        assert_eq!(win_pct_thousandths(0, 5), 0);
        assert_eq!(win_pct_thousandths(5, 5), 1000);
        assert_eq!(win_pct_thousandths(0, 0), 0);
    }

    #[test]
    fn ranking_orders_by_pct_then_wins_then_diff() {
        let standings = StandingsAggregator::compute(&log(&[
            // Cat: 2-0, Dan: 1-0 -> same pct, Cat has more wins.
            ("Cat", 11, "Zed", 0),
            ("Cat", 11, "Zed", 0),
            ("Dan", 11, "Yan", 9),
            // Eve: 1-0 with bigger diff than Dan.
            ("Eve", 11, "Xia", 0),
        ]));
        let names: Vec<&str> = standings.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(&names[..3], &["Cat", "Eve", "Dan"]);
        let ranks: Vec<usize> = standings.rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=standings.rows.len()).collect::<Vec<_>>());
    }

    #[test]
    fn full_tie_breaks_by_ascending_name() {
        let standings = StandingsAggregator::compute(&log(&[
            ("Zoe", 11, "Pat", 5),
            ("Amy", 11, "Quin", 5),
        ]));
        let names: Vec<&str> = standings.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zoe", "Pat", "Quin"]);
    }

    #[test]
    fn name_order_is_case_sensitive() {
        let standings = StandingsAggregator::compute(&log(&[
            ("bea", 11, "Pat", 5),
            ("Cal", 11, "Quin", 5),
        ]));
        // Uppercase sorts before lowercase.
        assert_eq!(standings.rows[0].name, "Cal");
        assert_eq!(standings.rows[1].name, "bea");
    }

    #[test]
    fn computation_is_deterministic() {
        let matches = log(&[
            ("Ann", 11, "Bob", 5),
            ("Cal", 11, "Ann", 9),
            ("Bob", 11, "Cal", 2),
            ("Ann", 6, "Bob", 6),
        ]);
        let first = StandingsAggregator::compute(&matches);
        for _ in 0..10 {
            assert_eq!(StandingsAggregator::compute(&matches), first);
        }
    }

    #[test]
    fn malformed_matches_are_skipped() {
        let mut matches = log(&[("Ann", 11, "Bob", 5)]);
        let mut solo = matches[0].clone();
        solo.participants.truncate(1);
        matches.insert(0, solo);

        let standings = StandingsAggregator::compute(&matches);
        assert_eq!(standings.match_count, 1);
        assert_eq!(row(&standings, "Ann").wins, 1);
    }

    #[test]
    fn empty_log_yields_empty_table() {
        let standings = StandingsAggregator::compute(&[]);
        assert!(standings.rows.is_empty());
        assert_eq!(standings.match_count, 0);
    }
}
