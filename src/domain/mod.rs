//! Domain layer: leagues, memberships, players, matches and the rules over
//! them.
//!
//! Everything here is pure: authorization ([`AccessGuard`]), invite code
//! allocation ([`InviteCodeGenerator`]) and standings
//! ([`StandingsAggregator`]) hold no persistent state and never touch the
//! store directly.

pub mod access;
pub mod ids;
pub mod invite;
pub mod league;
pub mod league_match;
pub mod membership;
pub mod player;
pub mod standings;

pub use access::AccessGuard;
pub use ids::{LeagueId, MatchId, UserId};
pub use invite::{CollisionPolicy, EntropyRng, InviteCodeGenerator, RngSource, SeededRng};
pub use league::{League, Visibility};
pub use league_match::{Match, Participant};
pub use membership::Membership;
pub use player::{Player, PlayerName};
pub use standings::{StandingRow, Standings, StandingsAggregator};
