//! League service: orchestrates every league operation.
//!
//! Each mutating operation follows the same shape: load the league
//! metadata, run the [`AccessGuard`], let the [`IndexMaintainer`] compose
//! the writes, then submit them as one conditional write or transaction.
//! Failed predicates surface as conflicts (or not-found where the target
//! vanished); there is no in-process locking.

use std::sync::Arc;

use crate::domain::invite::normalize_invite_code;
use crate::domain::league::validate_league_name;
use crate::domain::{
    AccessGuard, InviteCodeGenerator, League, LeagueId, Match, MatchId, Membership, Participant,
    Player, PlayerName, Standings, StandingsAggregator, UserId, Visibility,
};
use crate::error::GatewayError;
use crate::persistence::index_maintainer::{
    LEAGUE_PREFIX, LeagueMeta, MATCH_PREFIX, PLAYER_PREFIX, invite_pk, league_pk, owner_pk,
    user_pk, visibility_pk,
};
use crate::persistence::{EntityStore, IndexMaintainer, IndexName, ItemKey, Query, StoreError};

/// Default page size of list endpoints.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Largest page size of list endpoints.
pub const MAX_LIST_LIMIT: u32 = 200;

/// One side of a match as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    /// Player name as typed.
    pub name: String,
    /// Points scored.
    pub points: u32,
}

/// Maps a failed predicate to `outcome`; other store errors pass through.
fn on_condition_failure(err: StoreError, outcome: GatewayError) -> GatewayError {
    if err.is_condition_failure() {
        outcome
    } else {
        err.into()
    }
}

/// Validates an optional page size against `1..=MAX_LIST_LIMIT`.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] when out of range.
pub fn list_limit(requested: Option<u32>) -> Result<usize, GatewayError> {
    let limit = requested.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(GatewayError::Validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    Ok(limit as usize)
}

/// Core business logic over an [`EntityStore`].
#[derive(Debug)]
pub struct LeagueService {
    store: Arc<dyn EntityStore>,
    invites: InviteCodeGenerator,
    standings_window: usize,
}

impl LeagueService {
    /// Creates a new service.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        invites: InviteCodeGenerator,
        standings_window: usize,
    ) -> Self {
        Self {
            store,
            invites,
            standings_window: standings_window.max(1),
        }
    }

    async fn load_meta(&self, id: LeagueId) -> Result<LeagueMeta, GatewayError> {
        let item = self
            .store
            .get(&IndexMaintainer::league_key(id))
            .await?
            .ok_or(GatewayError::NotFound("league"))?;
        Ok(IndexMaintainer::decode_league(&item)?)
    }

    async fn leagues_in(&self, query: Query) -> Result<Vec<League>, GatewayError> {
        let items = self.store.query(&query).await?;
        items
            .iter()
            .map(|item| {
                IndexMaintainer::decode_league(item)
                    .map(|meta| meta.league)
                    .map_err(GatewayError::from)
            })
            .collect()
    }

    async fn allocate_invite(&self) -> Result<String, GatewayError> {
        let store = Arc::clone(&self.store);
        self.invites
            .generate(|code| {
                let store = Arc::clone(&store);
                async move {
                    let hits = store
                        .query(&Query::index(IndexName::Invite, invite_pk(&code)).limit(1))
                        .await?;
                    Ok::<_, GatewayError>(!hits.is_empty())
                }
            })
            .await
    }

    // ── Leagues ─────────────────────────────────────────────────────────

    /// Creates a league owned by `owner` with a fresh invite code.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for a bad name and
    /// [`GatewayError::Conflict`] if no invite code could be allocated.
    pub async fn create_league(
        &self,
        owner: &UserId,
        name: &str,
        visibility: Visibility,
    ) -> Result<League, GatewayError> {
        let name = validate_league_name(name)?;
        let code = self.allocate_invite().await?;
        let league = League::new(name, owner.clone(), code, visibility);

        self.store
            .write(IndexMaintainer::create_league(&league)?)
            .await
            .map_err(|e| on_condition_failure(e, GatewayError::Conflict("league id taken".into())))?;

        tracing::info!(
            league_id = %league.id,
            owner = %owner,
            visibility = visibility.as_str(),
            "league created"
        );
        Ok(league)
    }

    /// Leagues owned by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] on storage failure.
    pub async fn list_owned_leagues(&self, owner: &UserId) -> Result<Vec<League>, GatewayError> {
        self.leagues_in(Query::index(IndexName::Owner, owner_pk(owner)).descending())
            .await
    }

    /// Public leagues, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for a limit outside 1–200.
    pub async fn list_public_leagues(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<League>, GatewayError> {
        let limit = list_limit(limit)?;
        self.leagues_in(
            Query::index(IndexName::Visibility, visibility_pk(Visibility::Public))
                .descending()
                .limit(limit),
        )
        .await
    }

    /// League metadata, if `viewer` may see it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the league does not exist or
    /// is hidden from `viewer`.
    pub async fn get_league(
        &self,
        id: LeagueId,
        viewer: Option<&UserId>,
    ) -> Result<League, GatewayError> {
        let meta = self.load_meta(id).await?;
        AccessGuard::authorize_view(&meta.league, viewer)?;
        Ok(meta.league)
    }

    /// Renames a league (owner only).
    ///
    /// # Errors
    ///
    /// Returns the [`AccessGuard`] outcome, [`GatewayError::Validation`] for
    /// a bad name, or [`GatewayError::NotFound`] if the league vanished.
    pub async fn rename_league(
        &self,
        id: LeagueId,
        requester: Option<&UserId>,
        name: &str,
    ) -> Result<League, GatewayError> {
        let meta = self.load_meta(id).await?;
        AccessGuard::authorize_mutation(&meta.league, requester)?;
        let name = validate_league_name(name)?;

        self.store
            .write(IndexMaintainer::rename_league(id, &name))
            .await
            .map_err(|e| on_condition_failure(e, GatewayError::NotFound("league")))?;

        tracing::info!(league_id = %id, "league renamed");
        Ok(League { name, ..meta.league })
    }

    /// Replaces the invite code (owner only). The old code stops resolving
    /// as soon as the update commits.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessGuard`] outcome, [`GatewayError::Conflict`] if no
    /// code could be allocated, or [`GatewayError::NotFound`] if the league
    /// vanished.
    pub async fn rotate_invite(
        &self,
        id: LeagueId,
        requester: Option<&UserId>,
    ) -> Result<League, GatewayError> {
        let meta = self.load_meta(id).await?;
        AccessGuard::authorize_mutation(&meta.league, requester)?;
        let code = self.allocate_invite().await?;

        self.store
            .write(IndexMaintainer::rotate_invite(id, &code))
            .await
            .map_err(|e| on_condition_failure(e, GatewayError::NotFound("league")))?;

        tracing::info!(league_id = %id, "invite code rotated");
        Ok(League {
            invite_code: code,
            ..meta.league
        })
    }

    // ── Membership ──────────────────────────────────────────────────────

    /// Joins the league behind `code`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] for anonymous callers,
    /// [`GatewayError::NotFound`] for unknown codes and
    /// [`GatewayError::Conflict`] if `user` is already a member.
    pub async fn join_league(
        &self,
        code: &str,
        user: Option<&UserId>,
    ) -> Result<Membership, GatewayError> {
        let user = user.ok_or(GatewayError::Unauthorized)?;
        let code = normalize_invite_code(code);
        if code.is_empty() {
            return Err(GatewayError::Validation("invite code is empty".to_string()));
        }

        let hits = self
            .store
            .query(&Query::index(IndexName::Invite, invite_pk(&code)).limit(2))
            .await?;
        let league = match hits.as_slice() {
            [] => return Err(GatewayError::NotFound("invite code")),
            [item] => IndexMaintainer::decode_league(item)?.league,
            _ => {
                tracing::warn!(code = %code, "invite code resolves to several leagues");
                return Err(GatewayError::Conflict(
                    "invite code is ambiguous, ask the owner to rotate it".to_string(),
                ));
            }
        };

        let membership = Membership::new(league.id, user.clone());
        self.store
            .transact(IndexMaintainer::join(&membership)?)
            .await
            .map_err(|e| {
                on_condition_failure(
                    e,
                    GatewayError::Conflict("already a member of this league".to_string()),
                )
            })?;

        tracing::info!(league_id = %league.id, user = %user, "league joined");
        Ok(membership)
    }

    /// Memberships of `user`, ordered by league id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] on storage failure.
    pub async fn list_memberships(&self, user: &UserId) -> Result<Vec<Membership>, GatewayError> {
        let items = self
            .store
            .query(&Query::partition(user_pk(user)).sort_prefix(LEAGUE_PREFIX))
            .await?;
        items
            .iter()
            .map(|item| IndexMaintainer::decode(item).map_err(GatewayError::from))
            .collect()
    }

    // ── Roster ──────────────────────────────────────────────────────────

    /// Adds a player to the roster (owner only).
    ///
    /// # Errors
    ///
    /// Returns the [`AccessGuard`] outcome, [`GatewayError::Validation`] for
    /// a bad name and [`GatewayError::Conflict`] if the name is taken.
    pub async fn add_player(
        &self,
        id: LeagueId,
        requester: Option<&UserId>,
        name: &str,
    ) -> Result<Player, GatewayError> {
        let meta = self.load_meta(id).await?;
        AccessGuard::authorize_mutation(&meta.league, requester)?;
        let player = Player::new(id, PlayerName::parse(name)?);

        self.store
            .write(IndexMaintainer::add_player(&player)?)
            .await
            .map_err(|e| {
                on_condition_failure(e, GatewayError::Conflict("player already exists".to_string()))
            })?;

        tracing::info!(league_id = %id, player = %player.id, "player added");
        Ok(player)
    }

    /// Roster ordered by normalized name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the league is hidden.
    pub async fn list_players(
        &self,
        id: LeagueId,
        viewer: Option<&UserId>,
    ) -> Result<Vec<Player>, GatewayError> {
        self.get_league(id, viewer).await?;
        let items = self
            .store
            .query(&Query::partition(league_pk(id)).sort_prefix(PLAYER_PREFIX))
            .await?;
        items
            .iter()
            .map(|item| IndexMaintainer::decode(item).map_err(GatewayError::from))
            .collect()
    }

    async fn find_player(&self, id: LeagueId, key: &str) -> Result<Option<Player>, GatewayError> {
        let item = self
            .store
            .get(&ItemKey::new(league_pk(id), format!("{PLAYER_PREFIX}{key}")))
            .await?;
        Ok(item.as_ref().map(IndexMaintainer::decode).transpose()?)
    }

    // ── Matches ─────────────────────────────────────────────────────────

    /// Records a two-player match (owner only). Unknown players join the
    /// roster in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessGuard`] outcome, [`GatewayError::Validation`] for
    /// malformed participants and [`GatewayError::Conflict`] when another
    /// write to the league's match log won the race.
    pub async fn record_match(
        &self,
        id: LeagueId,
        requester: Option<&UserId>,
        entries: &[MatchEntry],
    ) -> Result<Match, GatewayError> {
        let meta = self.load_meta(id).await?;
        AccessGuard::authorize_mutation(&meta.league, requester)?;

        let [first, second] = entries else {
            return Err(GatewayError::Validation(
                "a match has exactly two participants".to_string(),
            ));
        };
        let names = [PlayerName::parse(&first.name)?, PlayerName::parse(&second.name)?];
        if names[0].key == names[1].key {
            return Err(GatewayError::Validation(
                "a match needs two different players".to_string(),
            ));
        }

        let mut participants = Vec::with_capacity(2);
        let mut new_players = Vec::new();
        for (name, entry) in names.into_iter().zip([first, second]) {
            let player = match self.find_player(id, &name.key).await? {
                Some(existing) => existing,
                None => {
                    let player = Player::new(id, name);
                    new_players.push(player.clone());
                    player
                }
            };
            participants.push(Participant {
                player_id: player.id,
                name: player.name,
                points: entry.points,
            });
        }

        let game = Match {
            id: MatchId::new(),
            league_id: id,
            seq: meta.match_seq.unwrap_or(0) + 1,
            participants,
            created_at: chrono::Utc::now(),
            created_by: requester.cloned(),
        };

        self.store
            .transact(IndexMaintainer::record_match(&meta, &game, &new_players)?)
            .await
            .map_err(|e| {
                on_condition_failure(
                    e,
                    GatewayError::Conflict(
                        "the league changed while recording the match, retry".to_string(),
                    ),
                )
            })?;

        tracing::info!(
            league_id = %id,
            seq = game.seq,
            new_players = new_players.len(),
            "match recorded"
        );
        Ok(game)
    }

    async fn newest_matches(&self, id: LeagueId, limit: usize) -> Result<Vec<Match>, GatewayError> {
        let items = self
            .store
            .query(
                &Query::partition(league_pk(id))
                    .sort_prefix(MATCH_PREFIX)
                    .descending()
                    .limit(limit),
            )
            .await?;
        items
            .iter()
            .map(|item| IndexMaintainer::decode(item).map_err(GatewayError::from))
            .collect()
    }

    /// Newest matches first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the league is hidden and
    /// [`GatewayError::Validation`] for a limit outside 1–200.
    pub async fn list_matches(
        &self,
        id: LeagueId,
        viewer: Option<&UserId>,
        limit: Option<u32>,
    ) -> Result<Vec<Match>, GatewayError> {
        let limit = list_limit(limit)?;
        self.get_league(id, viewer).await?;
        self.newest_matches(id, limit).await
    }

    /// Deletes the newest match (owner only) and returns it.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessGuard`] outcome, [`GatewayError::NotFound`] when
    /// there is no match and [`GatewayError::Conflict`] when a match was
    /// recorded or deleted concurrently.
    pub async fn delete_last_match(
        &self,
        id: LeagueId,
        requester: Option<&UserId>,
    ) -> Result<Match, GatewayError> {
        let meta = self.load_meta(id).await?;
        AccessGuard::authorize_mutation(&meta.league, requester)?;

        let mut newest = self.newest_matches(id, 2).await?.into_iter();
        let Some(last) = newest.next() else {
            return Err(GatewayError::NotFound("match"));
        };
        let previous_seq = newest.next().map_or(0, |m| m.seq);

        self.store
            .transact(IndexMaintainer::delete_last_match(&last, previous_seq))
            .await
            .map_err(|e| {
                on_condition_failure(
                    e,
                    GatewayError::Conflict(
                        "the match log changed before the delete, retry".to_string(),
                    ),
                )
            })?;

        tracing::info!(league_id = %id, seq = last.seq, "last match deleted");
        Ok(last)
    }

    // ── Standings ───────────────────────────────────────────────────────

    /// Standings over the newest matches of the league.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the league is hidden.
    pub async fn standings(
        &self,
        id: LeagueId,
        viewer: Option<&UserId>,
    ) -> Result<Standings, GatewayError> {
        self.get_league(id, viewer).await?;
        let matches = self.newest_matches(id, self.standings_window).await?;
        Ok(StandingsAggregator::compute(&matches))
    }
}
