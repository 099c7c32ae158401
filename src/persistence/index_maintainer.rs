//! Single-table key layout and item composition.
//!
//! [`IndexMaintainer`] is the only place that knows how entities map onto
//! the table. It turns domain values into [`WriteOp`]s carrying the primary
//! item together with its index projections and mirror items, and decodes
//! stored items back into typed entities.
//!
//! | Entity            | pk              | sk                | Indexes                                   |
//! |-------------------|-----------------|-------------------|-------------------------------------------|
//! | League metadata   | `LEAGUE#<id>`   | `META`            | owner, invite, visibility                 |
//! | Membership        | `LEAGUE#<id>`   | `MEMBER#<user>`   |                                           |
//! | Membership mirror | `USER#<user>`   | `LEAGUE#<id>`     |                                           |
//! | Player            | `LEAGUE#<id>`   | `PLAYER#<key>`    |                                           |
//! | Match             | `LEAGUE#<id>`   | `MATCH#<seq>`     |                                           |

use chrono::SecondsFormat;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    Attributes, Condition, IndexKey, IndexKeys, Item, ItemChanges, ItemKey, StoreError, WriteOp,
};
use crate::domain::{League, LeagueId, Match, Membership, Player, UserId, Visibility};

/// Sort key of the league metadata item.
pub const META_SK: &str = "META";
/// Sort-key prefix of match items.
pub const MATCH_PREFIX: &str = "MATCH#";
/// Sort-key prefix of roster items.
pub const PLAYER_PREFIX: &str = "PLAYER#";
/// Sort-key prefix of membership items.
pub const MEMBER_PREFIX: &str = "MEMBER#";
/// Prefix of league partitions and of mirror sort keys.
pub const LEAGUE_PREFIX: &str = "LEAGUE#";
/// League attribute holding the sequence number of the newest match.
pub const MATCH_SEQ_ATTR: &str = "matchSeq";

/// Partition key of a league.
#[must_use]
pub fn league_pk(id: LeagueId) -> String {
    format!("{LEAGUE_PREFIX}{id}")
}

/// Partition key of a user's mirror items.
#[must_use]
pub fn user_pk(user: &UserId) -> String {
    format!("USER#{user}")
}

/// Owner index partition.
#[must_use]
pub fn owner_pk(owner: &UserId) -> String {
    format!("OWNER#{owner}")
}

/// Invite index partition.
#[must_use]
pub fn invite_pk(code: &str) -> String {
    format!("INVITE#{code}")
}

/// Visibility index partition.
#[must_use]
pub fn visibility_pk(visibility: Visibility) -> String {
    format!("VIS#{}", visibility.as_str())
}

/// Sort key of a match; zero-padded so lexical order is numeric order.
#[must_use]
pub fn match_sk(seq: u64) -> String {
    format!("{MATCH_PREFIX}{seq:012}")
}

/// League metadata as stored: the league plus its match-sequence guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueMeta {
    /// The league record.
    pub league: League,
    /// Sequence of the newest match; `None` if the attribute is absent.
    pub match_seq: Option<u64>,
}

impl LeagueMeta {
    /// Predicate asserting the stored sequence is still the one read.
    #[must_use]
    pub fn match_seq_unchanged(&self) -> Condition {
        Condition::attribute_equals(
            MATCH_SEQ_ATTR,
            self.match_seq.map_or(Value::Null, Value::from),
        )
    }
}

fn to_attrs<T: Serialize>(value: &T, key: &ItemKey) -> Result<Attributes, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Malformed {
            pk: key.pk.clone(),
            sk: key.sk.clone(),
            reason: "entity did not serialize to an object".to_string(),
        }),
        Err(e) => Err(StoreError::Malformed {
            pk: key.pk.clone(),
            sk: key.sk.clone(),
            reason: e.to_string(),
        }),
    }
}

fn index_time(league: &League) -> String {
    format!(
        "{}#{}",
        league.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        league.id
    )
}

/// Composes and decodes table items.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexMaintainer;

impl IndexMaintainer {
    /// Primary key of a league's metadata item.
    #[must_use]
    pub fn league_key(id: LeagueId) -> ItemKey {
        ItemKey::new(league_pk(id), META_SK)
    }

    /// Index projections of a league's metadata item.
    #[must_use]
    pub fn league_index(league: &League) -> IndexKeys {
        IndexKeys {
            owner: Some(IndexKey::new(owner_pk(&league.owner_id), index_time(league))),
            invite: Some(IndexKey::new(
                invite_pk(&league.invite_code),
                league_pk(league.id),
            )),
            visibility: Some(IndexKey::new(
                visibility_pk(league.visibility),
                index_time(league),
            )),
        }
    }

    /// Creates the metadata item; fails if the league id is taken.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the league cannot be encoded.
    pub fn create_league(league: &League) -> Result<WriteOp, StoreError> {
        let key = Self::league_key(league.id);
        let mut attrs = to_attrs(league, &key)?;
        attrs.insert(MATCH_SEQ_ATTR.to_string(), Value::from(0_u64));
        Ok(WriteOp::Put {
            item: Item::new(key, attrs).with_index(Self::league_index(league)),
            condition: Condition::NotExists,
        })
    }

    /// Renames an existing league.
    #[must_use]
    pub fn rename_league(id: LeagueId, name: &str) -> WriteOp {
        WriteOp::Update {
            key: Self::league_key(id),
            changes: ItemChanges::default().set("name", Value::from(name)),
            condition: Condition::Exists,
        }
    }

    /// Re-keys the invite index of an existing league to `code`.
    #[must_use]
    pub fn rotate_invite(id: LeagueId, code: &str) -> WriteOp {
        WriteOp::Update {
            key: Self::league_key(id),
            changes: ItemChanges::default()
                .set("inviteCode", Value::from(code))
                .with_index(IndexKeys {
                    invite: Some(IndexKey::new(invite_pk(code), league_pk(id))),
                    ..IndexKeys::default()
                }),
            condition: Condition::Exists,
        }
    }

    /// Membership under the league plus its mirror under the user, each
    /// guarded by not-exists. Submit as one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the membership cannot be encoded.
    pub fn join(membership: &Membership) -> Result<Vec<WriteOp>, StoreError> {
        let primary = ItemKey::new(
            league_pk(membership.league_id),
            format!("{MEMBER_PREFIX}{}", membership.user_id),
        );
        let mirror = ItemKey::new(
            user_pk(&membership.user_id),
            format!("{LEAGUE_PREFIX}{}", membership.league_id),
        );
        let attrs = to_attrs(membership, &primary)?;
        Ok(vec![
            WriteOp::Put {
                item: Item::new(primary, attrs.clone()),
                condition: Condition::NotExists,
            },
            WriteOp::Put {
                item: Item::new(mirror, attrs),
                condition: Condition::NotExists,
            },
        ])
    }

    /// Registers a roster entry; fails if the normalized name is taken.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the player cannot be encoded.
    pub fn add_player(player: &Player) -> Result<WriteOp, StoreError> {
        let key = ItemKey::new(
            league_pk(player.league_id),
            format!("{PLAYER_PREFIX}{}", player.id),
        );
        let attrs = to_attrs(player, &key)?;
        Ok(WriteOp::Put {
            item: Item::new(key, attrs),
            condition: Condition::NotExists,
        })
    }

    /// Appends a match: the match item, any new roster entries, and the
    /// league's sequence bump guarded by the sequence that was read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if an entity cannot be encoded.
    pub fn record_match(
        meta: &LeagueMeta,
        game: &Match,
        new_players: &[Player],
    ) -> Result<Vec<WriteOp>, StoreError> {
        let key = ItemKey::new(league_pk(game.league_id), match_sk(game.seq));
        let attrs = to_attrs(game, &key)?;
        let mut ops = Vec::with_capacity(new_players.len() + 2);
        ops.push(WriteOp::Put {
            item: Item::new(key, attrs),
            condition: Condition::NotExists,
        });
        for player in new_players {
            ops.push(Self::add_player(player)?);
        }
        ops.push(WriteOp::Update {
            key: Self::league_key(game.league_id),
            changes: ItemChanges::default().set(MATCH_SEQ_ATTR, Value::from(game.seq)),
            condition: meta.match_seq_unchanged(),
        });
        Ok(ops)
    }

    /// Removes the newest match and rewinds the league sequence to
    /// `previous_seq`. The delete is guarded on the match id, since a
    /// sequence freed by an earlier delete is reused by the next append, and
    /// the rewind on the sequence that was read.
    #[must_use]
    pub fn delete_last_match(newest: &Match, previous_seq: u64) -> Vec<WriteOp> {
        vec![
            WriteOp::Delete {
                key: ItemKey::new(league_pk(newest.league_id), match_sk(newest.seq)),
                condition: Condition::attribute_equals("id", Value::from(newest.id.to_string())),
            },
            WriteOp::Update {
                key: Self::league_key(newest.league_id),
                changes: ItemChanges::default().set(MATCH_SEQ_ATTR, Value::from(previous_seq)),
                condition: Condition::attribute_equals(MATCH_SEQ_ATTR, Value::from(newest.seq)),
            },
        ]
    }

    /// Decodes an item into a typed entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] when required fields are missing or
    /// have the wrong type.
    pub fn decode<T: DeserializeOwned>(item: &Item) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(item.attrs.clone())).map_err(|e| {
            StoreError::Malformed {
                pk: item.key.pk.clone(),
                sk: item.key.sk.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Decodes a league metadata item together with its sequence guard.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] for undecodable leagues or a
    /// non-integer `matchSeq`.
    pub fn decode_league(item: &Item) -> Result<LeagueMeta, StoreError> {
        let league = Self::decode(item)?;
        let match_seq = match item.attrs.get(MATCH_SEQ_ATTR) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| StoreError::Malformed {
                pk: item.key.pk.clone(),
                sk: item.key.sk.clone(),
                reason: format!("{MATCH_SEQ_ATTR} is not an unsigned integer"),
            })?),
        };
        Ok(LeagueMeta { league, match_seq })
    }
}
