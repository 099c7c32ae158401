//! Persistence layer: the single-table entity store.
//!
//! Every entity lives in one logical table keyed by a composite primary key
//! (`pk` + `sk`) with up to three global secondary indexes. The
//! [`EntityStore`] trait is the narrow contract the service layer consumes:
//! point lookups, ordered range queries, single-item conditional writes and
//! all-or-nothing transactions over lists of [`WriteOp`]s.
//!
//! Two engines implement it: [`memory::MemoryStore`] and
//! [`postgres::PostgresStore`].

pub mod index_maintainer;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use index_maintainer::IndexMaintainer;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Attribute map stored alongside each item.
pub type Attributes = Map<String, Value>;

/// Errors reported by an [`EntityStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A single-item write predicate did not hold.
    #[error("condition check failed")]
    ConditionFailed,

    /// A transaction was rolled back because the predicate of the operation
    /// at the given position did not hold.
    #[error("transaction aborted at operation {0}")]
    TransactionAborted(usize),

    /// The storage engine itself failed.
    #[error("backend failure: {0}")]
    Backend(String),

    /// An item could not be decoded into its typed entity.
    #[error("malformed item {pk}/{sk}: {reason}")]
    Malformed {
        /// Partition key of the offending item.
        pk: String,
        /// Sort key of the offending item.
        sk: String,
        /// Decoder message.
        reason: String,
    },
}

impl StoreError {
    /// Returns `true` when the error is a failed predicate rather than a
    /// storage failure. Callers surface these as retryable conflicts.
    #[must_use]
    pub const fn is_condition_failure(&self) -> bool {
        matches!(self, Self::ConditionFailed | Self::TransactionAborted(_))
    }
}

/// Composite primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
}

impl ItemKey {
    /// Builds a key from its two parts.
    #[must_use]
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// The three global secondary indexes of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    /// GSI1: owner → leagues.
    Owner,
    /// GSI2: invite code → league.
    Invite,
    /// GSI3: visibility → leagues.
    Visibility,
}

/// Partition/sort pair projected into one secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    /// Index partition key.
    pub pk: String,
    /// Index sort key.
    pub sk: String,
}

impl IndexKey {
    /// Builds an index key from its two parts.
    #[must_use]
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// Index attributes carried by an item. Absent entries keep the item out
/// of that index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexKeys {
    /// Owner index entry.
    pub owner: Option<IndexKey>,
    /// Invite index entry.
    pub invite: Option<IndexKey>,
    /// Visibility index entry.
    pub visibility: Option<IndexKey>,
}

impl IndexKeys {
    /// Returns the entry for `index`, if the item is projected into it.
    #[must_use]
    pub fn get(&self, index: IndexName) -> Option<&IndexKey> {
        match index {
            IndexName::Owner => self.owner.as_ref(),
            IndexName::Invite => self.invite.as_ref(),
            IndexName::Visibility => self.visibility.as_ref(),
        }
    }

    /// Overwrites every entry that is present in `patch`.
    pub fn merge(&mut self, patch: IndexKeys) {
        if let Some(owner) = patch.owner {
            self.owner = Some(owner);
        }
        if let Some(invite) = patch.invite {
            self.invite = Some(invite);
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = Some(visibility);
        }
    }
}

/// One stored record: key, index projections and payload attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Primary key.
    pub key: ItemKey,
    /// Secondary index projections.
    pub index: IndexKeys,
    /// Payload attributes.
    pub attrs: Attributes,
}

impl Item {
    /// Creates an item without index projections.
    #[must_use]
    pub fn new(key: ItemKey, attrs: Attributes) -> Self {
        Self {
            key,
            index: IndexKeys::default(),
            attrs,
        }
    }

    /// Sets the index projections.
    #[must_use]
    pub fn with_index(mut self, index: IndexKeys) -> Self {
        self.index = index;
        self
    }

    /// Applies an update in place. A `null` value removes the attribute.
    pub fn apply(&mut self, changes: ItemChanges) {
        for (name, value) in changes.set {
            if value.is_null() {
                self.attrs.remove(&name);
            } else {
                self.attrs.insert(name, value);
            }
        }
        self.index.merge(changes.index);
    }
}

/// Attribute and index changes carried by [`WriteOp::Update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    /// Attributes to set (`null` removes).
    pub set: Attributes,
    /// Index entries to replace.
    pub index: IndexKeys,
}

impl ItemChanges {
    /// Adds an attribute assignment.
    #[must_use]
    pub fn set(mut self, name: &str, value: Value) -> Self {
        self.set.insert(name.to_string(), value);
        self
    }

    /// Replaces index entries.
    #[must_use]
    pub fn with_index(mut self, index: IndexKeys) -> Self {
        self.index = index;
        self
    }
}

/// Predicate evaluated against the current item before a write.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// No predicate.
    Always,
    /// The item must exist.
    Exists,
    /// The item must not exist.
    NotExists,
    /// The item must exist and the attribute must equal `value`. A missing
    /// attribute compares equal to `null`.
    AttributeEquals {
        /// Attribute name.
        name: String,
        /// Expected value.
        value: Value,
    },
}

impl Condition {
    /// Shorthand for [`Condition::AttributeEquals`].
    #[must_use]
    pub fn attribute_equals(name: &str, value: Value) -> Self {
        Self::AttributeEquals {
            name: name.to_string(),
            value,
        }
    }

    /// Evaluates the predicate against the current state of the item.
    #[must_use]
    pub fn holds(&self, current: Option<&Item>) -> bool {
        match (self, current) {
            (Self::Always, _) => true,
            (Self::Exists, found) => found.is_some(),
            (Self::NotExists, found) => found.is_none(),
            (Self::AttributeEquals { .. }, None) => false,
            (Self::AttributeEquals { name, value }, Some(item)) => {
                item.attrs.get(name).unwrap_or(&Value::Null) == value
            }
        }
    }
}

/// A `(key, predicate, payload)` write, usable alone or inside a
/// transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert or replace the whole item.
    Put {
        /// Item to write.
        item: Item,
        /// Predicate on the existing item.
        condition: Condition,
    },
    /// Modify attributes of an existing item. Never creates an item.
    Update {
        /// Target key.
        key: ItemKey,
        /// Changes to apply.
        changes: ItemChanges,
        /// Predicate on the existing item.
        condition: Condition,
    },
    /// Remove an item.
    Delete {
        /// Target key.
        key: ItemKey,
        /// Predicate on the existing item.
        condition: Condition,
    },
}

impl WriteOp {
    /// Primary key the operation targets.
    #[must_use]
    pub fn key(&self) -> &ItemKey {
        match self {
            Self::Put { item, .. } => &item.key,
            Self::Update { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    /// Predicate guarding the operation.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        match self {
            Self::Put { condition, .. }
            | Self::Update { condition, .. }
            | Self::Delete { condition, .. } => condition,
        }
    }

    /// Whether the operation may proceed given the current item. Updates
    /// additionally require the item to exist.
    #[must_use]
    pub fn admits(&self, current: Option<&Item>) -> bool {
        let exists_if_update = !matches!(self, Self::Update { .. }) || current.is_some();
        exists_if_update && self.condition().holds(current)
    }
}

/// Range query over the primary key or one secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Secondary index to scan, or `None` for the primary key.
    pub index: Option<IndexName>,
    /// Partition to scan.
    pub partition: String,
    /// Only sort keys starting with this prefix.
    pub sort_prefix: Option<String>,
    /// Scan order: `true` returns the highest sort keys first.
    pub descending: bool,
    /// Maximum number of items returned.
    pub limit: Option<usize>,
}

impl Query {
    /// Query a primary-key partition.
    #[must_use]
    pub fn partition(pk: impl Into<String>) -> Self {
        Self {
            index: None,
            partition: pk.into(),
            sort_prefix: None,
            descending: false,
            limit: None,
        }
    }

    /// Query a secondary-index partition.
    #[must_use]
    pub fn index(index: IndexName, pk: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            ..Self::partition(pk)
        }
    }

    /// Restricts results to sort keys with the given prefix.
    #[must_use]
    pub fn sort_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sort_prefix = Some(prefix.into());
        self
    }

    /// Returns the highest sort keys first.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Caps the number of returned items.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage engine contract.
///
/// Implementations must make [`EntityStore::transact`] atomic: either every
/// predicate holds and every operation commits, or nothing changes and
/// [`StoreError::TransactionAborted`] names the first failing operation.
#[async_trait]
pub trait EntityStore: Send + Sync + std::fmt::Debug {
    /// Point lookup by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on engine failure.
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError>;

    /// Ordered range query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on engine failure.
    async fn query(&self, query: &Query) -> Result<Vec<Item>, StoreError>;

    /// Single-item conditional write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConditionFailed`] when the predicate does not
    /// hold, or [`StoreError::Backend`] on engine failure.
    async fn write(&self, op: WriteOp) -> Result<(), StoreError>;

    /// All-or-nothing multi-item write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionAborted`] when any predicate fails,
    /// or [`StoreError::Backend`] on engine failure (including two
    /// operations targeting the same key).
    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}
