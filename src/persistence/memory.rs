//! In-memory entity store.
//!
//! [`MemoryStore`] keeps every item in an ordered map behind a single
//! [`tokio::sync::RwLock`]. Reads share the lock; each write or transaction
//! takes it exclusively, which makes multi-item transactions trivially
//! atomic. Secondary index queries scan and sort the projected entries.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EntityStore, Item, ItemKey, Query, StoreError, WriteOp};

/// Single-process storage engine backing tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<ItemKey, Item>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns `true` if the store holds no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn apply(items: &mut BTreeMap<ItemKey, Item>, op: WriteOp) {
    match op {
        WriteOp::Put { item, .. } => {
            items.insert(item.key.clone(), item);
        }
        WriteOp::Update { key, changes, .. } => {
            if let Some(existing) = items.get_mut(&key) {
                existing.apply(changes);
            }
        }
        WriteOp::Delete { key, .. } => {
            items.remove(&key);
        }
    }
}

fn matches_prefix(sort_key: &str, prefix: Option<&str>) -> bool {
    prefix.is_none_or(|p| sort_key.starts_with(p))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Item>, StoreError> {
        let items = self.items.read().await;
        let prefix = query.sort_prefix.as_deref();

        let mut found: Vec<(String, Item)> = match query.index {
            None => {
                let start = ItemKey::new(query.partition.as_str(), "");
                items
                    .range(start..)
                    .take_while(|(key, _)| key.pk == query.partition)
                    .filter(|(key, _)| matches_prefix(&key.sk, prefix))
                    .map(|(key, item)| (key.sk.clone(), item.clone()))
                    .collect()
            }
            Some(index) => {
                let mut projected: Vec<(String, Item)> = items
                    .values()
                    .filter_map(|item| {
                        let entry = item.index.get(index)?;
                        (entry.pk == query.partition && matches_prefix(&entry.sk, prefix))
                            .then(|| (entry.sk.clone(), item.clone()))
                    })
                    .collect();
                // Primary key breaks ties between equal index sort keys.
                projected.sort_by(|(a_sk, a), (b_sk, b)| {
                    a_sk.cmp(b_sk).then_with(|| a.key.cmp(&b.key))
                });
                projected
            }
        };

        if query.descending {
            found.reverse();
        }
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found.into_iter().map(|(_, item)| item).collect())
    }

    async fn write(&self, op: WriteOp) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        if !op.admits(items.get(op.key())) {
            return Err(StoreError::ConditionFailed);
        }
        apply(&mut items, op);
        Ok(())
    }

    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(ops.len());
        for op in &ops {
            if !seen.insert(op.key()) {
                return Err(StoreError::Backend(format!(
                    "transaction touches {}/{} twice",
                    op.key().pk,
                    op.key().sk
                )));
            }
        }

        let mut items = self.items.write().await;
        if let Some(position) = ops.iter().position(|op| !op.admits(items.get(op.key()))) {
            return Err(StoreError::TransactionAborted(position));
        }
        for op in ops {
            apply(&mut items, op);
        }
        Ok(())
    }
}
