//! PostgreSQL implementation of the entity store.
//!
//! The whole table lives in one relation (`entities`, see `migrations/`).
//! Secondary indexes are plain column pairs with partial b-tree indexes.
//! Transactions lock every touched row with `SELECT ... FOR UPDATE` before
//! evaluating its predicate; not-exists puts rely on
//! `INSERT ... ON CONFLICT DO NOTHING` so two racing inserts cannot both
//! succeed.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use super::{
    Condition, EntityStore, IndexKey, IndexKeys, IndexName, Item, ItemKey, Query, StoreError,
    WriteOp,
};
use crate::config::GatewayConfig;

const COLUMNS: &str = "pk, sk, gsi1pk, gsi1sk, gsi2pk, gsi2sk, gsi3pk, gsi3sk, attrs";

type ItemRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    serde_json::Value,
);

/// PostgreSQL-backed entity store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnConflict {
    Skip,
    Replace,
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn index_columns(index: IndexName) -> (&'static str, &'static str) {
    match index {
        IndexName::Owner => ("gsi1pk", "gsi1sk"),
        IndexName::Invite => ("gsi2pk", "gsi2sk"),
        IndexName::Visibility => ("gsi3pk", "gsi3sk"),
    }
}

fn split(key: Option<&IndexKey>) -> (Option<&str>, Option<&str>) {
    key.map_or((None, None), |k| (Some(k.pk.as_str()), Some(k.sk.as_str())))
}

fn pair(pk: Option<String>, sk: Option<String>) -> Option<IndexKey> {
    Some(IndexKey { pk: pk?, sk: sk? })
}

/// `LIKE` pattern matching every string that starts with `prefix`.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn row_to_item(row: ItemRow) -> Result<Item, StoreError> {
    let (pk, sk, g1pk, g1sk, g2pk, g2sk, g3pk, g3sk, attrs) = row;
    let serde_json::Value::Object(attrs) = attrs else {
        return Err(StoreError::Malformed {
            pk,
            sk,
            reason: "attrs column is not a JSON object".to_string(),
        });
    };
    Ok(Item {
        key: ItemKey { pk, sk },
        index: IndexKeys {
            owner: pair(g1pk, g1sk),
            invite: pair(g2pk, g2sk),
            visibility: pair(g3pk, g3sk),
        },
        attrs,
    })
}

async fn fetch_locked(
    tx: &mut Transaction<'_, Postgres>,
    key: &ItemKey,
) -> Result<Option<Item>, StoreError> {
    let sql = format!("SELECT {COLUMNS} FROM entities WHERE pk = $1 AND sk = $2 FOR UPDATE");
    let row = sqlx::query_as::<_, ItemRow>(&sql)
        .bind(&key.pk)
        .bind(&key.sk)
        .fetch_optional(&mut **tx)
        .await
        .map_err(backend)?;
    row.map(row_to_item).transpose()
}

async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    item: &Item,
    on_conflict: OnConflict,
) -> Result<u64, StoreError> {
    let conflict_clause = match on_conflict {
        OnConflict::Skip => "DO NOTHING",
        OnConflict::Replace => {
            "DO UPDATE SET gsi1pk = EXCLUDED.gsi1pk, gsi1sk = EXCLUDED.gsi1sk, \
             gsi2pk = EXCLUDED.gsi2pk, gsi2sk = EXCLUDED.gsi2sk, \
             gsi3pk = EXCLUDED.gsi3pk, gsi3sk = EXCLUDED.gsi3sk, attrs = EXCLUDED.attrs"
        }
    };
    let sql = format!(
        "INSERT INTO entities ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (pk, sk) {conflict_clause}"
    );
    let (g1pk, g1sk) = split(item.index.owner.as_ref());
    let (g2pk, g2sk) = split(item.index.invite.as_ref());
    let (g3pk, g3sk) = split(item.index.visibility.as_ref());
    let result = sqlx::query(&sql)
        .bind(&item.key.pk)
        .bind(&item.key.sk)
        .bind(g1pk)
        .bind(g1sk)
        .bind(g2pk)
        .bind(g2sk)
        .bind(g3pk)
        .bind(g3sk)
        .bind(serde_json::Value::Object(item.attrs.clone()))
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
    Ok(result.rows_affected())
}

/// Applies one operation inside `tx`. Returns `false` when its predicate
/// does not hold.
async fn apply_locked(tx: &mut Transaction<'_, Postgres>, op: WriteOp) -> Result<bool, StoreError> {
    if let WriteOp::Put {
        item,
        condition: Condition::NotExists,
    } = &op
    {
        return Ok(insert(tx, item, OnConflict::Skip).await? == 1);
    }

    let current = fetch_locked(tx, op.key()).await?;
    if !op.admits(current.as_ref()) {
        return Ok(false);
    }
    match op {
        WriteOp::Put { item, .. } => {
            insert(tx, &item, OnConflict::Replace).await?;
        }
        WriteOp::Update { changes, .. } => {
            let Some(mut item) = current else {
                return Ok(false);
            };
            item.apply(changes);
            insert(tx, &item, OnConflict::Replace).await?;
        }
        WriteOp::Delete { key, .. } => {
            sqlx::query("DELETE FROM entities WHERE pk = $1 AND sk = $2")
                .bind(&key.pk)
                .bind(&key.sk)
                .execute(&mut **tx)
                .await
                .map_err(backend)?;
        }
    }
    Ok(true)
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the database settings in `config` and applies the
    /// bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the pool cannot be created or a
    /// migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(backend)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::info!("postgres entity store ready");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM entities WHERE pk = $1 AND sk = $2");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(&key.pk)
            .bind(&key.sk)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(row_to_item).transpose()
    }

    async fn query(&self, query: &Query) -> Result<Vec<Item>, StoreError> {
        let (pk_col, sk_col) = query.index.map_or(("pk", "sk"), index_columns);
        let direction = if query.descending { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT {COLUMNS} FROM entities WHERE {pk_col} = $1 AND {sk_col} LIKE $2 \
             ORDER BY {sk_col} {direction}, pk {direction}, sk {direction} LIMIT $3"
        );
        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(&query.partition)
            .bind(like_prefix(query.sort_prefix.as_deref().unwrap_or_default()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.into_iter().map(row_to_item).collect()
    }

    async fn write(&self, op: WriteOp) -> Result<(), StoreError> {
        match self.transact(vec![op]).await {
            Err(StoreError::TransactionAborted(_)) => Err(StoreError::ConditionFailed),
            other => other,
        }
    }

    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(ops.len());
        if let Some(dup) = ops.iter().find(|op| !seen.insert(op.key().clone())) {
            return Err(StoreError::Backend(format!(
                "transaction touches {}/{} twice",
                dup.key().pk,
                dup.key().sk
            )));
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;
        for (position, op) in ops.into_iter().enumerate() {
            if !apply_locked(&mut tx, op).await? {
                tx.rollback().await.map_err(backend)?;
                return Err(StoreError::TransactionAborted(position));
            }
        }
        tx.commit().await.map_err(backend)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("MATCH#"), "MATCH#%");
        assert_eq!(like_prefix("50%_off\\"), "50\\%\\_off\\\\%");
        assert_eq!(like_prefix(""), "%");
    }

    #[test]
    fn rows_decode_with_partial_index_columns() {
        let row: ItemRow = (
            "LEAGUE#1".into(),
            "META".into(),
            Some("OWNER#u".into()),
            Some("2025#1".into()),
            None,
            Some("dangling".into()),
            None,
            None,
            json!({ "name": "Ladder" }),
        );
        let Ok(item) = row_to_item(row) else {
            panic!("decode failed");
        };
        assert!(item.index.owner.is_some());
        assert!(item.index.invite.is_none());
        assert_eq!(item.attrs.get("name"), Some(&json!("Ladder")));
    }

    #[test]
    fn non_object_attrs_are_malformed() {
        let row: ItemRow = (
            "P".into(),
            "S".into(),
            None,
            None,
            None,
            None,
            None,
            None,
            json!([1, 2]),
        );
        assert!(matches!(
            row_to_item(row),
            Err(StoreError::Malformed { .. })
        ));
    }
}
