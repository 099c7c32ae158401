//! Entity-store contract against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`. Every test
//! works in its own partitions so runs do not interfere.

#![allow(clippy::panic)]

use serde_json::json;

use ladder_gateway::config::GatewayConfig;
use ladder_gateway::persistence::{
    Attributes, Condition, EntityStore, IndexKey, IndexKeys, IndexName, Item, ItemChanges,
    ItemKey, PostgresStore, Query, StoreError, WriteOp,
};

async fn store(test: &str) -> Option<PostgresStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping {test}: DATABASE_URL not set");
        return None;
    };
    let config = GatewayConfig {
        database_url,
        database_min_connections: 0,
        ..GatewayConfig::default()
    };
    match PostgresStore::connect(&config).await {
        Ok(store) => Some(store),
        Err(e) => panic!("connecting to postgres: {e}"),
    }
}

fn partition(name: &str) -> String {
    format!("{name}#{}", uuid::Uuid::new_v4())
}

fn item(pk: &str, sk: &str, id: &str) -> Item {
    let mut attrs = Attributes::new();
    attrs.insert("id".to_string(), json!(id));
    Item::new(ItemKey::new(pk, sk), attrs)
}

fn put(item: Item, condition: Condition) -> WriteOp {
    WriteOp::Put { item, condition }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn not_exists_put_is_first_writer_wins() {
    let Some(store) = store("not_exists_put_is_first_writer_wins").await else {
        return;
    };
    let pk = partition("RACE");

    let (a, b) = tokio::join!(
        store.transact(vec![put(item(&pk, "MEMBER#u1", "a"), Condition::NotExists)]),
        store.transact(vec![put(item(&pk, "MEMBER#u1", "b"), Condition::NotExists)]),
    );
    assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);

    let again = store
        .write(put(item(&pk, "MEMBER#u1", "c"), Condition::NotExists))
        .await;
    assert!(matches!(again, Err(StoreError::ConditionFailed)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn aborted_transaction_rolls_back_earlier_operations() {
    let Some(store) = store("aborted_transaction_rolls_back_earlier_operations").await else {
        return;
    };
    let pk = partition("TX");
    assert!(store
        .write(put(item(&pk, "taken", "x"), Condition::Always))
        .await
        .is_ok());

    let result = store
        .transact(vec![
            put(item(&pk, "fresh", "y"), Condition::NotExists),
            put(item(&pk, "taken", "z"), Condition::NotExists),
        ])
        .await;
    assert!(matches!(result, Err(StoreError::TransactionAborted(1))));

    let Ok(fresh) = store.get(&ItemKey::new(pk.as_str(), "fresh")).await else {
        panic!("get failed");
    };
    assert!(fresh.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn guarded_delete_checks_the_stored_attribute() {
    let Some(store) = store("guarded_delete_checks_the_stored_attribute").await else {
        return;
    };
    let pk = partition("LEAGUE");
    let key = ItemKey::new(pk.as_str(), "MATCH#000000000002");
    assert!(store
        .write(put(item(&pk, &key.sk, "replacement"), Condition::Always))
        .await
        .is_ok());

    let stale = store
        .transact(vec![WriteOp::Delete {
            key: key.clone(),
            condition: Condition::attribute_equals("id", json!("original")),
        }])
        .await;
    assert!(matches!(stale, Err(StoreError::TransactionAborted(0))));
    let Ok(Some(kept)) = store.get(&key).await else {
        panic!("replacement was deleted");
    };
    assert_eq!(kept.attrs.get("id"), Some(&json!("replacement")));

    let current = store
        .write(WriteOp::Delete {
            key: key.clone(),
            condition: Condition::attribute_equals("id", json!("replacement")),
        })
        .await;
    assert!(current.is_ok());
    let Ok(gone) = store.get(&key).await else {
        panic!("get failed");
    };
    assert!(gone.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn sequence_guard_rejects_stale_updates() {
    let Some(store) = store("sequence_guard_rejects_stale_updates").await else {
        return;
    };
    let pk = partition("LEAGUE");
    let mut meta = item(&pk, "META", "league");
    meta.attrs.insert("matchSeq".to_string(), json!(1));
    assert!(store.write(put(meta, Condition::NotExists)).await.is_ok());

    let bump = |from: u64, to: u64| WriteOp::Update {
        key: ItemKey::new(pk.as_str(), "META"),
        changes: ItemChanges::default().set("matchSeq", json!(to)),
        condition: Condition::attribute_equals("matchSeq", json!(from)),
    };
    assert!(store.write(bump(1, 2)).await.is_ok());
    assert!(matches!(
        store.write(bump(1, 2)).await,
        Err(StoreError::ConditionFailed)
    ));

    let missing = store
        .write(WriteOp::Update {
            key: ItemKey::new(pk.as_str(), "NOPE"),
            changes: ItemChanges::default().set("name", json!("x")),
            condition: Condition::Always,
        })
        .await;
    assert!(matches!(missing, Err(StoreError::ConditionFailed)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn queries_follow_prefix_order_limit_and_index_moves() {
    let Some(store) = store("queries_follow_prefix_order_limit_and_index_moves").await else {
        return;
    };
    let pk = partition("LEAGUE");
    for sk in ["MATCH#001", "MATCH#002", "MATCH#003", "META"] {
        assert!(store
            .write(put(item(&pk, sk, sk), Condition::Always))
            .await
            .is_ok());
    }
    let Ok(newest) = store
        .query(&Query::partition(pk.as_str()).sort_prefix("MATCH#").descending().limit(2))
        .await
    else {
        panic!("query failed");
    };
    let keys: Vec<&str> = newest.iter().map(|i| i.key.sk.as_str()).collect();
    assert_eq!(keys, vec!["MATCH#003", "MATCH#002"]);

    let old_code = partition("INVITE");
    let new_code = partition("INVITE");
    let rotate = WriteOp::Update {
        key: ItemKey::new(pk.as_str(), "META"),
        changes: ItemChanges::default().with_index(IndexKeys {
            invite: Some(IndexKey::new(new_code.as_str(), pk.as_str())),
            ..IndexKeys::default()
        }),
        condition: Condition::Exists,
    };
    let indexed = item(&pk, "META", "league").with_index(IndexKeys {
        invite: Some(IndexKey::new(old_code.as_str(), pk.as_str())),
        ..IndexKeys::default()
    });
    assert!(store.write(put(indexed, Condition::Always)).await.is_ok());
    assert!(store.write(rotate).await.is_ok());

    let Ok(old) = store.query(&Query::index(IndexName::Invite, old_code)).await else {
        panic!("query failed");
    };
    assert!(old.is_empty());
    let Ok(new) = store.query(&Query::index(IndexName::Invite, new_code)).await else {
        panic!("query failed");
    };
    assert_eq!(new.len(), 1);
}
