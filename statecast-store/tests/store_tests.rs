use pretty_assertions::assert_eq;
use serde_json::json;
use statecast_store::{EntityStore, StoreChange};
use statecast_types::{Entity, EntityKind};

fn text_entity(key: &str, text: &str) -> Entity {
    Entity::new(key, EntityKind::Text, json!(text))
}

// ── Reads & mutation ─────────────────────────────────────────────

#[test]
fn empty_store() {
    let store = EntityStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.get("p1").is_none());
    assert!(!store.contains("p1"));
}

#[test]
fn insert_and_get() {
    let store = EntityStore::new();
    store.insert(text_entity("p1", "hi"));

    let entity = store.get("p1").unwrap();
    assert_eq!(entity.kind, EntityKind::Text);
    assert_eq!(entity.payload, json!("hi"));
    assert!(store.contains("p1"));
    assert_eq!(store.len(), 1);
}

#[test]
fn insert_replaces() {
    let store = EntityStore::new();
    store.insert(text_entity("p1", "hi"));
    store.insert(text_entity("p1", "bye"));

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("p1").unwrap().payload, json!("bye"));
}

#[test]
fn remove_returns_entity() {
    let store = EntityStore::new();
    store.insert(text_entity("p1", "hi"));

    let removed = store.remove("p1").unwrap();
    assert_eq!(removed.payload, json!("hi"));
    assert!(store.get("p1").is_none());
}

#[test]
fn remove_absent_key_is_noop() {
    let store = EntityStore::new();
    assert!(store.remove("ghost").is_none());
}

#[test]
fn entries_is_a_snapshot() {
    let store = EntityStore::new();
    store.insert(text_entity("a", "1"));
    store.insert(text_entity("b", "2"));

    let entries = store.entries();
    store.remove("a");

    // The snapshot taken before the removal is unaffected.
    assert_eq!(entries.len(), 2);
    assert_eq!(store.len(), 1);
}

// ── Change signals ───────────────────────────────────────────────

#[tokio::test]
async fn insert_signals_upsert() {
    let store = EntityStore::new();
    let mut rx = store.subscribe();

    store.insert(text_entity("p1", "hi"));
    assert_eq!(rx.recv().await.unwrap(), StoreChange::Upserted("p1".into()));
}

#[tokio::test]
async fn replace_signals_upsert() {
    let store = EntityStore::new();
    store.insert(text_entity("p1", "hi"));

    let mut rx = store.subscribe();
    store.insert(text_entity("p1", "bye"));
    assert_eq!(rx.recv().await.unwrap(), StoreChange::Upserted("p1".into()));
}

#[tokio::test]
async fn remove_signals_removal() {
    let store = EntityStore::new();
    store.insert(text_entity("p1", "hi"));

    let mut rx = store.subscribe();
    store.remove("p1");
    assert_eq!(rx.recv().await.unwrap(), StoreChange::Removed("p1".into()));
}

#[tokio::test]
async fn remove_absent_key_emits_nothing() {
    let store = EntityStore::new();
    let mut rx = store.subscribe();

    store.remove("ghost");
    store.insert(text_entity("p1", "hi"));

    // The first signal observed is the insert, not the no-op removal.
    assert_eq!(rx.recv().await.unwrap(), StoreChange::Upserted("p1".into()));
}

#[test]
fn change_key_accessor() {
    assert_eq!(StoreChange::Upserted("a".into()).key(), "a");
    assert_eq!(StoreChange::Removed("b".into()).key(), "b");
}
