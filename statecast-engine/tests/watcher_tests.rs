use serde_json::json;
use statecast_engine::{
    EngineConfig, KeyBinding, ProjectionEngine, ProviderBinding, Watcher,
};
use statecast_store::EntityStore;
use statecast_types::{ConnectionInfo, Entity, EntityKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn text(key: &str, text: &str) -> Entity {
    Entity::new(key, EntityKind::Text, json!(text))
}

fn make_engine(store: &Arc<EntityStore>) -> Arc<ProjectionEngine> {
    // RUST_LOG=statecast_engine=debug shows the watcher's pass logging.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Arc::new(ProjectionEngine::new(
        store.clone(),
        ConnectionInfo::new(1),
        EngineConfig::default(),
    ))
}

/// Registers a pass counter alongside a snapshot-size provider.
fn count_passes(engine: &ProjectionEngine) -> Arc<AtomicUsize> {
    let passes = Arc::new(AtomicUsize::new(0));
    let counter = passes.clone();
    engine.add_providers([(
        "count",
        ProviderBinding::new(move |snapshot, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            json!(snapshot.len())
        }),
    )]);
    passes
}

// Paused tokio time: sleeps complete instantly once every task is idle, so
// these tests are deterministic and take no wall-clock time.

#[tokio::test(start_paused = true)]
async fn store_change_triggers_a_pass() {
    let store = Arc::new(EntityStore::new());
    let engine = make_engine(&store);
    engine.add_keys([("player", KeyBinding::fixed("p1"))]);

    let watcher = Watcher::spawn(engine.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;

    store.insert(text("p1", "hi"));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(engine.value("player"), Some(json!("hi")));
    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn burst_coalesces_into_one_pass() {
    let store = Arc::new(EntityStore::new());
    let engine = make_engine(&store);
    let passes = count_passes(&engine);

    let watcher = Watcher::spawn(engine.clone());
    // The registration above left a pending nudge; let that pass settle.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(passes.load(Ordering::SeqCst), 1);

    // Ten rapid mutations inside one coalescing window.
    for i in 0..10 {
        store.insert(text(&format!("k{i}"), "v"));
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(passes.load(Ordering::SeqCst), 2);
    assert_eq!(engine.value("count"), Some(json!(10)));
    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn registry_change_alone_triggers_a_pass() {
    let store = Arc::new(EntityStore::new());
    store.insert(text("p1", "hi"));

    let engine = make_engine(&store);
    let watcher = Watcher::spawn(engine.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;

    engine.add_keys([("player", KeyBinding::fixed("p1"))]);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(engine.value("player"), Some(json!("hi")));
    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn resume_catches_up_through_the_watcher() {
    let store = Arc::new(EntityStore::new());
    store.insert(text("a", "before"));

    let engine = make_engine(&store);
    engine.add_keys([("alpha", KeyBinding::fixed("a"))]);

    let watcher = Watcher::spawn(engine.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.value("alpha"), Some(json!("before")));

    engine.pause(["a"]);
    store.insert(text("a", "after"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.value("alpha"), Some(json!("before")));

    engine.resume();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.value("alpha"), Some(json!("after")));
    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn failed_pass_keeps_the_watcher_alive() {
    let store = Arc::new(EntityStore::new());
    store.insert(Entity::new("a", EntityKind::Object, json!({"ref": "ghost"})));

    let engine = make_engine(&store);
    engine.add_keys([("broken", KeyBinding::fixed("a"))]);

    let watcher = Watcher::spawn(engine.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The unresolvable reference failed the pass; nothing committed.
    assert!(engine.values().is_empty());
    assert!(!watcher.is_finished());

    // Fixing the store lets the next scheduled pass commit.
    store.insert(text("ghost", "found"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.value("broken"), Some(json!({"ref": "found"})));
    watcher.abort();
}
