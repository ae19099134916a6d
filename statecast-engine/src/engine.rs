//! The projection engine: registries, suspend state, and the sync pipeline.

use crate::bindings::{KeyBinding, ProviderBinding, Snapshot};
use crate::error::ProjectionResult;
use crate::extract::extract;
use crate::refs::resolve_refs;
use serde_json::Value;
use statecast_store::EntityStore;
use statecast_types::ConnectionInfo;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::Notify;
use tracing::debug;

/// Prefix of source keys carried over from the legacy broadcast protocol.
const LEGACY_PREFIX: &str = "bc";

/// Configuration for the projection engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Coalescing window for the debounced watcher, in milliseconds.
    /// Signals arriving within the window collapse into one pass; each new
    /// signal resets the delay.
    pub coalesce_ms: u64,
    /// Fold legacy broadcast-protocol keys (`bc:customer:<id>`, `bc:room:*`)
    /// into the `player` and `room` source keys during normalization.
    pub legacy_aliases: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_ms: 50,
            legacy_aliases: false,
        }
    }
}

/// What a legacy key normalizes to.
enum LegacyKey {
    /// Not a legacy key; keep as-is.
    Keep,
    /// Fold into the given source key.
    Alias(&'static str),
    /// Another client's state; not ours to project.
    Drop,
}

fn legacy_alias(key: &str, conn: &ConnectionInfo) -> LegacyKey {
    let parts: Vec<&str> = key.split(':').collect();
    if parts.first() != Some(&LEGACY_PREFIX) {
        return LegacyKey::Keep;
    }
    match parts.get(1) {
        Some(&"customer") => {
            if parts.get(2) == Some(&conn.id.to_string().as_str()) {
                LegacyKey::Alias("player")
            } else {
                LegacyKey::Drop
            }
        }
        Some(&"room") => LegacyKey::Alias("room"),
        _ => LegacyKey::Keep,
    }
}

/// Projects the entity store into a mapping of logical names to values.
///
/// One engine serves one store and one live connection. All methods return
/// immediately; registry and suspend changes take effect on the next
/// committed pass. The output mapping is mutated only inside
/// [`force_sync`](Self::force_sync)'s commit step, so reads between passes
/// always observe a fully settled state.
pub struct ProjectionEngine {
    store: Arc<EntityStore>,
    config: EngineConfig,
    conn: RwLock<ConnectionInfo>,
    key_map: RwLock<HashMap<String, KeyBinding>>,
    provider_map: RwLock<HashMap<String, ProviderBinding>>,
    /// `None` = live; `Some(empty)` = everything paused; `Some(keys)` =
    /// those source keys excluded from normalization.
    suspended: RwLock<Option<HashSet<String>>>,
    output: RwLock<HashMap<String, Value>>,
    /// Wakes the watcher when something other than the store changed.
    nudge: Notify,
}

impl ProjectionEngine {
    /// Creates an engine over `store` for the given connection.
    pub fn new(store: Arc<EntityStore>, conn: ConnectionInfo, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            conn: RwLock::new(conn),
            key_map: RwLock::new(HashMap::new()),
            provider_map: RwLock::new(HashMap::new()),
            suspended: RwLock::new(None),
            output: RwLock::new(HashMap::new()),
            nudge: Notify::new(),
        }
    }

    /// The store this engine projects.
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live connection identity.
    pub fn connection(&self) -> ConnectionInfo {
        *self.conn.read().expect("engine lock poisoned")
    }

    /// Replaces the live connection identity (e.g., after a reconnect).
    /// Resolver-backed bindings follow the new identity on the next pass.
    pub fn set_connection(&self, conn: ConnectionInfo) {
        *self.conn.write().expect("engine lock poisoned") = conn;
        self.nudge.notify_one();
    }

    // ── Registries ───────────────────────────────────────────────

    /// Registers key bindings. An existing binding under the same logical
    /// name is overwritten.
    pub fn add_keys<S, I>(&self, bindings: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, KeyBinding)>,
    {
        let mut key_map = self.key_map.write().expect("engine lock poisoned");
        for (name, binding) in bindings {
            key_map.insert(name.into(), binding);
        }
        drop(key_map);
        self.nudge.notify_one();
    }

    /// Removes key bindings by logical name. Unknown names are ignored.
    pub fn purge_keys<S, I>(&self, names: I)
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let mut key_map = self.key_map.write().expect("engine lock poisoned");
        for name in names {
            key_map.remove(name.as_ref());
        }
        drop(key_map);
        self.nudge.notify_one();
    }

    /// Registers provider bindings. An existing binding under the same
    /// logical name is overwritten.
    pub fn add_providers<S, I>(&self, bindings: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, ProviderBinding)>,
    {
        let mut provider_map = self.provider_map.write().expect("engine lock poisoned");
        for (name, binding) in bindings {
            provider_map.insert(name.into(), binding);
        }
        drop(provider_map);
        self.nudge.notify_one();
    }

    /// Removes provider bindings by logical name. Unknown names are ignored.
    pub fn purge_providers<S, I>(&self, names: I)
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let mut provider_map = self.provider_map.write().expect("engine lock poisoned");
        for name in names {
            provider_map.remove(name.as_ref());
        }
        drop(provider_map);
        self.nudge.notify_one();
    }

    // ── Suspension ───────────────────────────────────────────────

    /// Pauses updates for the given source keys; an empty list pauses
    /// everything. Paused keys keep their last committed values and catch
    /// up in one step on [`resume`](Self::resume). Nothing is buffered.
    pub fn pause<S, I>(&self, keys: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let keys: HashSet<String> = keys.into_iter().map(Into::into).collect();
        debug!(paused = keys.len(), "updates paused");
        *self.suspended.write().expect("engine lock poisoned") = Some(keys);
    }

    /// Clears the suspend state and schedules a catch-up pass. A resume
    /// without an active pause is a no-op.
    pub fn resume(&self) {
        let mut suspended = self.suspended.write().expect("engine lock poisoned");
        if suspended.take().is_some() {
            drop(suspended);
            debug!("updates resumed");
            self.nudge.notify_one();
        }
    }

    // ── Observation ──────────────────────────────────────────────

    /// Returns a snapshot of the output mapping, valid until the next
    /// commit.
    pub fn values(&self) -> HashMap<String, Value> {
        self.output.read().expect("engine lock poisoned").clone()
    }

    /// Returns the committed value under a logical name.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.output
            .read()
            .expect("engine lock poisoned")
            .get(name)
            .cloned()
    }

    /// Waits for the next nudge (registry change, resume, reconnect).
    pub(crate) async fn nudged(&self) {
        self.nudge.notified().await;
    }

    // ── Sync pipeline ────────────────────────────────────────────

    /// Runs one full recompute pass and commits the result.
    ///
    /// The pass always computes from current store state, so running it
    /// twice with nothing changed in between commits an identical mapping.
    /// On error the pass is abandoned before commit and the output keeps
    /// its last good state.
    pub fn force_sync(&self) -> ProjectionResult<()> {
        let suspended = self
            .suspended
            .read()
            .expect("engine lock poisoned")
            .clone();
        if let Some(keys) = &suspended {
            if keys.is_empty() {
                debug!("all updates paused, skipping pass");
                return Ok(());
            }
        }
        let conn = self.connection();

        // 1. Normalize the store into the per-pass snapshot.
        let snapshot = self.normalize(suspended.as_ref(), &conn);

        let key_map = self.key_map.read().expect("engine lock poisoned");
        let provider_map = self.provider_map.read().expect("engine lock poisoned");
        let previous = self.output.read().expect("engine lock poisoned").clone();

        let mut next: HashMap<String, Value> = HashMap::new();
        // Names whose values were carried over from the previous commit
        // because their source key is paused; already resolved, never
        // re-walked.
        let mut carried: HashSet<String> = HashSet::new();

        // 2. Apply the key map. Names whose source key is absent from the
        // snapshot are omitted and pruned below; names whose source key is
        // paused keep their last committed value.
        for (name, binding) in key_map.iter() {
            let source = binding.source.resolve(&conn);
            if suspended.as_ref().is_some_and(|keys| keys.contains(&source)) {
                if let Some(prev) = previous.get(name) {
                    next.insert(name.clone(), prev.clone());
                    carried.insert(name.clone());
                }
                continue;
            }
            if let Some(value) = snapshot.get(&source) {
                next.insert(name.clone(), value.clone());
            }
        }

        // 3. Apply the provider map. A null result means "not applicable"
        // and the name is omitted for this pass.
        for (name, binding) in provider_map.iter() {
            let value = (binding.compute)(&snapshot, &conn);
            if !value.is_null() {
                next.insert(name.clone(), value);
            }
        }

        // 4. Resolve references. An unresolvable marker abandons the pass
        // here, before anything is committed.
        for (name, value) in next.iter_mut() {
            if carried.contains(name) {
                continue;
            }
            let deep = key_map.get(name).is_some_and(|b| b.deep_refs)
                || provider_map.get(name).is_some_and(|b| b.deep_refs);
            resolve_refs(name, value, &snapshot, deep)?;
        }

        drop(key_map);
        drop(provider_map);

        // 5 & 6. Prune dropped names, then commit.
        let mut output = self.output.write().expect("engine lock poisoned");
        output.retain(|name, _| next.contains_key(name));
        let committed = next.len();
        for (name, value) in next {
            output.insert(name, value);
        }
        debug!(
            entries = committed,
            tracked = snapshot.len(),
            "projection pass committed"
        );
        Ok(())
    }

    /// Builds the snapshot: every tracked entity's extracted value, keyed
    /// by source key, minus paused keys.
    fn normalize(&self, suspended: Option<&HashSet<String>>, conn: &ConnectionInfo) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (key, entity) in self.store.entries() {
            if suspended.is_some_and(|keys| keys.contains(&key)) {
                continue;
            }
            let Some(value) = extract(&entity) else {
                continue;
            };
            let key = if self.config.legacy_aliases {
                match legacy_alias(&key, conn) {
                    LegacyKey::Keep => key,
                    LegacyKey::Alias(alias) => alias.to_string(),
                    LegacyKey::Drop => continue,
                }
            } else {
                key
            };
            snapshot.insert(key, value);
        }
        snapshot
    }
}
