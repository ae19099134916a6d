//! Keyed entity container with change notification.

use statecast_types::Entity;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the change-signal channel. Signals are wakeups, not data;
/// a subscriber that lags simply recomputes from current state.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A change signal emitted whenever a key is added, replaced, or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// The key was added or replaced.
    Upserted(String),
    /// The key was removed.
    Removed(String),
}

impl StoreChange {
    /// The store key the change applies to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Upserted(key) | Self::Removed(key) => key,
        }
    }
}

/// Keyed in-memory container of entities.
///
/// All mutation goes through [`insert`](Self::insert) and
/// [`remove`](Self::remove), each of which emits a [`StoreChange`] to every
/// subscriber. Reads return clones; the store's own object graph is never
/// handed out by reference.
pub struct EntityStore {
    entities: RwLock<HashMap<String, Entity>>,
    changes: broadcast::Sender<StoreChange>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entities: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Subscribes to change signals.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Inserts or replaces the entity under its key and signals the change.
    pub fn insert(&self, entity: Entity) {
        let key = entity.key.clone();
        {
            let mut entities = self.entities.write().expect("entity store lock poisoned");
            entities.insert(key.clone(), entity);
        }
        trace!(key = %key, "entity upserted");
        // Send only fails when there are no subscribers, which is fine.
        let _ = self.changes.send(StoreChange::Upserted(key));
    }

    /// Removes the entity under `key`, if present, and signals the change.
    ///
    /// Removing an absent key emits no signal.
    pub fn remove(&self, key: &str) -> Option<Entity> {
        let removed = {
            let mut entities = self.entities.write().expect("entity store lock poisoned");
            entities.remove(key)
        };
        if removed.is_some() {
            trace!(key = %key, "entity removed");
            let _ = self.changes.send(StoreChange::Removed(key.to_string()));
        }
        removed
    }

    /// Returns a clone of the entity under `key`.
    pub fn get(&self, key: &str) -> Option<Entity> {
        self.entities
            .read()
            .expect("entity store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Returns whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entities
            .read()
            .expect("entity store lock poisoned")
            .contains_key(key)
    }

    /// Returns all current keys.
    pub fn keys(&self) -> Vec<String> {
        self.entities
            .read()
            .expect("entity store lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Returns a clone of the full key/entity mapping.
    ///
    /// This is the read the projection engine's normalize step uses: one
    /// consistent view of the store per pass.
    pub fn entries(&self) -> HashMap<String, Entity> {
        self.entities
            .read()
            .expect("entity store lock poisoned")
            .clone()
    }

    /// Number of entities currently stored.
    pub fn len(&self) -> usize {
        self.entities
            .read()
            .expect("entity store lock poisoned")
            .len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
