//! Live entity-projection engine for statecast.
//!
//! The engine consumes the transport-owned [`EntityStore`] and maintains a
//! derived mapping of logical property names to values, kept consistent as
//! entities arrive, change, and disappear out of order.
//!
//! # Architecture
//!
//! - **Extraction** ([`extract`]): projects one entity into the value it
//!   represents, filtering out kinds the engine does not track.
//! - **Bindings** ([`KeyBinding`], [`ProviderBinding`]): declarative
//!   registries mapping logical names to source keys or computed values.
//! - **Reference resolution** ([`resolve_refs`]): replaces inline `ref`
//!   markers with the referenced entity's extracted value.
//! - **Pipeline** ([`ProjectionEngine`]): one recompute pass per trigger:
//!   normalize, apply key map, apply provider map, resolve references,
//!   prune dropped names, commit.
//! - **Watcher** ([`Watcher`]): subscribes to store change signals and
//!   coalesces bursts into a single debounced pass.
//!
//! Every pass recomputes from current store state rather than applying
//! deltas, so passes are idempotent and missed signals are harmless. The
//! output mapping is only mutated inside the commit step; observers never
//! see a partially-applied pass.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use statecast_engine::{EngineConfig, KeyBinding, ProjectionEngine};
//! use statecast_store::EntityStore;
//! use statecast_types::{ConnectionInfo, Entity, EntityKind};
//!
//! let store = Arc::new(EntityStore::new());
//! store.insert(Entity::new("p1", EntityKind::Text, json!("hi")));
//!
//! let engine = ProjectionEngine::new(store, ConnectionInfo::new(1), EngineConfig::default());
//! engine.add_keys([("player", KeyBinding::fixed("p1"))]);
//! engine.force_sync().unwrap();
//!
//! assert_eq!(engine.value("player"), Some(json!("hi")));
//! ```

mod bindings;
mod engine;
mod error;
mod extract;
mod refs;
mod watcher;

pub use bindings::{KeyBinding, KeySource, ProviderBinding, ProviderFn, Snapshot};
pub use engine::{EngineConfig, ProjectionEngine};
pub use error::{ProjectionError, ProjectionResult};
pub use extract::extract;
pub use refs::resolve_refs;
pub use watcher::Watcher;
