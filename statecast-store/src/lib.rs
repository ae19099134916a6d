//! Transport-owned entity store for statecast.
//!
//! The store is a keyed, in-memory container of [`Entity`] records plus a
//! subscribe-to-changes capability. The session transport owns it and
//! performs all mutation as messages arrive; the projection engine (and any
//! other consumer) only reads keys/values and subscribes.
//!
//! Change signals carry the affected key but no payload. Consumers are
//! expected to recompute from current store state rather than apply deltas,
//! so a lagged subscriber loses nothing but redundant wakeups.

mod store;

pub use store::{EntityStore, StoreChange};
