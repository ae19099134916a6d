//! Core type definitions for statecast.
//!
//! This crate defines the fundamental, transport-agnostic types shared by
//! the entity store and the projection engine:
//! - Entities and their kinds, as delivered by the session transport
//! - The live connection identity handed to resolvers and providers
//!
//! Everything application-specific (which logical names exist, what a
//! provider computes) belongs to the consumer, not here.

mod connection;
mod entity;

pub use connection::ConnectionInfo;
pub use entity::{Entity, EntityKind};
