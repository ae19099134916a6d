//! Entity records as delivered by the session transport.
//!
//! An entity is a keyed unit of live session state. The transport owns the
//! store of entities and mutates it; everything downstream (including the
//! projection engine) only reads. The payload is arbitrary JSON whose shape
//! is determined by the entity kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an entity, as tagged on the wire.
///
/// Kinds the projection engine does not track (locks, unrecognized tags)
/// still live in the store; they are filtered out at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A plain text value.
    Text,
    /// A numeric value.
    Number,
    /// A structured JSON object.
    Object,
    /// A map of per-client text values.
    TextMap,
    /// An uploaded artifact (image, audio, etc.).
    Artifact,
    /// A collaborative drawing.
    Doodle,
    /// A server-side lock; carries no projectable value.
    Lock,
    /// Any kind this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Object => "object",
            Self::TextMap => "textmap",
            Self::Artifact => "artifact",
            Self::Doodle => "doodle",
            Self::Lock => "lock",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A keyed record of live session state.
///
/// Owned and mutated only by the store; the projection engine never writes
/// to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// The source key this entity lives under in the store.
    pub key: String,
    /// The wire kind tag.
    pub kind: EntityKind,
    /// Kind-specific JSON payload.
    pub payload: serde_json::Value,
}

impl Entity {
    /// Creates a new entity.
    pub fn new(key: impl Into<String>, kind: EntityKind, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            kind,
            payload,
        }
    }

    /// Extract a string from the payload using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.payload.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a number from the payload using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.payload.pointer(pointer).and_then(|v| v.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn kind_roundtrip() {
        let kind: EntityKind = serde_json::from_str("\"textmap\"").unwrap();
        assert_eq!(kind, EntityKind::TextMap);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"textmap\"");
    }

    #[test]
    fn unrecognized_kind_is_unknown() {
        let kind: EntityKind = serde_json::from_str("\"vote-lock\"").unwrap();
        assert_eq!(kind, EntityKind::Unknown);
    }

    #[test]
    fn pointer_accessors() {
        let e = Entity::new(
            "room",
            EntityKind::Object,
            json!({"title": "lobby", "round": 3}),
        );
        assert_eq!(e.get_str("/title"), Some("lobby"));
        assert_eq!(e.get_number("/round"), Some(3.0));
        assert_eq!(e.get_str("/missing"), None);
    }
}
