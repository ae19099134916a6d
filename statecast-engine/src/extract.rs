//! Value extraction: one entity in, its projected value (or nothing) out.

use crate::refs::{LEGACY_REF_FIELD, REF_FIELD};
use serde_json::Value;
use statecast_types::{Entity, EntityKind};

/// Returns the value an entity projects to, or `None` for entity kinds the
/// engine does not track.
///
/// Filtering is deliberate, not an error: the store carries kinds (locks,
/// unrecognized tags) that are irrelevant to the projection. A null payload
/// on an otherwise tracked kind is also treated as "not tracked".
///
/// The returned value is always a copy; the store's own object graph is
/// never aliased. Structured payloads are additionally canonicalized so
/// that the legacy `$ref` marker spelling becomes `ref` everywhere, which
/// is the only spelling later stages look for.
pub fn extract(entity: &Entity) -> Option<Value> {
    match entity.kind {
        EntityKind::Text
        | EntityKind::Number
        | EntityKind::Object
        | EntityKind::TextMap
        | EntityKind::Artifact
        | EntityKind::Doodle => {
            if entity.payload.is_null() {
                return None;
            }
            let mut value = entity.payload.clone();
            canonicalize_markers(&mut value);
            Some(value)
        }
        EntityKind::Lock | EntityKind::Unknown => None,
    }
}

/// Rewrites every `$ref` field to `ref`, recursively. When both spellings
/// are present, `$ref` wins; both are never left in place.
fn canonicalize_markers(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(legacy) = map.remove(LEGACY_REF_FIELD) {
                map.insert(REF_FIELD.to_string(), legacy);
            }
            for child in map.values_mut() {
                canonicalize_markers(child);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                canonicalize_markers(child);
            }
        }
        _ => {}
    }
}
