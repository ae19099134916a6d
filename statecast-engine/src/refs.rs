//! Cross-entity reference resolution.
//!
//! Extracted values may carry reference markers: a `ref` field whose value
//! is a source key. Resolution substitutes the marker with the referenced
//! key's extracted value from the current snapshot, so consumers see the
//! referenced content inline instead of a key they would have to chase.

use crate::bindings::Snapshot;
use crate::error::{ProjectionError, ProjectionResult};
use serde_json::Value;

/// The canonical marker field.
pub(crate) const REF_FIELD: &str = "ref";

/// The legacy marker spelling, canonicalized away at extraction time.
pub(crate) const LEGACY_REF_FIELD: &str = "$ref";

/// Resolves reference markers in `value` against `snapshot`.
///
/// With `deep` unset, only markers visible at the top level are resolved:
/// the value's own `ref` field and the `ref` field of each immediate
/// object-valued field or array element. Markers nested any further stay
/// raw. With `deep` set, resolution recurses through all nested objects
/// and arrays.
///
/// A substituted value is never re-walked, so a chain of entities that
/// reference each other cannot loop.
///
/// A marker naming a source key absent from the snapshot is a wiring bug
/// on the consumer's side and fails the pass with
/// [`ProjectionError::UnresolvedReference`].
pub fn resolve_refs(
    name: &str,
    value: &mut Value,
    snapshot: &Snapshot,
    deep: bool,
) -> ProjectionResult<()> {
    hydrate(value, name, snapshot, deep, true)
}

fn hydrate(
    value: &mut Value,
    path: &str,
    snapshot: &Snapshot,
    deep: bool,
    top: bool,
) -> ProjectionResult<()> {
    match value {
        Value::Object(map) => {
            let substituted = if let Some(Value::String(key)) = map.get(REF_FIELD) {
                let target = snapshot.get(key.as_str()).cloned().ok_or_else(|| {
                    ProjectionError::UnresolvedReference {
                        path: path.to_string(),
                        key: key.clone(),
                    }
                })?;
                map.insert(REF_FIELD.to_string(), target);
                true
            } else {
                false
            };

            if top || deep {
                for (field, child) in map.iter_mut() {
                    if substituted && field == REF_FIELD {
                        continue;
                    }
                    if child.is_object() || child.is_array() {
                        hydrate(child, &format!("{path}.{field}"), snapshot, deep, false)?;
                    }
                }
            }
        }
        Value::Array(items) => {
            if top || deep {
                for (index, child) in items.iter_mut().enumerate() {
                    if child.is_object() || child.is_array() {
                        hydrate(child, &format!("{path}.{index}"), snapshot, deep, false)?;
                    }
                }
            }
        }
        _ => {}
    }

    Ok(())
}
