//! Declarative bindings from logical names to source keys and providers.
//!
//! Consumers register interest as they attach (a view mounting) and purge
//! it as they detach. Registration is last-write-wins per logical name, so
//! a re-mounting consumer can re-register the same interest without
//! producing duplicates.

use serde_json::Value;
use statecast_types::ConnectionInfo;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The per-pass view of all currently tracked extracted values, keyed by
/// source key. Rebuilt on every pass, never persisted.
pub type Snapshot = HashMap<String, Value>;

/// A provider function: computes a derived value from the current snapshot
/// and the live connection.
pub type ProviderFn = Arc<dyn Fn(&Snapshot, &ConnectionInfo) -> Value + Send + Sync>;

/// Where a key binding reads its value from.
#[derive(Clone)]
pub enum KeySource {
    /// A fixed source key.
    Fixed(String),
    /// A resolver evaluated against the live connection on every pass, so
    /// it tracks connection identity changes (e.g., reconnects).
    Resolver(Arc<dyn Fn(&ConnectionInfo) -> String + Send + Sync>),
}

impl KeySource {
    /// Resolves the source key for this pass.
    pub fn resolve(&self, conn: &ConnectionInfo) -> String {
        match self {
            Self::Fixed(key) => key.clone(),
            Self::Resolver(f) => f(conn),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(key) => f.debug_tuple("Fixed").field(key).finish(),
            Self::Resolver(_) => f.debug_tuple("Resolver").field(&"<fn>").finish(),
        }
    }
}

/// Binds a logical name to a source key in the store.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// The source key, fixed or connection-resolved.
    pub source: KeySource,
    /// Whether reference markers are resolved recursively through nested
    /// objects and arrays, instead of only at the top level.
    pub deep_refs: bool,
}

impl KeyBinding {
    /// Binds to a fixed source key.
    pub fn fixed(key: impl Into<String>) -> Self {
        Self {
            source: KeySource::Fixed(key.into()),
            deep_refs: false,
        }
    }

    /// Binds to a source key computed from the live connection each pass.
    pub fn resolver(f: impl Fn(&ConnectionInfo) -> String + Send + Sync + 'static) -> Self {
        Self {
            source: KeySource::Resolver(Arc::new(f)),
            deep_refs: false,
        }
    }

    /// Enables recursive reference resolution for this binding.
    #[must_use]
    pub fn with_deep_refs(mut self) -> Self {
        self.deep_refs = true;
        self
    }
}

/// Binds a logical name to a computed value.
#[derive(Clone)]
pub struct ProviderBinding {
    /// The provider function, run against the snapshot of every pass.
    pub compute: ProviderFn,
    /// Same meaning as [`KeyBinding::deep_refs`].
    pub deep_refs: bool,
}

impl ProviderBinding {
    /// Creates a provider binding.
    pub fn new(f: impl Fn(&Snapshot, &ConnectionInfo) -> Value + Send + Sync + 'static) -> Self {
        Self {
            compute: Arc::new(f),
            deep_refs: false,
        }
    }

    /// Enables recursive reference resolution for this binding.
    #[must_use]
    pub fn with_deep_refs(mut self) -> Self {
        self.deep_refs = true;
        self
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("compute", &"<fn>")
            .field("deep_refs", &self.deep_refs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_resolves_to_itself() {
        let binding = KeyBinding::fixed("p1");
        assert_eq!(binding.source.resolve(&ConnectionInfo::new(1)), "p1");
        assert!(!binding.deep_refs);
    }

    #[test]
    fn resolver_sees_the_connection() {
        let binding = KeyBinding::resolver(|conn| format!("client:{}", conn.id));
        assert_eq!(binding.source.resolve(&ConnectionInfo::new(42)), "client:42");
    }

    #[test]
    fn deep_refs_flag() {
        assert!(KeyBinding::fixed("p1").with_deep_refs().deep_refs);
        assert!(ProviderBinding::new(|_, _| Value::Null).with_deep_refs().deep_refs);
    }
}
