//! Live connection identity.

use serde::{Deserialize, Serialize};

/// Identity of the live session connection.
///
/// Resolver-style key bindings and provider functions receive this so they
/// can compute source keys or derived values that depend on who we are
/// (e.g., "my own entity key"). The id is stable for the lifetime of one
/// connection and may change after a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Server-assigned client id.
    pub id: i64,
}

impl ConnectionInfo {
    /// Creates a new connection identity.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self { id }
    }
}
