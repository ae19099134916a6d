//! Error types for the projection engine.

use thiserror::Error;

/// Result type for projection passes.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors that can fail a projection pass.
///
/// These are configuration errors, not transient conditions: a consumer
/// declared wiring the current store cannot satisfy. The pass that hits one
/// is abandoned before commit, so the output mapping keeps its last good
/// state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    /// A `ref` marker named a source key absent from the current snapshot.
    #[error("mapped value \"{path}\" references entity \"{key}\" but it is not tracked")]
    UnresolvedReference {
        /// Path of the marker inside the output mapping (e.g. `greeting.intro`).
        path: String,
        /// The source key the marker pointed at.
        key: String,
    },
}
