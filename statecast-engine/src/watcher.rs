//! Debounced store watcher.
//!
//! One task per engine: it waits for a trigger (a store change signal or an
//! engine nudge), lets further triggers coalesce for the configured window,
//! then runs a single pipeline pass. A new trigger inside the window resets
//! the delay, so a burst of mutations costs one recompute.

use crate::engine::ProjectionEngine;
use statecast_store::StoreChange;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error};

/// Handle to the spawned watcher task.
pub struct Watcher {
    handle: JoinHandle<()>,
}

impl Watcher {
    /// Spawns the watcher for `engine` on the current tokio runtime.
    pub fn spawn(engine: Arc<ProjectionEngine>) -> Self {
        let changes = engine.store().subscribe();
        let handle = tokio::spawn(run(engine, changes));
        Self { handle }
    }

    /// Stops the watcher. No further passes will run; a pass already in
    /// progress is not interrupted mid-commit because passes are
    /// synchronous.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the watcher task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run(engine: Arc<ProjectionEngine>, mut changes: broadcast::Receiver<StoreChange>) {
    let window = Duration::from_millis(engine.config().coalesce_ms);
    debug!(window_ms = window.as_millis() as u64, "watcher started");

    loop {
        // Wait for the first trigger.
        let mut closed = false;
        tokio::select! {
            result = changes.recv() => match result {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            () = engine.nudged() => {}
        }

        // Coalesce: every further trigger restarts the window.
        loop {
            tokio::select! {
                () = sleep(window) => break,
                result = changes.recv() => match result {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => {
                        closed = true;
                        break;
                    }
                },
                () = engine.nudged() => {}
            }
        }

        // A failed pass is a wiring bug to surface, not a reason to stop
        // watching; a later registry change can fix it.
        if let Err(err) = engine.force_sync() {
            error!(%err, "projection pass failed");
        }

        if closed {
            break;
        }
    }

    debug!("watcher stopped");
}
