//! Cancel-and-reschedule debouncing for `textDocument/didChange`.
//!
//! Each change to an open document restarts a short delay before the
//! document is reanalysed; a change arriving before the delay elapses
//! cancels the pending analysis and starts a new one. This mirrors the
//! original server's `asyncio.create_task` / `.cancel()` pattern, expressed
//! with `tokio::task::AbortHandle` on the single-threaded runtime this
//! server runs on.

use std::collections::HashMap;

use tokio::task::AbortHandle;

/// Tracks the in-flight debounce task for each open document URI.
#[derive(Debug, Default)]
pub struct DebounceRegistry {
    tasks: HashMap<String, AbortHandle>,
}

impl DebounceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scheduled task for `uri`, aborting any previous one.
    ///
    /// Callers are expected to spawn the new analysis task first and pass
    /// its handle here.
    pub fn reschedule(&mut self, uri: String, handle: AbortHandle) {
        if let Some(previous) = self.tasks.insert(uri, handle) {
            previous.abort();
        }
    }

    /// Cancel and forget the scheduled task for `uri`, if any.
    ///
    /// Called on `textDocument/didClose` so a pending debounce never fires
    /// analysis for a document that no longer exists.
    pub fn cancel(&mut self, uri: &str) {
        if let Some(handle) = self.tasks.remove(uri) {
            handle.abort();
        }
    }
}
