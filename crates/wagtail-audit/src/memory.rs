//! In-memory implementation of `LogEntryStore`.
//!
//! `InMemoryLogStore` is the reference store. It keeps every entry in a
//! `Vec` behind a `Mutex` and hands out ids from a counter, so clones of the
//! store share one table. The file-backed database in `manage` loads its
//! entries into one of these and writes them back after a command runs.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use wagtail_contracts::{
    error::{WagtailError, WagtailResult},
    log_entry::{LogEntry, NewLogEntry},
};
use wagtail_core::{traits::LogEntryStore, Query};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryLogStore`.
///
/// Every clone of the store points at the same state, so an entry inserted
/// through one handle is visible through all of them.
pub(crate) struct InMemoryState {
    /// All entries, in insertion order. `update` edits rows in place and
    /// never reorders them.
    pub(crate) entries: Vec<LogEntry>,

    /// The id the next inserted entry receives. Always greater than every id
    /// in `entries`, including ids of seeded rows.
    pub(crate) next_id: u64,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// A shared, lock-protected log entry table.
///
/// # Thread safety
///
/// Every operation takes the internal `Mutex` for its whole duration, so an
/// `update` is never interleaved with an `insert` from another thread.
/// Clones share the table through an `Arc` and need no extra
/// synchronization.
///
/// # Cost
///
/// Queries are predicate scans over the whole table. Callers that need one
/// answer per row of a long walk (the revision backfill, for instance) should
/// read once up front rather than query per row.
#[derive(Clone)]
pub struct InMemoryLogStore {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryLogStore {
    /// An empty table whose first entry gets id 1.
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    /// Seed the store with existing rows. New ids continue after the highest
    /// id present.
    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            state: Arc::new(Mutex::new(InMemoryState { entries, next_id })),
        }
    }

    /// Copy of every stored entry in insertion order.
    pub fn snapshot(&self) -> WagtailResult<Vec<LogEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    /// Acquire the table lock. A poisoned lock means a writer panicked
    /// mid-update, so it is reported as a store error instead of being
    /// recovered.
    fn lock(&self) -> WagtailResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| WagtailError::Store {
            reason: format!("log entry table lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── LogEntryStore impl ────────────────────────────────────────────────────────

impl LogEntryStore for InMemoryLogStore {
    fn insert(&self, entry: NewLogEntry) -> WagtailResult<LogEntry> {
        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id += 1;

        let stored = LogEntry::from_new(id, entry);
        state.entries.push(stored.clone());

        debug!(id, action = %stored.action, object_id = %stored.object_id, "log entry stored");
        Ok(stored)
    }

    fn select(&self, query: &Query<LogEntry>) -> WagtailResult<Vec<LogEntry>> {
        let state = self.lock()?;
        Ok(query.apply(state.entries.iter().cloned()))
    }

    fn count(&self, query: &Query<LogEntry>) -> WagtailResult<usize> {
        let state = self.lock()?;
        Ok(state.entries.iter().filter(|e| query.matches(e)).count())
    }

    fn exists(&self, query: &Query<LogEntry>) -> WagtailResult<bool> {
        let state = self.lock()?;
        Ok(state.entries.iter().any(|e| query.matches(e)))
    }

    fn update(
        &self,
        query: &Query<LogEntry>,
        mutation: &(dyn Fn(&mut LogEntry) + Send + Sync),
    ) -> WagtailResult<usize> {
        let mut state = self.lock()?;
        let mut updated = 0;
        for entry in state.entries.iter_mut().filter(|e| query.matches(e)) {
            mutation(entry);
            updated += 1;
        }
        debug!(updated, "log entries updated");
        Ok(updated)
    }
}
