//! Persistence-layer traits.
//!
//! The audit log, reports and backfill never talk to a database directly.
//! They go through these traits:
//!
//! - `LogEntryStore`   — append, query and bulk-update log entries
//! - `RevisionSource`  — stream page revisions in page/creation order
//! - `PageSource`      — look up pages by id
//! - `UserDirectory`   — resolve and list user accounts
//! - `WorkflowCatalog` — list workflows and tasks for report filters

use wagtail_contracts::{
    error::WagtailResult,
    log_entry::{LogEntry, NewLogEntry},
    site::{Page, PageId, PageRevision, User, UserId},
    workflow::{Task, TaskId, Workflow, WorkflowId},
};

use crate::query::Query;

/// Storage for audit log entries.
///
/// Entries are append-only from the caller's point of view; `update` exists
/// for bulk corrections and must only touch rows matched by the query.
///
/// # Thread safety
///
/// Stores are shared behind `Arc<dyn LogEntryStore>` by the manager, the
/// reports and the backfill, so every method takes `&self` and
/// implementations synchronize internally. A single call must be atomic with
/// respect to other calls: `update` must not observe a half-inserted row.
///
/// # Ids
///
/// `insert` assigns ids. They are unique and increase with insertion order,
/// so ordering by id reproduces the order entries were written.
pub trait LogEntryStore: Send + Sync {
    /// Persist a new entry and return it with its assigned id.
    fn insert(&self, entry: NewLogEntry) -> WagtailResult<LogEntry>;

    /// Return every entry matched by `query`, in the query's order (or
    /// insertion order when the query has none).
    fn select(&self, query: &Query<LogEntry>) -> WagtailResult<Vec<LogEntry>>;

    /// Number of entries matched by `query`.
    ///
    /// The default materializes the matches; stores that can count without
    /// copying rows should override it.
    fn count(&self, query: &Query<LogEntry>) -> WagtailResult<usize> {
        Ok(self.select(query)?.len())
    }

    /// True when at least one entry matches `query`.
    fn exists(&self, query: &Query<LogEntry>) -> WagtailResult<bool> {
        Ok(self.count(query)? > 0)
    }

    /// Apply `mutation` to every entry matched by `query` and return how many
    /// rows were changed.
    fn update(
        &self,
        query: &Query<LogEntry>,
        mutation: &(dyn Fn(&mut LogEntry) + Send + Sync),
    ) -> WagtailResult<usize>;
}

/// A lazily evaluated stream of revisions.
pub type RevisionStream<'a> = Box<dyn Iterator<Item = WagtailResult<PageRevision>> + 'a>;

/// Read access to historical page revisions.
///
/// Not `Send + Sync`: a source is owned by the single command that walks it,
/// and file-backed sources hold an open reader while streaming.
pub trait RevisionSource {
    /// Stream every revision ordered by `(page_id, created_at)` ascending,
    /// with the revision id breaking ties between equal timestamps.
    ///
    /// Implementations should not hold the whole history in memory at once.
    /// A read or parse failure is yielded as an `Err` item; the caller stops
    /// at the first one.
    fn revisions_in_page_order(&self) -> WagtailResult<RevisionStream<'_>>;
}

/// Read access to pages.
pub trait PageSource {
    /// The page with `id`, or `None` when it has been deleted.
    fn page(&self, id: PageId) -> WagtailResult<Option<Page>>;
}

/// Read access to user accounts.
pub trait UserDirectory: Send + Sync {
    /// The user with `id`, or `None` if the account does not exist.
    fn get(&self, id: UserId) -> Option<User>;

    /// All users, ordered for display.
    fn users(&self) -> Vec<User>;
}

/// Read access to workflows and tasks.
///
/// Report filter options are built from these lists each time a filter set
/// is constructed, so implementations should return current data.
pub trait WorkflowCatalog: Send + Sync {
    /// Every workflow, disabled ones included, since reports cover history.
    fn workflows(&self) -> Vec<Workflow>;

    /// Every task, disabled ones included.
    fn tasks(&self) -> Vec<Task>;

    /// Ids of the workflows that include `task`.
    fn workflows_for_task(&self, task: TaskId) -> Vec<WorkflowId>;
}
