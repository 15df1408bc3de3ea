//! # wagtail-backfill
//!
//! Builds audit log history for pages edited before the audit log existed,
//! by walking their stored revisions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wagtail_backfill::convert_revisions_to_log_entries;
//!
//! let report = convert_revisions_to_log_entries(&revisions, &pages, &manager)?;
//! println!("{} entries created", report.entries_created);
//! ```

pub mod convert;
pub mod memory;

pub use convert::{convert_revisions_to_log_entries, BackfillReport, IGNORED_FIELDS};
pub use memory::{InMemoryPages, InMemoryRevisions};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use wagtail_audit::{InMemoryLogStore, LogEntryManager, LogFields};
    use wagtail_contracts::{
        content::ContentType,
        error::{WagtailError, WagtailResult},
        log_entry::{LogEntry, NewLogEntry},
        site::{Page, PageId, PageRevision, RevisionId, UserId},
    };
    use wagtail_core::{traits::LogEntryStore, Query};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, day, 12, 0, 0).unwrap()
    }

    fn page(id: i64, live_revision: Option<i64>) -> Page {
        Page {
            id: PageId(id),
            content_type: ContentType::new("blog", "blogpage"),
            title: format!("Post {id}"),
            draft_title: String::new(),
            live: live_revision.is_some(),
            live_revision_id: live_revision.map(RevisionId),
            locked: false,
            locked_by: None,
            locked_at: None,
        }
    }

    fn revision(id: i64, page_id: i64, day: u32, content: serde_json::Value) -> PageRevision {
        PageRevision {
            id: RevisionId(id),
            page_id: PageId(page_id),
            created_at: at(day),
            user_id: Some(UserId(7)),
            content_json: content.to_string(),
        }
    }

    struct Site {
        store: InMemoryLogStore,
        manager: LogEntryManager,
    }

    impl Site {
        fn new() -> Self {
            let store = InMemoryLogStore::new();
            let manager = LogEntryManager::new(Arc::new(store.clone()));
            Self { store, manager }
        }

        fn run(&self, revisions: Vec<PageRevision>, pages: Vec<Page>) -> BackfillReport {
            self.try_run(revisions, pages).unwrap()
        }

        fn try_run(&self, revisions: Vec<PageRevision>, pages: Vec<Page>) -> Result<BackfillReport, WagtailError> {
            convert_revisions_to_log_entries(
                &InMemoryRevisions::new(revisions),
                &InMemoryPages::new(pages),
                &self.manager,
            )
        }

        fn entry_for(&self, revision: i64) -> Option<LogEntry> {
            self.store
                .snapshot()
                .unwrap()
                .into_iter()
                .find(|e| e.revision_id == Some(RevisionId(revision)))
        }

        fn entries(&self) -> Vec<LogEntry> {
            self.store.snapshot().unwrap()
        }
    }

    /// (action, created, content_changed, published)
    fn flags(entry: &LogEntry) -> (&str, bool, bool, bool) {
        (
            entry.action.as_str(),
            entry.flags.created,
            entry.flags.content_changed,
            entry.flags.published,
        )
    }

    // ── Entry creation ────────────────────────────────────────────────────────

    #[test]
    fn publish_edit_publish_history() {
        let site = Site::new();

        // R1 is the live revision when the history is first converted.
        let r1 = revision(1, 10, 1, json!({"title": "Hello", "body": "v1", "live": true}));
        site.run(vec![r1.clone()], vec![page(10, Some(1))]);

        // Later R2 is saved as a draft and R3 publishes the same content.
        let r2 = revision(2, 10, 2, json!({"title": "Hello", "body": "v2", "live": true}));
        let r3 = revision(3, 10, 3, json!({"title": "Hello", "body": "v2", "live": false, "live_revision": 1}));
        let report = site.run(vec![r3, r1, r2], vec![page(10, Some(3))]);

        assert_eq!(flags(&site.entry_for(1).unwrap()), ("wagtail.publish", true, false, true));
        assert_eq!(flags(&site.entry_for(2).unwrap()), ("wagtail.edit", false, true, false));
        assert_eq!(flags(&site.entry_for(3).unwrap()), ("wagtail.publish", false, false, true));

        assert_eq!(report.revisions_scanned, 3);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.entries_created, 2);
    }

    #[test]
    fn entries_are_attributed_to_the_revision() {
        let site = Site::new();
        let mut target = page(10, Some(1));
        target.draft_title = "Hello (draft)".to_string();
        site.run(vec![revision(1, 10, 4, json!({"title": "Hello"}))], vec![target]);

        let entry = site.entry_for(1).unwrap();
        assert_eq!(entry.object_title, "Hello (draft)");
        assert_eq!(entry.object_id, "10");
        assert_eq!(entry.content_type, Some(ContentType::new("blog", "blogpage")));
        assert_eq!(entry.user_id, Some(UserId(7)));
        assert_eq!(entry.timestamp, at(4));
        assert_eq!(entry.data_json, "");
    }

    #[test]
    fn unchanged_drafts_are_not_logged() {
        let site = Site::new();
        let report = site.run(
            vec![
                revision(1, 10, 1, json!({"title": "A"})),
                revision(2, 10, 2, json!({"title": "A"})),
            ],
            vec![page(10, None)],
        );

        assert_eq!(report.unchanged, 2);
        assert_eq!(report.entries_created, 0);
        assert!(site.entries().is_empty());
    }

    #[test]
    fn volatile_fields_do_not_count_as_changes() {
        let site = Site::new();
        let report = site.run(
            vec![
                revision(1, 10, 1, json!({"title": "A", "live": false, "draft_title": "A", "path": "0001"})),
                revision(
                    2,
                    10,
                    2,
                    json!({
                        "title": "A",
                        "live": true,
                        "draft_title": "B",
                        "path": "0002",
                        "numchild": 3,
                        "owner": 4,
                        "latest_revision_created_at": "2019-06-02T12:00:00Z",
                    }),
                ),
            ],
            vec![page(10, None)],
        );
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn missing_volatile_keys_are_tolerated() {
        let site = Site::new();
        let report = site.run(
            vec![revision(1, 10, 1, json!({})), revision(2, 10, 2, json!({"body": "x"}))],
            vec![page(10, None)],
        );
        assert_eq!(report.entries_created, 1);
        assert_eq!(flags(&site.entry_for(2).unwrap()), ("wagtail.edit", false, true, false));
    }

    #[test]
    fn history_restarts_at_each_page() {
        let site = Site::new();
        site.run(
            vec![
                revision(1, 10, 1, json!({"title": "A"})),
                revision(3, 20, 2, json!({"title": "B"})),
                revision(2, 10, 3, json!({"title": "A2"})),
            ],
            vec![page(10, None), page(20, Some(3))],
        );

        // Page 20's only revision is compared with nothing, not with page 10.
        assert_eq!(flags(&site.entry_for(3).unwrap()), ("wagtail.publish", true, false, true));
        assert_eq!(flags(&site.entry_for(2).unwrap()), ("wagtail.edit", false, true, false));
        assert!(site.entry_for(1).is_none());
    }

    // ── Re-runs ───────────────────────────────────────────────────────────────

    #[test]
    fn second_run_creates_nothing() {
        let site = Site::new();
        let revisions = vec![
            revision(1, 10, 1, json!({"body": "v1"})),
            revision(2, 10, 2, json!({"body": "v2"})),
            revision(3, 10, 3, json!({"body": "v3"})),
        ];
        let first = site.run(revisions.clone(), vec![page(10, Some(3))]);
        assert_eq!(first.entries_created, 2);

        let second = site.run(revisions, vec![page(10, Some(3))]);
        assert_eq!(second.entries_created, 0);
        assert_eq!(second.skipped_existing, 2);
        assert_eq!(second.unchanged, 1);
        assert_eq!(site.entries().len(), 2);
    }

    #[test]
    fn existing_entries_still_feed_the_comparison() {
        let site = Site::new();
        let target = page(10, None);
        site.manager
            .log_action(&target, "wagtail.edit", LogFields::default().for_revision(RevisionId(2)))
            .unwrap();

        let report = site.run(
            vec![
                revision(1, 10, 1, json!({"body": "v1"})),
                revision(2, 10, 2, json!({"body": "v2"})),
                revision(3, 10, 3, json!({"body": "v2"})),
            ],
            vec![target],
        );

        // R3 matches the skipped R2, so nothing new is written.
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.entries_created, 0);
        assert_eq!(site.entries().len(), 1);
    }

    #[test]
    fn single_existing_entry_is_skipped() {
        let site = Site::new();
        let target = page(10, Some(3));
        site.manager
            .log_action(&target, "wagtail.publish", LogFields::default().for_revision(RevisionId(3)))
            .unwrap();

        let report = site.run(
            vec![
                revision(1, 10, 1, json!({"body": "v1"})),
                revision(2, 10, 2, json!({"body": "v2"})),
                revision(3, 10, 3, json!({"body": "v3"})),
            ],
            vec![target],
        );

        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.entries_created, 1);
        assert_eq!(site.entries().len(), 2);
        assert_eq!(site.entry_for(2).unwrap().action, "wagtail.edit");
    }

    /// Counts reads so the run's cost per revision can be checked.
    struct CountingStore {
        inner: InMemoryLogStore,
        reads: AtomicUsize,
    }

    impl LogEntryStore for CountingStore {
        fn insert(&self, entry: NewLogEntry) -> WagtailResult<LogEntry> {
            self.inner.insert(entry)
        }

        fn select(&self, query: &Query<LogEntry>) -> WagtailResult<Vec<LogEntry>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.select(query)
        }

        fn count(&self, query: &Query<LogEntry>) -> WagtailResult<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.count(query)
        }

        fn exists(&self, query: &Query<LogEntry>) -> WagtailResult<bool> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.exists(query)
        }

        fn update(
            &self,
            query: &Query<LogEntry>,
            mutation: &(dyn Fn(&mut LogEntry) + Send + Sync),
        ) -> WagtailResult<usize> {
            self.inner.update(query, mutation)
        }
    }

    #[test]
    fn logged_revisions_are_read_once_per_run() {
        let store = Arc::new(CountingStore {
            inner: InMemoryLogStore::new(),
            reads: AtomicUsize::new(0),
        });
        let manager = LogEntryManager::new(store.clone());
        let revisions: Vec<PageRevision> = (1..=500)
            .map(|id| revision(id, 10, 1, json!({ "body": id })))
            .collect();
        let pages = vec![page(10, Some(500))];

        let first = convert_revisions_to_log_entries(
            &InMemoryRevisions::new(revisions.clone()),
            &InMemoryPages::new(pages.clone()),
            &manager,
        )
        .unwrap();
        assert_eq!(first.entries_created, 499);
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);

        let second = convert_revisions_to_log_entries(
            &InMemoryRevisions::new(revisions),
            &InMemoryPages::new(pages),
            &manager,
        )
        .unwrap();
        assert_eq!(second.skipped_existing, 499);
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    // ── Published correction ──────────────────────────────────────────────────

    #[test]
    fn later_snapshot_marks_earlier_revision_published() {
        let site = Site::new();
        let revisions = vec![
            revision(1, 10, 1, json!({"body": "v1"})),
            revision(2, 10, 2, json!({"body": "v2"})),
            revision(3, 10, 3, json!({"body": "v3", "live_revision": 2})),
        ];

        let report = site.run(revisions.clone(), vec![page(10, Some(3))]);
        assert_eq!(report.published_corrected, 1);

        // Still an edit: only the flag is corrected.
        assert_eq!(flags(&site.entry_for(2).unwrap()), ("wagtail.edit", false, true, true));

        let again = site.run(revisions, vec![page(10, Some(3))]);
        assert_eq!(again.published_corrected, 0);
        assert!(site.entry_for(2).unwrap().flags.published);
    }

    #[test]
    fn correction_ignores_entries_from_other_runs() {
        let site = Site::new();
        let target = page(10, Some(3));
        site.manager
            .log_action(&target, "wagtail.edit", LogFields::default().for_revision(RevisionId(2)))
            .unwrap();

        let report = site.run(
            vec![
                revision(2, 10, 2, json!({"body": "v2"})),
                revision(3, 10, 3, json!({"body": "v3", "live_revision": 2})),
            ],
            vec![target],
        );
        assert_eq!(report.published_corrected, 0);
        assert!(!site.entry_for(2).unwrap().flags.published);
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn unreadable_snapshot_stops_the_run() {
        let site = Site::new();
        let mut broken = revision(1, 10, 1, json!({}));
        broken.content_json = "{not json".to_string();
        let err = site.try_run(vec![broken], vec![page(10, None)]).unwrap_err();
        assert!(matches!(err, WagtailError::Snapshot { revision_id: 1, .. }));

        let list = revision(2, 10, 1, json!(["title"]));
        let err = site.try_run(vec![list], vec![page(10, None)]).unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn revision_of_missing_page_is_an_error() {
        let site = Site::new();
        let err = site
            .try_run(vec![revision(1, 99, 1, json!({}))], vec![page(10, None)])
            .unwrap_err();
        assert!(matches!(err, WagtailError::MissingPage { revision_id: 1, page_id: 99 }));
    }
}
