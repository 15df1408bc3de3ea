//! Revision → log entry conversion.
//!
//! Revisions are visited once, grouped by page and oldest first. Each
//! revision is compared with the one before it on the same page after the
//! fields that change on every save are removed. A revision gets an entry
//! when its content changed or it is the page's live revision.
//!
//! A revision can turn out to have been live only after the fact, when a
//! later snapshot names it in `live_revision`. Those entries are corrected
//! in a second pass once the walk is complete.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use wagtail_audit::{LogEntryManager, LogFields};
use wagtail_contracts::{
    error::{WagtailError, WagtailResult},
    log_entry::{LogEntry, LogFlags},
    site::{Page, PageId, PageRevision, RevisionId},
};
use wagtail_core::{
    traits::{PageSource, RevisionSource},
    Query,
};

/// Snapshot keys that differ between saves without the content changing.
pub const IGNORED_FIELDS: [&str; 11] = [
    "live",
    "has_unpublished_changes",
    "url_path",
    "path",
    "depth",
    "numchild",
    "latest_revision_created_at",
    "live_revision",
    "draft_title",
    "owner",
    "locked",
];

pub const EDIT_ACTION: &str = "wagtail.edit";
pub const PUBLISH_ACTION: &str = "wagtail.publish";

/// Counts from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub revisions_scanned: usize,
    pub entries_created: usize,
    /// Revisions that already had an entry.
    pub skipped_existing: usize,
    /// Revisions neither changed nor live, so not logged.
    pub unchanged: usize,
    /// Entries whose `published` flag the second pass raised.
    pub published_corrected: usize,
}

/// A parsed snapshot with the volatile keys removed.
struct Snapshot {
    content: Map<String, Value>,
    live_revision: Option<RevisionId>,
}

impl Snapshot {
    fn parse(revision: &PageRevision) -> WagtailResult<Self> {
        let value: Value =
            serde_json::from_str(&revision.content_json).map_err(|e| WagtailError::Snapshot {
                revision_id: revision.id.0,
                reason: e.to_string(),
            })?;
        let Value::Object(mut content) = value else {
            return Err(WagtailError::Snapshot {
                revision_id: revision.id.0,
                reason: "snapshot is not a JSON object".to_string(),
            });
        };

        // Zero and null both mean "no live revision".
        let live_revision = content
            .get("live_revision")
            .and_then(Value::as_i64)
            .filter(|id| *id != 0)
            .map(RevisionId);

        for field in IGNORED_FIELDS {
            content.remove(field);
        }
        Ok(Self {
            content,
            live_revision,
        })
    }
}

/// The page the walk is currently on.
struct CurrentPage {
    page: Page,
    previous: Option<Map<String, Value>>,
}

/// Create the log entries missing for historical revisions.
///
/// Safe to re-run: revisions that already have an entry are skipped, and
/// the corrective pass only touches entries created by this run.
pub fn convert_revisions_to_log_entries(
    revisions: &dyn RevisionSource,
    pages: &dyn PageSource,
    manager: &LogEntryManager,
) -> WagtailResult<BackfillReport> {
    let mut report = BackfillReport::default();
    let mut current: Option<CurrentPage> = None;
    let mut once_live: HashSet<RevisionId> = HashSet::new();
    let mut logged: HashSet<RevisionId> = HashSet::new();
    let already_logged = logged_revisions(manager)?;

    for revision in revisions.revisions_in_page_order()? {
        let revision = revision?;
        report.revisions_scanned += 1;

        let is_new_page = current.as_ref().map(|c| c.page.id) != Some(revision.page_id);
        let state = match current.take() {
            Some(state) if !is_new_page => current.insert(state),
            _ => {
                let page = load_page(pages, &revision)?;
                debug!(page_id = page.id.0, title = %page.title, "converting page history");
                current.insert(CurrentPage {
                    page,
                    previous: None,
                })
            }
        };

        let snapshot = Snapshot::parse(&revision)?;
        if let Some(live) = snapshot.live_revision {
            once_live.insert(live);
        }

        if already_logged.contains(&revision.id) {
            report.skipped_existing += 1;
        } else {
            let content_changed =
                !is_new_page && state.previous.as_ref() != Some(&snapshot.content);
            let published = state.page.live_revision_id == Some(revision.id);

            if content_changed || published {
                let action = if published { PUBLISH_ACTION } else { EDIT_ACTION };
                manager.log_action(
                    &state.page,
                    action,
                    LogFields::default()
                        .by(revision.user_id)
                        .for_revision(revision.id)
                        .at(revision.created_at)
                        .with_flags(LogFlags {
                            created: is_new_page,
                            content_changed,
                            published,
                            ..LogFlags::default()
                        }),
                )?;
                logged.insert(revision.id);
                report.entries_created += 1;
            } else {
                report.unchanged += 1;
            }
        }

        state.previous = Some(snapshot.content);

        if report.revisions_scanned % 1000 == 0 {
            info!(
                scanned = report.revisions_scanned,
                created = report.entries_created,
                "converting revisions"
            );
        }
    }

    report.published_corrected = correct_published(manager, &once_live, &logged)?;

    info!(
        scanned = report.revisions_scanned,
        created = report.entries_created,
        skipped = report.skipped_existing,
        unchanged = report.unchanged,
        corrected = report.published_corrected,
        "revision conversion complete"
    );
    Ok(report)
}

/// Revisions that already have a log entry, read in one pass over the log.
fn logged_revisions(manager: &LogEntryManager) -> WagtailResult<HashSet<RevisionId>> {
    let with_revision = Query::all().filter(|e: &LogEntry| e.revision_id.is_some());
    let ids: HashSet<RevisionId> = manager
        .fetch(&with_revision)?
        .into_iter()
        .filter_map(|e| e.revision_id)
        .collect();
    debug!(count = ids.len(), "revisions already logged");
    Ok(ids)
}

fn load_page(pages: &dyn PageSource, revision: &PageRevision) -> WagtailResult<Page> {
    let PageId(page_id) = revision.page_id;
    match pages.page(revision.page_id)? {
        Some(page) => Ok(page),
        None => {
            warn!(revision_id = revision.id.0, page_id, "revision refers to a missing page");
            Err(WagtailError::MissingPage {
                revision_id: revision.id.0,
                page_id,
            })
        }
    }
}

/// Mark as published the entries for revisions some snapshot named as live.
fn correct_published(
    manager: &LogEntryManager,
    once_live: &HashSet<RevisionId>,
    logged: &HashSet<RevisionId>,
) -> WagtailResult<usize> {
    let targets: HashSet<RevisionId> = once_live.intersection(logged).copied().collect();
    if targets.is_empty() {
        return Ok(0);
    }

    let query = Query::all().filter(move |e: &LogEntry| {
        !e.flags.published && e.revision_id.is_some_and(|id| targets.contains(&id))
    });
    let corrected = manager.update(&query, &|e: &mut LogEntry| e.flags.published = true)?;
    debug!(corrected, "published flags corrected");
    Ok(corrected)
}
