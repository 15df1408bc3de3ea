//! # wagtail-contracts
//!
//! Shared types, errors and labels for the Wagtail audit log, action
//! registry, reports and revision backfill.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and the error type.

pub mod content;
pub mod error;
pub mod labels;
pub mod log_entry;
pub mod site;
pub mod workflow;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use content::{ContentType, Loggable};
    use error::WagtailError;
    use log_entry::{LogEntry, LogFlags, NewLogEntry};
    use site::{Page, PageId, UserId};
    use workflow::{Task, TaskId};

    fn entry(user_id: Option<UserId>, data_json: &str) -> LogEntry {
        LogEntry::from_new(
            7,
            NewLogEntry {
                content_type: Some(ContentType::new("wagtailcore", "page")),
                object_id: "3".to_string(),
                object_title: "Home".to_string(),
                action: "wagtail.edit".to_string(),
                data_json: data_json.to_string(),
                timestamp: Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap(),
                user_id,
                revision_id: None,
                flags: LogFlags::default(),
            },
        )
    }

    // ── ContentType ──────────────────────────────────────────────────────────

    #[test]
    fn content_type_label_round_trip() {
        let ct = ContentType::from_label("blog.BlogPage").unwrap();
        assert_eq!(ct.app_label, "blog");
        assert_eq!(ct.model, "blogpage");
        assert_eq!(ct.to_string(), "blog.blogpage");
    }

    #[test]
    fn content_type_rejects_malformed_labels() {
        assert!(ContentType::from_label("blog").is_none());
        assert!(ContentType::from_label(".page").is_none());
        assert!(ContentType::from_label("blog.").is_none());
        assert!(ContentType::from_label("a.b.c").is_none());
    }

    // ── Page ─────────────────────────────────────────────────────────────────

    #[test]
    fn page_display_title_prefers_draft_title() {
        let mut page = Page {
            id: PageId(3),
            content_type: ContentType::new("home", "homepage"),
            title: "Home".to_string(),
            draft_title: "Home (draft)".to_string(),
            live: true,
            live_revision_id: None,
            locked: false,
            locked_by: None,
            locked_at: None,
        };
        assert_eq!(page.admin_display_title().as_deref(), Some("Home (draft)"));

        page.draft_title.clear();
        assert_eq!(page.admin_display_title().as_deref(), Some("Home"));
        assert_eq!(page.pk().as_deref(), Some("3"));
    }

    #[test]
    fn page_deserializes_with_defaults() {
        let page: Page = serde_json::from_value(json!({ "id": 4, "title": "About" })).unwrap();
        assert_eq!(page.content_type, ContentType::new("wagtailcore", "page"));
        assert!(!page.live);
        assert!(page.live_revision_id.is_none());
    }

    #[test]
    fn page_keeps_explicit_content_type() {
        let page: Page = serde_json::from_value(json!({
            "id": 4,
            "title": "News",
            "content_type": { "app_label": "blog", "model": "blogpage" },
        }))
        .unwrap();
        assert_eq!(page.content_type, ContentType::new("blog", "blogpage"));
        assert_eq!(Loggable::content_type(&page), ContentType::new("blog", "blogpage"));
    }

    // ── Workflow ─────────────────────────────────────────────────────────────

    #[test]
    fn task_deserializes_without_workflows() {
        let task: Task = serde_json::from_value(json!({ "id": 10, "name": "Moderators" })).unwrap();
        assert_eq!(task.id, TaskId(10));
        assert!(task.workflows.is_empty());
    }

    // ── LogEntry ─────────────────────────────────────────────────────────────

    #[test]
    fn username_is_system_without_actor() {
        let e = entry(None, "");
        assert_eq!(e.username_with(|_| panic!("no lookup expected")), "system");
    }

    #[test]
    fn username_marks_deleted_actor() {
        let e = entry(Some(UserId(42)), "");
        let name = e.username_with(|_| None);
        assert!(name.contains("42"), "got {name}");
        assert!(name.contains("deleted"));
    }

    #[test]
    fn username_is_cached_per_instance() {
        let e = entry(Some(UserId(1)), "");
        assert_eq!(e.username_with(|_| Some("admin".to_string())), "admin");
        // A second lookup must not run.
        assert_eq!(e.username_with(|_| Some("renamed".to_string())), "admin");
    }

    #[test]
    fn empty_data_reads_as_empty_mapping() {
        let e = entry(None, "");
        assert_eq!(e.data().unwrap(), &json!({}));
    }

    #[test]
    fn data_parses_stored_json() {
        let e = entry(None, r#"{"title":{"old":"A","new":"B"}}"#);
        assert_eq!(e.data().unwrap()["title"]["new"], "B");
    }

    #[test]
    fn malformed_data_is_an_error() {
        let e = entry(None, "{not json");
        match e.data() {
            Err(WagtailError::InvalidPayload { reason }) => assert!(reason.contains("log entry 7")),
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn flags_flatten_into_entry_json() {
        let mut e = entry(None, "");
        e.flags.published = true;
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["published"], true);
        assert_eq!(value["created"], false);

        let back: LogEntry = serde_json::from_value(value).unwrap();
        assert!(back.flags.published);
    }

    // ── WagtailError display messages ────────────────────────────────────────

    #[test]
    fn error_missing_page_display() {
        let err = WagtailError::MissingPage { revision_id: 9, page_id: 2 };
        let msg = err.to_string();
        assert!(msg.contains("revision 9"));
        assert!(msg.contains("page 2"));
    }

    #[test]
    fn error_config_display() {
        let err = WagtailError::Config { reason: "no data dir".to_string() };
        assert!(err.to_string().contains("configuration error"));
    }
}
