//! Users, pages and page revisions.
//!
//! These are the read-only inputs of the backfill command and of the locked
//! pages report. Revisions carry the page's field values at save time as a
//! JSON snapshot in `content_json`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentType, Loggable, Model};

/// Primary key of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub i64);

/// Primary key of a page revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub i64);

/// A user account as seen by the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// A page in the site tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// Content type of the specific page model.
    #[serde(default = "default_page_content_type")]
    pub content_type: ContentType,
    pub title: String,
    #[serde(default)]
    pub draft_title: String,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub live_revision_id: Option<RevisionId>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub locked_by: Option<UserId>,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
}

impl Model for Page {
    fn content_type() -> ContentType {
        ContentType::new("wagtailcore", "page")
    }
}

fn default_page_content_type() -> ContentType {
    <Page as Model>::content_type()
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Loggable for Page {
    fn content_type(&self) -> ContentType {
        self.content_type.clone()
    }

    fn pk(&self) -> Option<String> {
        Some(self.id.0.to_string())
    }

    /// The draft title wins so the admin shows unpublished renames.
    fn admin_display_title(&self) -> Option<String> {
        if self.draft_title.is_empty() {
            Some(self.title.clone())
        } else {
            Some(self.draft_title.clone())
        }
    }
}

/// A historical snapshot of a page's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRevision {
    pub id: RevisionId,
    pub page_id: PageId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// JSON object holding the page's field values at save time.
    pub content_json: String,
}
