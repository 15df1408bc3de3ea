//! The audit log record.
//!
//! A `LogEntry` records one action taken against one object. The target is
//! identified by content type and primary key, with the object's title
//! copied in so the entry stays readable after the object is gone.
//!
//! Entries are written once and are not edited afterwards, with one
//! exception: the revision backfill may raise `published` from false to true.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    content::ContentType,
    error::{WagtailError, WagtailResult},
    labels,
    site::{RevisionId, UserId},
};

/// Context flags qualifying the action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFlags {
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub unpublished: bool,
    #[serde(default)]
    pub content_changed: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// A log entry as handed to the store, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub content_type: Option<ContentType>,
    pub object_id: String,
    pub object_title: String,
    pub action: String,
    pub data_json: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub revision_id: Option<RevisionId>,
    pub flags: LogFlags,
}

/// A stored audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned primary key.
    pub id: u64,

    /// Content type of the target; `None` once the model has been removed.
    pub content_type: Option<ContentType>,

    pub object_id: String,

    /// Title of the target at the time of the action.
    pub object_title: String,

    /// Namespaced action identifier, e.g. `wagtail.publish`.
    pub action: String,

    /// JSON payload as text. Empty means no payload.
    #[serde(default)]
    pub data_json: String,

    pub timestamp: DateTime<Utc>,

    /// The acting user, `None` for system actions.
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// The page revision this action produced, if any.
    #[serde(default)]
    pub revision_id: Option<RevisionId>,

    #[serde(flatten)]
    pub flags: LogFlags,

    #[serde(skip)]
    username: OnceLock<String>,

    #[serde(skip)]
    data: OnceLock<Value>,
}

impl LogEntry {
    /// Materialize a stored row from its insert form.
    pub fn from_new(id: u64, new: NewLogEntry) -> Self {
        Self {
            id,
            content_type: new.content_type,
            object_id: new.object_id,
            object_title: new.object_title,
            action: new.action,
            data_json: new.data_json,
            timestamp: new.timestamp,
            user_id: new.user_id,
            revision_id: new.revision_id,
            flags: new.flags,
            username: OnceLock::new(),
            data: OnceLock::new(),
        }
    }

    /// Display name of the actor, resolved once and cached on this instance.
    ///
    /// `resolve` maps a user id to a username and returns `None` when the
    /// account no longer exists.
    pub fn username_with<F>(&self, resolve: F) -> &str
    where
        F: FnOnce(UserId) -> Option<String>,
    {
        self.username.get_or_init(|| match self.user_id {
            Some(id) => resolve(id).unwrap_or_else(|| labels::deleted_user(id)),
            None => labels::system_user(),
        })
    }

    /// The payload parsed from `data_json`, cached on first success.
    ///
    /// Empty text reads as an empty object. Malformed text is an error for
    /// this read only; nothing is cached, so a later read fails the same way.
    pub fn data(&self) -> WagtailResult<&Value> {
        if let Some(value) = self.data.get() {
            return Ok(value);
        }

        let parsed = if self.data_json.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&self.data_json).map_err(|e| WagtailError::InvalidPayload {
                reason: format!("log entry {}: {}", self.id, e),
            })?
        };

        Ok(self.data.get_or_init(|| parsed))
    }
}
