//! Writing and looking up log entries.
//!
//! `LogEntryManager` is the only way entries get written. It derives the
//! target's content type, primary key and title from the instance, encodes
//! the payload and stamps the time; everything else in `LogFields` passes
//! through untouched.
//!
//! The lookups return `Query<LogEntry>` values. Nothing is read from the
//! store until `fetch`, `count` or `exists` runs the query, so reports can
//! keep narrowing a lookup before evaluating it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use wagtail_contracts::{
    content::{ContentType, Loggable, Model},
    error::{WagtailError, WagtailResult},
    log_entry::{LogEntry, LogFlags, NewLogEntry},
    site::{RevisionId, UserId},
};
use wagtail_core::{
    traits::{LogEntryStore, UserDirectory},
    Query,
};

/// Optional fields for `LogEntryManager::log_action`.
#[derive(Debug, Clone, Default)]
pub struct LogFields {
    /// The acting user; `None` records a system action.
    pub user: Option<UserId>,
    /// Overrides the title derived from the instance when non-empty.
    pub title: Option<String>,
    pub data: Option<Value>,
    pub revision: Option<RevisionId>,
    /// Overrides the current time.
    pub timestamp: Option<DateTime<Utc>>,
    pub flags: LogFlags,
}

impl LogFields {
    pub fn by(mut self, user: Option<UserId>) -> Self {
        self.user = user;
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn for_revision(mut self, revision: RevisionId) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_flags(mut self, flags: LogFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Encode a payload for `LogEntry::data_json`.
///
/// Absent and empty payloads (null, `{}`, `[]`, `""`) become the empty
/// string so they read back as an empty mapping.
pub fn encode_data(data: Option<&Value>) -> WagtailResult<String> {
    let is_empty = match data {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    };
    if is_empty {
        return Ok(String::new());
    }

    serde_json::to_string(data.unwrap_or(&Value::Null)).map_err(|e| WagtailError::InvalidPayload {
        reason: format!("failed to encode log entry payload: {}", e),
    })
}

/// Newest entries first, ties broken by id.
pub fn newest_first(query: Query<LogEntry>) -> Query<LogEntry> {
    query.order_by(|a: &LogEntry, b: &LogEntry| {
        b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
    })
}

/// Write and read access to the audit log.
#[derive(Clone)]
pub struct LogEntryManager {
    store: Arc<dyn LogEntryStore>,
}

impl LogEntryManager {
    pub fn new(store: Arc<dyn LogEntryStore>) -> Self {
        Self { store }
    }

    /// Record `action` against `instance`.
    ///
    /// A missing primary key is not an error: the entry is written with an
    /// empty `object_id`.
    pub fn log_action(
        &self,
        instance: &dyn Loggable,
        action: &str,
        fields: LogFields,
    ) -> WagtailResult<LogEntry> {
        let title = match fields.title.filter(|t| !t.is_empty()) {
            Some(title) => title,
            None => instance
                .admin_display_title()
                .unwrap_or_else(|| instance.to_string()),
        };

        let entry = NewLogEntry {
            content_type: Some(instance.content_type()),
            object_id: instance.pk().unwrap_or_default(),
            object_title: title,
            action: action.to_string(),
            data_json: encode_data(fields.data.as_ref())?,
            timestamp: fields.timestamp.unwrap_or_else(Utc::now),
            user_id: fields.user,
            revision_id: fields.revision,
            flags: fields.flags,
        };

        let stored = self.store.insert(entry)?;
        debug!(
            id = stored.id,
            action = %stored.action,
            content_type = ?stored.content_type,
            object_id = %stored.object_id,
            "action logged"
        );
        Ok(stored)
    }

    // ── Lookups ───────────────────────────────────────────────────────────────

    pub fn all(&self) -> Query<LogEntry> {
        Query::all()
    }

    /// Entries for a model given as an `app_label.model` label.
    ///
    /// A label that does not name a model gives an empty query rather than
    /// an error.
    pub fn get_for_model(&self, label: &str) -> Query<LogEntry> {
        match ContentType::from_label(label) {
            Some(ct) => Self::for_content_type(ct),
            None => {
                debug!(label, "not a model label; returning empty query");
                Query::none()
            }
        }
    }

    /// Entries for the statically known model `M`.
    pub fn get_for_model_of<M: Model>(&self) -> Query<LogEntry> {
        Self::for_content_type(M::content_type())
    }

    /// Entries for one specific object.
    pub fn get_for_instance(&self, instance: &dyn Loggable) -> Query<LogEntry> {
        let object_id = instance.pk().unwrap_or_default();
        Self::for_content_type(instance.content_type())
            .filter(move |e: &LogEntry| e.object_id == object_id)
    }

    /// Entries acted by `user`.
    pub fn get_for_user(&self, user: UserId) -> Query<LogEntry> {
        Query::all().filter(move |e: &LogEntry| e.user_id == Some(user))
    }

    /// Entries that reference `revision`.
    pub fn get_for_revision(&self, revision: RevisionId) -> Query<LogEntry> {
        Query::all().filter(move |e: &LogEntry| e.revision_id == Some(revision))
    }

    fn for_content_type(ct: ContentType) -> Query<LogEntry> {
        Query::all().filter(move |e: &LogEntry| e.content_type.as_ref() == Some(&ct))
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    pub fn fetch(&self, query: &Query<LogEntry>) -> WagtailResult<Vec<LogEntry>> {
        self.store.select(query)
    }

    pub fn count(&self, query: &Query<LogEntry>) -> WagtailResult<usize> {
        self.store.count(query)
    }

    pub fn exists(&self, query: &Query<LogEntry>) -> WagtailResult<bool> {
        self.store.exists(query)
    }

    /// Bulk update; returns the number of matched rows.
    pub fn update(
        &self,
        query: &Query<LogEntry>,
        mutation: &(dyn Fn(&mut LogEntry) + Send + Sync),
    ) -> WagtailResult<usize> {
        self.store.update(query, mutation)
    }

    /// Actor display name for `entry`, resolved through `users`.
    pub fn username<'e>(&self, entry: &'e LogEntry, users: &dyn UserDirectory) -> &'e str {
        entry.username_with(|id| users.get(id).map(|u| u.username))
    }
}
