//! Content types and the traits that make an object loggable.
//!
//! A `ContentType` names a model as an `(app_label, model)` pair. Log entries
//! point at their target through a content type plus the target's primary
//! key rendered as a string, so any model can be audited without a foreign
//! key per table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A model identity, displayed as `app_label.model`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentType {
    pub app_label: String,
    pub model: String,
}

impl ContentType {
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into().to_lowercase(),
        }
    }

    /// Parse a dotted `app_label.model` label.
    ///
    /// Returns `None` unless the label has exactly two non-empty segments.
    pub fn from_label(label: &str) -> Option<Self> {
        let (app_label, model) = label.split_once('.')?;
        if app_label.is_empty() || model.is_empty() || model.contains('.') {
            return None;
        }
        Some(Self::new(app_label, model))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

/// A model type with a statically known content type.
pub trait Model {
    fn content_type() -> ContentType;
}

/// An object instance that can be the target of a log entry.
///
/// `Display` is the generic string conversion used for the entry title when
/// the instance has no admin display title.
pub trait Loggable: fmt::Display {
    /// The content type of the concrete (most specific) model.
    fn content_type(&self) -> ContentType;

    /// Primary key as a string, or `None` for an unsaved instance.
    fn pk(&self) -> Option<String>;

    /// Title shown in the admin, when the model defines one.
    fn admin_display_title(&self) -> Option<String> {
        None
    }
}
