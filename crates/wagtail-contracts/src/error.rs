//! Error types shared by the audit log, registry, reports and backfill.
//!
//! All fallible operations return `WagtailResult<T>`. Variants carry a
//! human-readable `reason` so the command line can print them verbatim.

use thiserror::Error;

/// The unified error type for the audit log crates.
#[derive(Debug, Error)]
pub enum WagtailError {
    /// The persistence layer rejected a read or write.
    #[error("store operation failed: {reason}")]
    Store { reason: String },

    /// A stored JSON payload could not be parsed.
    #[error("invalid log entry payload: {reason}")]
    InvalidPayload { reason: String },

    /// A revision's content snapshot is not a JSON object.
    #[error("revision {revision_id} has an unreadable snapshot: {reason}")]
    Snapshot { revision_id: i64, reason: String },

    /// A revision points at a page the store does not know about.
    #[error("revision {revision_id} refers to missing page {page_id}")]
    MissingPage { revision_id: i64, page_id: i64 },

    /// A configuration value or declaration is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A report route was requested with a method other than GET.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },
}

/// Convenience alias used throughout the workspace.
pub type WagtailResult<T> = Result<T, WagtailError>;
