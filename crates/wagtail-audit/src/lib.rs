//! # wagtail-audit
//!
//! The audit log: a manager for writing and looking up `LogEntry` rows, and
//! an in-memory `LogEntryStore`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wagtail_audit::{InMemoryLogStore, LogEntryManager, LogFields};
//!
//! let manager = LogEntryManager::new(Arc::new(InMemoryLogStore::new()));
//! manager.log_action(&page, "wagtail.publish", LogFields::default().by(Some(user)))?;
//!
//! let history = manager.fetch(&manager.get_for_instance(&page))?;
//! ```

pub mod manager;
pub mod memory;

pub use manager::{encode_data, newest_first, LogEntryManager, LogFields};
pub use memory::InMemoryLogStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
