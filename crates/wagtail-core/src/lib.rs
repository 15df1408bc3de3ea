//! # wagtail-core
//!
//! Persistence-layer traits and the composable `Query<T>` shared by the
//! audit log, report filters and revision backfill.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wagtail_core::{Query, traits::LogEntryStore};
//!
//! let recent = Query::all().filter(|e: &LogEntry| e.flags.published);
//! let rows = store.select(&recent)?;
//! ```

pub mod query;
pub mod traits;

pub use query::{Comparator, Predicate, Query};
