//! # wagtail-reports
//!
//! Filters for the admin reports, and the routes they are served from.
//!
//! A `FilterSet<T>` turns request parameters into predicates on a
//! `Query<T>`. `ReportFilters` builds the four report filter sets (locked
//! pages, workflows, workflow tasks, site history) from the current users,
//! workflows and registered log actions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let reports = ReportFilters::new(users, catalog, registry);
//! let params = QueryParams::parse("action=wagtail.publish&timestamp_after=2024-01-01");
//!
//! let site_history = reports.site_history();
//! let outcome = site_history.filter(&params, manager.all());
//! let rows = manager.fetch(&outcome.query)?;
//! let chips = site_history.active_filters(&params, "/admin/reports/site-history/");
//! ```

pub mod accessor;
pub mod active;
pub mod filters;
pub mod filtersets;
pub mod params;
pub mod urls;
pub mod widgets;

pub use accessor::{FilterAccessor, FilterTarget};
pub use active::ActiveFilter;
pub use filters::{FieldError, Filter, FilterKind};
pub use filtersets::{FilterOutcome, FilterSet, ReportFilters};
pub use params::QueryParams;
pub use urls::{resolve, reverse, ReportView, Route};
pub use widgets::{FieldDescriptor, FilterOption, Widget};

// ── Tests ─────────────────────────────────────────────────────────────────────
