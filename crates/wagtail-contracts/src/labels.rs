//! User-facing strings.
//!
//! Every label the admin shows passes through here so a translation layer
//! has a single place to hook in.

pub const ALL: &str = "All";
pub const YES: &str = "Yes";
pub const NO: &str = "No";
pub const EMPTY_CHOICE: &str = "---------";
pub const DATE_FROM: &str = "Date from";
pub const DATE_TO: &str = "Date to";
pub const STARTED_AT: &str = "Started at";
pub const COMPLETED_AT: &str = "Completed at";
pub const TITLE: &str = "Title";
pub const WORKFLOW: &str = "Workflow";

/// Display name for entries written without an actor.
pub fn system_user() -> String {
    "system".to_string()
}

/// Display name for entries whose actor account has since been deleted.
pub fn deleted_user(id: impl std::fmt::Display) -> String {
    format!("user {id} (deleted)")
}
