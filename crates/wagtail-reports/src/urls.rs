//! Report routes.
//!
//! Paths are relative to where the reports are mounted in the admin, e.g.
//! `/admin/reports/`. Every report is a read-only listing, so only GET (and
//! HEAD, which is answered as GET) is accepted.

use serde::Serialize;
use tracing::debug;

use wagtail_contracts::error::{WagtailError, WagtailResult};

/// Namespace prefix accepted by `reverse`, as in `wagtailadmin_reports:workflow`.
pub const NAMESPACE: &str = "wagtailadmin_reports";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportView {
    LockedPages,
    Workflow,
    WorkflowTasks,
    SiteHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub view: ReportView,
}

/// In declaration order. `workflow_tasks` is served from two paths.
pub const ROUTES: [Route; 5] = [
    Route {
        path: "locked/",
        name: "locked_pages",
        view: ReportView::LockedPages,
    },
    Route {
        path: "workflow/",
        name: "workflow",
        view: ReportView::Workflow,
    },
    Route {
        path: "workflow_tasks/",
        name: "workflow_tasks",
        view: ReportView::WorkflowTasks,
    },
    Route {
        path: "workflow/tasks/",
        name: "workflow_tasks",
        view: ReportView::WorkflowTasks,
    },
    Route {
        path: "site-history/",
        name: "site_history",
        view: ReportView::SiteHistory,
    },
];

/// Match a request against the report routes.
///
/// Returns `Ok(None)` for an unknown path and `MethodNotAllowed` for a known
/// path requested with anything but GET or HEAD. Any query string is
/// ignored.
pub fn resolve(method: &str, path: &str) -> WagtailResult<Option<Route>> {
    let bare = path.split('?').next().unwrap_or(path);
    let bare = bare.strip_prefix('/').unwrap_or(bare);

    let Some(route) = ROUTES.iter().find(|r| r.path == bare).copied() else {
        debug!(path, "no report route");
        return Ok(None);
    };

    if !(method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")) {
        return Err(WagtailError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_string(),
        });
    }

    debug!(path, name = route.name, "report route resolved");
    Ok(Some(route))
}

/// The path for a route name, with or without the namespace prefix.
///
/// When a name is declared more than once the last declaration wins.
pub fn reverse(name: &str) -> Option<&'static str> {
    let name = match name.split_once(':') {
        Some((namespace, name)) if namespace == NAMESPACE => name,
        Some(_) => return None,
        None => name,
    };
    ROUTES.iter().rev().find(|r| r.name == name).map(|r| r.path)
}
