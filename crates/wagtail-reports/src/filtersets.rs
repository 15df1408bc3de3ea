//! Filter sets and the four report definitions.

use std::sync::Arc;

use tracing::{debug, warn};

use wagtail_actions::LogActionRegistry;
use wagtail_contracts::{
    error::WagtailResult,
    labels,
    log_entry::LogEntry,
    site::Page,
    workflow::{Task, TaskState, TaskStatus, WorkflowState, WorkflowStatus},
};
use wagtail_core::{
    traits::{UserDirectory, WorkflowCatalog},
    Query,
};

use crate::{
    accessor::FilterAccessor,
    filters::{Applied, FieldError, Filter},
    params::QueryParams,
    widgets::{FieldDescriptor, FilterOption},
};

/// The narrowed query plus any submitted values that were ignored.
pub struct FilterOutcome<T> {
    pub query: Query<T>,
    pub errors: Vec<FieldError>,
}

impl<T> FilterOutcome<T> {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// An ordered list of filters over `T`.
pub struct FilterSet<T> {
    name: &'static str,
    filters: Vec<Filter<T>>,
}

impl<T: 'static> FilterSet<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            filters: Vec::new(),
        }
    }

    pub fn with(mut self, filter: Filter<T>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn filters(&self) -> &[Filter<T>] {
        &self.filters
    }

    pub fn get(&self, name: &str) -> Option<&Filter<T>> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Narrow `base` by every filter with a usable value.
    ///
    /// A rejected value does not stop the other filters from applying; it is
    /// left out of the query and reported in `errors`.
    pub fn filter(&self, params: &QueryParams, base: Query<T>) -> FilterOutcome<T> {
        let mut query = base;
        let mut errors = Vec::new();
        let mut applied = 0;

        for filter in &self.filters {
            match filter.apply(params) {
                Applied::Unset => {}
                Applied::Narrow(predicate) => {
                    query = query.and(predicate);
                    applied += 1;
                }
                Applied::Invalid(message) => {
                    warn!(filter_set = self.name, field = %filter.name, %message, "ignoring filter value");
                    errors.push(FieldError {
                        field: filter.name.clone(),
                        message,
                    });
                }
            }
        }

        debug!(filter_set = self.name, applied, rejected = errors.len(), "filters applied");
        FilterOutcome { query, errors }
    }

    /// True when any filter parameter carries a value.
    pub fn is_filtering(&self, params: &QueryParams) -> bool {
        self.filters
            .iter()
            .flat_map(|f| f.param_names())
            .any(|name| params.value(&name).is_some())
    }

    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.filters.iter().map(Filter::descriptor).collect()
    }
}

// ── Report definitions ────────────────────────────────────────────────────────

/// Builds the report filter sets from the current users, workflows and
/// registered actions.
#[derive(Clone)]
pub struct ReportFilters {
    users: Arc<dyn UserDirectory>,
    catalog: Arc<dyn WorkflowCatalog>,
    registry: Arc<LogActionRegistry>,
}

impl ReportFilters {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        catalog: Arc<dyn WorkflowCatalog>,
        registry: Arc<LogActionRegistry>,
    ) -> Self {
        Self {
            users,
            catalog,
            registry,
        }
    }

    /// Locked pages: who locked them, when, and whether they are live.
    pub fn locked_pages(&self) -> FilterSet<Page> {
        FilterSet::new("locked_pages")
            .with(Filter::model_choice("locked_by", "Locked by", self.user_options(), |p: &Page| {
                p.locked_by.map(|u| u.to_string())
            }))
            .with(Filter::date_range("locked_at", "Locked at", |p: &Page| p.locked_at))
            .with(Filter::boolean("live", "Live", |p: &Page| p.live))
    }

    pub fn workflow(&self) -> FilterSet<WorkflowState> {
        FilterSet::new("workflow")
            .with(Filter::model_choice(
                "workflow",
                labels::WORKFLOW,
                self.workflow_options(),
                |s: &WorkflowState| Some(s.workflow_id.0.to_string()),
            ))
            .with(Filter::choice(
                "status",
                "Status",
                WorkflowStatus::ALL
                    .iter()
                    .map(|s| FilterOption::new(s.value(), s.label()))
                    .collect(),
                |s: &WorkflowState| Some(s.status.value().to_string()),
            ))
            .with(Filter::date_range("created_at", labels::STARTED_AT, |s: &WorkflowState| {
                Some(s.created_at)
            }))
    }

    /// Workflow tasks. The task select depends on the workflow select: each
    /// task option lists the workflows it belongs to.
    pub fn workflow_tasks(&self) -> WagtailResult<FilterSet<TaskState>> {
        let accessor = FilterAccessor::<Task>::named("get_workflows", Arc::clone(&self.catalog))?;
        let tasks = self.catalog.tasks();

        Ok(FilterSet::new("workflow_tasks")
            .with(Filter::model_choice(
                "workflow",
                labels::WORKFLOW,
                self.workflow_options(),
                |s: &TaskState| Some(s.workflow_id.0.to_string()),
            ))
            .with(Filter::filtered_model_choice(
                "task",
                "Task",
                &tasks,
                |t: &Task| FilterOption::new(t.id.0.to_string(), t.name.clone()),
                &accessor,
                "id_workflow",
                |s: &TaskState| Some(s.task_id.0.to_string()),
            ))
            .with(Filter::choice(
                "status",
                "Status",
                TaskStatus::ALL
                    .iter()
                    .map(|s| FilterOption::new(s.value(), s.label()))
                    .collect(),
                |s: &TaskState| Some(s.status.value().to_string()),
            ))
            .with(Filter::date_range("started_at", labels::STARTED_AT, |s: &TaskState| {
                Some(s.started_at)
            }))
            .with(Filter::date_range("finished_at", labels::COMPLETED_AT, |s: &TaskState| {
                s.finished_at
            })))
    }

    /// Site history over the audit log. Action choices come from the
    /// registry, so the first call triggers its scan.
    pub fn site_history(&self) -> FilterSet<LogEntry> {
        let actions = self
            .registry
            .get_choices()
            .into_iter()
            .map(|(action, label)| FilterOption::new(action, label))
            .collect();

        FilterSet::new("site_history")
            .with(Filter::text("object_title", labels::TITLE, |e: &LogEntry| e.object_title.clone()))
            .with(Filter::choice("action", "Action", actions, |e: &LogEntry| Some(e.action.clone())))
            .with(Filter::model_choice("user", "User", self.user_options(), |e: &LogEntry| {
                e.user_id.map(|u| u.to_string())
            }))
            .with(Filter::date_range("timestamp", "Timestamp", |e: &LogEntry| Some(e.timestamp)))
    }

    fn user_options(&self) -> Vec<FilterOption> {
        self.users
            .users()
            .into_iter()
            .map(|u| FilterOption::new(u.id.to_string(), u.username))
            .collect()
    }

    fn workflow_options(&self) -> Vec<FilterOption> {
        self.catalog
            .workflows()
            .into_iter()
            .map(|w| FilterOption::new(w.id.0.to_string(), w.name))
            .collect()
    }
}
