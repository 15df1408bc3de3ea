//! Moderation workflows, their tasks, and the per-page state records the
//! workflow reports list.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::site::PageId;

/// Primary key of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub i64);

/// Primary key of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

/// A named sequence of moderation tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A moderation step that may belong to several workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Workflows this task is part of, as loaded by the persistence layer.
    #[serde(default)]
    pub workflows: Vec<WorkflowId>,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Status of a page's run through a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    InProgress,
    Approved,
    NeedsChanges,
    Cancelled,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 4] = [
        WorkflowStatus::InProgress,
        WorkflowStatus::Approved,
        WorkflowStatus::NeedsChanges,
        WorkflowStatus::Cancelled,
    ];

    /// The stored value, also used as the query parameter value.
    pub fn value(self) -> &'static str {
        match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::NeedsChanges => "needs_changes",
            WorkflowStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkflowStatus::InProgress => "In progress",
            WorkflowStatus::Approved => "Approved",
            WorkflowStatus::NeedsChanges => "Needs changes",
            WorkflowStatus::Cancelled => "Cancelled",
        }
    }
}

/// Status of a single task within a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    InProgress,
    Approved,
    Rejected,
    Skipped,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::InProgress,
        TaskStatus::Approved,
        TaskStatus::Rejected,
        TaskStatus::Skipped,
        TaskStatus::Cancelled,
    ];

    pub fn value(self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::InProgress => "In progress",
            TaskStatus::Approved => "Approved",
            TaskStatus::Rejected => "Rejected",
            TaskStatus::Skipped => "Skipped",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

/// One page's run through a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: i64,
    pub page_id: PageId,
    pub workflow_id: WorkflowId,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
}

/// One task's progress within a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    pub id: i64,
    pub workflow_state_id: i64,
    /// Workflow of the owning workflow state, joined in by the store.
    pub workflow_id: WorkflowId,
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}
