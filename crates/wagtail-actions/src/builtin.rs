//! The core page actions.
//!
//! `register_core_log_actions` is the hook the admin installs for its own
//! actions. Messages for actions that carry a payload read it with
//! `text_at`; a missing key renders as an empty string rather than failing
//! the whole history listing.

use serde_json::Value;

use crate::registry::{Hooks, LogActions, LogMessage, REGISTER_LOG_ACTIONS};

/// Actions whose message does not depend on the payload.
const STATIC_ACTIONS: &[(&str, &str, &str)] = &[
    ("wagtail.create", "Create", "Created"),
    ("wagtail.edit", "Save draft", "Draft saved"),
    ("wagtail.delete", "Delete", "Deleted"),
    ("wagtail.publish", "Publish", "Published"),
    ("wagtail.publish.scheduled", "Publish scheduled draft", "Published scheduled draft"),
    ("wagtail.unpublish", "Unpublish", "Unpublished"),
    ("wagtail.unpublish.scheduled", "Unpublish scheduled draft", "Unpublished scheduled draft"),
    ("wagtail.lock", "Lock", "Locked"),
    ("wagtail.unlock", "Unlock", "Unlocked"),
    ("wagtail.moderation.approve", "Approve", "Approved"),
    ("wagtail.moderation.reject", "Reject", "Rejected"),
];

/// String at `path` inside `data`, or `""`.
pub fn text_at<'v>(data: &'v Value, path: &[&str]) -> &'v str {
    path.iter()
        .try_fold(data, |value, key| value.get(*key))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Install `register_core_log_actions` under the `register_log_actions` hook.
pub fn install(hooks: &mut Hooks) {
    hooks.register(REGISTER_LOG_ACTIONS, register_core_log_actions);
}

pub fn register_core_log_actions(actions: &mut LogActions) {
    for (action, label, message) in STATIC_ACTIONS {
        actions.register_action(*action, *label, *message);
    }

    actions.register_action(
        "wagtail.rename",
        "Rename",
        LogMessage::format(|data| {
            format!(
                "Renamed from '{}' to '{}'",
                text_at(data, &["title", "old"]),
                text_at(data, &["title", "new"])
            )
        }),
    );
    actions.register_action(
        "wagtail.revert",
        "Revert",
        LogMessage::format(|data| {
            let revision_id = data
                .get("revision")
                .and_then(|r| r.get("id"))
                .map(|id| id.to_string())
                .unwrap_or_default();
            format!(
                "Reverted to previous revision with id {} from {}",
                revision_id,
                text_at(data, &["revision", "created"])
            )
        }),
    );
    actions.register_action(
        "wagtail.copy",
        "Copy",
        LogMessage::format(|data| format!("Copied from {}", text_at(data, &["source", "title"]))),
    );
    actions.register_action(
        "wagtail.move",
        "Move",
        LogMessage::format(|data| {
            format!(
                "Moved from '{}' to '{}'",
                text_at(data, &["source", "title"]),
                text_at(data, &["destination", "title"])
            )
        }),
    );
    actions.register_action(
        "wagtail.reorder",
        "Reorder",
        LogMessage::format(|data| {
            format!("Reordered under '{}'", text_at(data, &["destination", "title"]))
        }),
    );

    for (verb, label, message) in [
        ("create", "Add view restrictions", "Added the '{}' view restriction"),
        ("edit", "Update view restrictions", "Updated the '{}' view restriction"),
        ("delete", "Remove view restrictions", "Removed the '{}' view restriction"),
    ] {
        actions.register_action(
            format!("wagtail.view_restriction.{verb}"),
            label,
            LogMessage::format(move |data| {
                message.replacen("{}", text_at(data, &["restriction", "title"]), 1)
            }),
        );
    }

    register_workflow_actions(actions);
}

fn register_workflow_actions(actions: &mut LogActions) {
    actions.register_action(
        "wagtail.workflow.start",
        "Workflow: start",
        LogMessage::format(|data| {
            format!(
                "'{}' started. Next step '{}'",
                text_at(data, &["workflow", "title"]),
                text_at(data, &["workflow", "next", "title"])
            )
        }),
    );
    actions.register_action(
        "wagtail.workflow.approve",
        "Workflow: approve task",
        LogMessage::format(|data| {
            let task = text_at(data, &["workflow", "task", "title"]);
            let next = text_at(data, &["workflow", "next", "title"]);
            if next.is_empty() {
                format!(
                    "Approved at '{}'. '{}' complete",
                    task,
                    text_at(data, &["workflow", "title"])
                )
            } else {
                format!("Approved at '{}'. Next step '{}'", task, next)
            }
        }),
    );
    actions.register_action(
        "wagtail.workflow.reject",
        "Workflow: reject task",
        LogMessage::format(|data| {
            format!(
                "Rejected at '{}'. Changes requested",
                text_at(data, &["workflow", "task", "title"])
            )
        }),
    );
    actions.register_action(
        "wagtail.workflow.resume",
        "Workflow: resume task",
        LogMessage::format(|data| {
            format!(
                "Resubmitted '{}'. Back to task '{}'",
                text_at(data, &["workflow", "title"]),
                text_at(data, &["workflow", "task", "title"])
            )
        }),
    );
    actions.register_action(
        "wagtail.workflow.cancel",
        "Workflow: cancel",
        LogMessage::format(|data| {
            format!(
                "Cancelled '{}' at '{}'",
                text_at(data, &["workflow", "title"]),
                text_at(data, &["workflow", "task", "title"])
            )
        }),
    );
}
