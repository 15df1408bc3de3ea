//! # wagtail-actions
//!
//! Labels and messages for audit log actions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wagtail_actions::{builtin, Hooks, LogActionRegistry, REGISTER_LOG_ACTIONS};
//!
//! let mut hooks = Hooks::new();
//! builtin::install(&mut hooks);
//! hooks.register(REGISTER_LOG_ACTIONS, |actions| {
//!     actions.register_action("blog.feature", "Feature", "Featured");
//! });
//!
//! let registry = LogActionRegistry::new(&hooks);
//! let choices = registry.get_choices();
//! ```

pub mod builtin;
pub mod config;
pub mod registry;

pub use config::{ActionConfig, ActionDeclaration};
pub use registry::{
    Hooks, LogActionHook, LogActionRegistry, LogActions, LogMessage, MessageFormatter,
    REGISTER_LOG_ACTIONS,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use chrono::Utc;
    use serde_json::json;

    use wagtail_contracts::{
        error::WagtailError,
        log_entry::{LogEntry, LogFlags, NewLogEntry},
    };

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn entry(action: &str, data_json: &str) -> LogEntry {
        LogEntry::from_new(
            1,
            NewLogEntry {
                content_type: None,
                object_id: "1".to_string(),
                object_title: "Home".to_string(),
                action: action.to_string(),
                data_json: data_json.to_string(),
                timestamp: Utc::now(),
                user_id: None,
                revision_id: None,
                flags: LogFlags::default(),
            },
        )
    }

    fn registry_with(register: impl Fn(&mut LogActions) + Send + Sync + 'static) -> LogActionRegistry {
        let mut hooks = Hooks::new();
        hooks.register(REGISTER_LOG_ACTIONS, register);
        LogActionRegistry::new(&hooks)
    }

    // ── Registration ──────────────────────────────────────────────────────────

    #[test]
    fn choices_keep_duplicate_registrations() {
        let registry = registry_with(|actions| {
            actions.register_action("test.a", "First", "A");
            actions.register_action("test.b", "B", "B");
            actions.register_action("test.a", "Second", "A again");
        });

        let choices = registry.get_choices();
        assert_eq!(choices.len(), 3);
        assert_eq!(choices[0], ("test.a".to_string(), "First".to_string()));
        assert_eq!(choices[2], ("test.a".to_string(), "Second".to_string()));

        // The table itself keeps the last registration.
        assert_eq!(registry.get_actions().len(), 2);
        assert_eq!(registry.get_label("test.a").as_deref(), Some("Second"));
    }

    #[test]
    fn actions_do_not_depend_on_hook_order() {
        let first = |actions: &mut LogActions| actions.register_action("test.one", "One", "1");
        let second = |actions: &mut LogActions| actions.register_action("test.two", "Two", "2");

        let mut forward = Hooks::new();
        forward.register(REGISTER_LOG_ACTIONS, first);
        forward.register(REGISTER_LOG_ACTIONS, second);
        let mut backward = Hooks::new();
        backward.register(REGISTER_LOG_ACTIONS, second);
        backward.register(REGISTER_LOG_ACTIONS, first);

        let mut a: Vec<String> = LogActionRegistry::new(&forward).get_actions().into_keys().collect();
        let mut b: Vec<String> = LogActionRegistry::new(&backward).get_actions().into_keys().collect();
        a.sort();
        b.sort();
        assert_eq!(a, vec!["test.one", "test.two"]);
        assert_eq!(a, b);
    }

    #[test]
    fn hooks_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = registry_with(move |actions| {
            counter.fetch_add(1, Ordering::SeqCst);
            actions.register_action("test.a", "A", "A");
        });

        assert!(!registry.is_scanned());
        registry.get_actions();
        registry.get_choices();
        registry.get_messages();
        assert!(registry.is_scanned());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.get_choices().len(), 1);
    }

    #[test]
    fn concurrent_first_calls_scan_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = Arc::new(registry_with(move |actions| {
            counter.fetch_add(1, Ordering::SeqCst);
            actions.register_action("test.a", "A", "A");
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_choices().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hooks_under_other_names_are_ignored() {
        let mut hooks = Hooks::new();
        hooks.register("register_admin_menu_item", |actions: &mut LogActions| {
            actions.register_action("test.menu", "Menu", "Menu")
        });
        let registry = LogActionRegistry::new(&hooks);
        assert!(registry.get_actions().is_empty());
    }

    #[test]
    fn direct_registration_does_not_scan() {
        let registry = registry_with(|actions| actions.register_action("test.hook", "Hook", "Hook"));
        registry.register_action("test.direct", "Direct", "Direct");
        assert!(!registry.is_scanned());

        let actions = registry.get_actions();
        assert!(actions.contains_key("test.direct"));
        assert!(actions.contains_key("test.hook"));
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    #[test]
    fn messages_are_keyed_by_action() {
        let registry = registry_with(|actions| {
            actions.register_action("test.a", "A", "Did A");
            actions.register_action("test.b", "B", LogMessage::format(|_| "Did B".to_string()));
        });

        let messages = registry.get_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages["test.a"].render(&json!({})), "Did A");
        assert_eq!(messages["test.b"].render(&json!({})), "Did B");
    }

    #[test]
    fn format_message_renders_from_payload() {
        let registry = registry_with(|actions| {
            actions.register_action(
                "test.rename",
                "Rename",
                LogMessage::format(|data| format!("now {}", data["title"].as_str().unwrap_or("?"))),
            );
            actions.register_action("test.static", "Static", "Static text");
        });

        let renamed = entry("test.rename", r#"{"title":"New"}"#);
        assert_eq!(registry.format_message(&renamed).unwrap().as_deref(), Some("now New"));

        // Static messages never touch the payload.
        let fixed = entry("test.static", "not json");
        assert_eq!(registry.format_message(&fixed).unwrap().as_deref(), Some("Static text"));

        assert_eq!(registry.format_message(&entry("test.unknown", "")).unwrap(), None);
    }

    #[test]
    fn format_message_reports_bad_payload() {
        let registry = registry_with(|actions| {
            actions.register_action("test.rename", "Rename", LogMessage::format(|_| String::new()))
        });
        let err = registry.format_message(&entry("test.rename", "{oops")).unwrap_err();
        assert!(matches!(err, WagtailError::InvalidPayload { .. }));
    }

    // ── Built-in actions ──────────────────────────────────────────────────────

    #[test]
    fn core_actions_are_registered() {
        let mut hooks = Hooks::new();
        builtin::install(&mut hooks);
        let registry = LogActionRegistry::new(&hooks);

        let actions = registry.get_actions();
        for action in [
            "wagtail.create",
            "wagtail.edit",
            "wagtail.publish",
            "wagtail.unpublish",
            "wagtail.lock",
            "wagtail.rename",
            "wagtail.view_restriction.delete",
            "wagtail.workflow.cancel",
        ] {
            assert!(actions.contains_key(action), "missing {action}");
        }
        assert_eq!(registry.get_label("wagtail.edit").as_deref(), Some("Save draft"));
        assert_eq!(registry.get_choices().len(), actions.len());
    }

    #[test]
    fn core_messages_read_the_payload() {
        let mut hooks = Hooks::new();
        builtin::install(&mut hooks);
        let registry = LogActionRegistry::new(&hooks);

        let rename = entry("wagtail.rename", r#"{"title":{"old":"Old","new":"New"}}"#);
        assert_eq!(
            registry.format_message(&rename).unwrap().as_deref(),
            Some("Renamed from 'Old' to 'New'")
        );

        let restriction = entry("wagtail.view_restriction.create", r#"{"restriction":{"title":"Password"}}"#);
        assert_eq!(
            registry.format_message(&restriction).unwrap().as_deref(),
            Some("Added the 'Password' view restriction")
        );

        let published = entry("wagtail.publish", "");
        assert_eq!(registry.format_message(&published).unwrap().as_deref(), Some("Published"));
    }

    #[test]
    fn core_messages_tolerate_missing_keys() {
        let mut hooks = Hooks::new();
        builtin::install(&mut hooks);
        let registry = LogActionRegistry::new(&hooks);

        let moved = entry("wagtail.move", "");
        assert_eq!(registry.format_message(&moved).unwrap().as_deref(), Some("Moved from '' to ''"));
        assert_eq!(builtin::text_at(&json!({"a": 1}), &["a", "b"]), "");
    }

    // ── TOML declarations ─────────────────────────────────────────────────────

    #[test]
    fn toml_declarations_become_a_hook() {
        let config = ActionConfig::from_toml_str(
            r#"
            [[actions]]
            action = "blog.feature"
            label = "Feature"
            message = "Featured on the home page"

            [[actions]]
            action = "blog.unfeature"
            label = "Unfeature"
            message = "Removed from the home page"
            "#,
        )
        .unwrap();
        assert_eq!(config.actions.len(), 2);

        let mut hooks = Hooks::new();
        hooks.register_hook(REGISTER_LOG_ACTIONS, config.into_hook());
        let registry = LogActionRegistry::new(&hooks);

        let choices = registry.get_choices();
        assert_eq!(choices[0].0, "blog.feature");
        assert_eq!(choices[1].1, "Unfeature");
        assert_eq!(
            registry.format_message(&entry("blog.feature", "")).unwrap().as_deref(),
            Some("Featured on the home page")
        );
    }

    #[test]
    fn empty_toml_declares_nothing() {
        let config = ActionConfig::from_toml_str("").unwrap();
        assert!(config.actions.is_empty());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = ActionConfig::from_toml_str("[[actions]]\naction = \"x\"").unwrap_err();
        assert!(matches!(err, WagtailError::Config { .. }));

        let err = ActionConfig::from_toml_str(
            "[[actions]]\naction = \"  \"\nlabel = \"L\"\nmessage = \"M\"",
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty action"));
    }

    #[test]
    fn missing_action_file_is_a_config_error() {
        let err = ActionConfig::from_file(std::path::Path::new("/nonexistent/actions.toml")).unwrap_err();
        assert!(matches!(err, WagtailError::Config { .. }));
    }
}
