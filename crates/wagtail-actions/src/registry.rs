//! The log action registry.
//!
//! Actions are namespaced identifiers such as `wagtail.publish`. Each one
//! has a label (shown in filter choices) and a message (shown in history
//! listings), where the message is either fixed text or a formatter over the
//! entry's payload.
//!
//! Callbacks are registered under the `register_log_actions` hook name
//! during start-up. The registry runs them on first use, once, and keeps the
//! result for the life of the process:
//!
//! 1. `get_actions`, `get_choices` or `get_messages` is called.
//! 2. If the scan latch is unset, take the write lock, run every hook
//!    against the action table, set the latch.
//! 3. Answer from the table.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde_json::Value;
use tracing::{debug, info};

use wagtail_contracts::{error::WagtailResult, log_entry::LogEntry};

/// Hook name the registry collects callbacks from.
pub const REGISTER_LOG_ACTIONS: &str = "register_log_actions";

/// Builds a message from an entry's payload.
pub type MessageFormatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// A callback that registers actions.
pub type LogActionHook = Arc<dyn Fn(&mut LogActions) + Send + Sync>;

/// The history message for an action.
#[derive(Clone)]
pub enum LogMessage {
    Text(String),
    Format(MessageFormatter),
}

impl LogMessage {
    /// Wrap a payload formatter.
    pub fn format<F>(f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        LogMessage::Format(Arc::new(f))
    }

    pub fn render(&self, data: &Value) -> String {
        match self {
            LogMessage::Text(text) => text.clone(),
            LogMessage::Format(f) => f(data),
        }
    }
}

impl fmt::Debug for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMessage::Text(text) => f.debug_tuple("Text").field(text).finish(),
            LogMessage::Format(_) => f.write_str("Format(..)"),
        }
    }
}

impl From<&str> for LogMessage {
    fn from(text: &str) -> Self {
        LogMessage::Text(text.to_string())
    }
}

impl From<String> for LogMessage {
    fn from(text: String) -> Self {
        LogMessage::Text(text)
    }
}

/// The action table hooks write into.
///
/// `actions`, `choices` and `messages` are always updated together.
/// Registering an action twice overwrites its label and message but appends
/// a second choice, so the choice list can contain the same action twice.
#[derive(Debug, Clone, Default)]
pub struct LogActions {
    actions: HashMap<String, (String, LogMessage)>,
    choices: Vec<(String, String)>,
    messages: HashMap<String, LogMessage>,
}

impl LogActions {
    pub fn register_action(
        &mut self,
        action: impl Into<String>,
        label: impl Into<String>,
        message: impl Into<LogMessage>,
    ) {
        let action = action.into();
        let label = label.into();
        let message = message.into();

        debug!(action = %action, label = %label, "registering log action");
        self.actions.insert(action.clone(), (label.clone(), message.clone()));
        self.messages.insert(action.clone(), message);
        self.choices.push((action, label));
    }

    pub fn actions(&self) -> &HashMap<String, (String, LogMessage)> {
        &self.actions
    }

    /// `(action, label)` pairs in registration order.
    pub fn choices(&self) -> &[(String, String)] {
        &self.choices
    }

    pub fn messages(&self) -> &HashMap<String, LogMessage> {
        &self.messages
    }

    pub fn label(&self, action: &str) -> Option<&str> {
        self.actions.get(action).map(|(label, _)| label.as_str())
    }
}

/// Callbacks keyed by hook name, registered explicitly at start-up.
#[derive(Default, Clone)]
pub struct Hooks {
    hooks: HashMap<String, Vec<LogActionHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `hook` under `name`. Hooks run in registration order.
    pub fn register<F>(&mut self, name: &str, hook: F)
    where
        F: Fn(&mut LogActions) + Send + Sync + 'static,
    {
        self.register_hook(name, Arc::new(hook));
    }

    /// Add an already shared hook under `name`.
    pub fn register_hook(&mut self, name: &str, hook: LogActionHook) {
        self.hooks.entry(name.to_string()).or_default().push(hook);
    }

    pub fn get_hooks(&self, name: &str) -> &[LogActionHook] {
        self.hooks.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

struct RegistryState {
    scanned: bool,
    actions: LogActions,
}

/// Process-scoped registry of log actions.
///
/// Construct once at start-up and share it (e.g. behind an `Arc`) with the
/// reports and history views that need labels and messages.
pub struct LogActionRegistry {
    hooks: Vec<LogActionHook>,
    state: RwLock<RegistryState>,
}

impl LogActionRegistry {
    /// Create a registry that will scan the `register_log_actions` hooks.
    pub fn new(hooks: &Hooks) -> Self {
        Self {
            hooks: hooks.get_hooks(REGISTER_LOG_ACTIONS).to_vec(),
            state: RwLock::new(RegistryState {
                scanned: false,
                actions: LogActions::default(),
            }),
        }
    }

    /// Run the hooks if they have not run yet.
    ///
    /// The latch is checked again under the write lock, so two first callers
    /// racing each other still run the hooks once.
    pub fn scan_for_actions(&self) {
        if self.read().scanned {
            return;
        }

        let mut state = self.write();
        if state.scanned {
            return;
        }
        for hook in &self.hooks {
            hook(&mut state.actions);
        }
        state.scanned = true;

        info!(
            hooks = self.hooks.len(),
            actions = state.actions.actions.len(),
            "log actions scanned"
        );
    }

    pub fn is_scanned(&self) -> bool {
        self.read().scanned
    }

    /// Register an action directly, without triggering a scan.
    pub fn register_action(
        &self,
        action: impl Into<String>,
        label: impl Into<String>,
        message: impl Into<LogMessage>,
    ) {
        self.write().actions.register_action(action, label, message);
    }

    pub fn get_actions(&self) -> HashMap<String, (String, LogMessage)> {
        self.with_actions(|actions| actions.actions().clone())
    }

    pub fn get_choices(&self) -> Vec<(String, String)> {
        self.with_actions(|actions| actions.choices().to_vec())
    }

    pub fn get_messages(&self) -> HashMap<String, LogMessage> {
        self.with_actions(|actions| actions.messages().clone())
    }

    /// Label for `action`, if registered.
    pub fn get_label(&self, action: &str) -> Option<String> {
        self.with_actions(|actions| actions.label(action).map(str::to_string))
    }

    /// The history message for `entry`, or `None` when its action is not
    /// registered. Fails only if a formatter needs a payload that cannot be
    /// parsed.
    pub fn format_message(&self, entry: &LogEntry) -> WagtailResult<Option<String>> {
        let message = self.with_actions(|actions| actions.messages().get(&entry.action).cloned());
        match message {
            Some(LogMessage::Text(text)) => Ok(Some(text)),
            Some(LogMessage::Format(f)) => Ok(Some(f(entry.data()?))),
            None => Ok(None),
        }
    }

    /// Borrow the scanned action table.
    pub fn with_actions<R>(&self, f: impl FnOnce(&LogActions) -> R) -> R {
        self.scan_for_actions();
        f(&self.read().actions)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
