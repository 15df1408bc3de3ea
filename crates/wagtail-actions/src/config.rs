//! TOML action declarations.
//!
//! Sites can declare extra actions with fixed messages in a TOML file instead
//! of writing a hook:
//!
//! ```toml
//! [[actions]]
//! action = "blog.feature"
//! label = "Feature"
//! message = "Featured on the home page"
//! ```
//!
//! `ActionConfig::into_hook` turns the declarations into a hook that
//! registers them in file order.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use wagtail_contracts::error::{WagtailError, WagtailResult};

use crate::registry::{LogActionHook, LogActions};

/// One declared action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDeclaration {
    pub action: String,
    pub label: String,
    pub message: String,
}

/// The top-level structure deserialized from an action file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub actions: Vec<ActionDeclaration>,
}

impl ActionConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `WagtailError::Config` for malformed TOML, a missing field, or
    /// an action identifier that is empty.
    pub fn from_toml_str(s: &str) -> WagtailResult<Self> {
        let config: ActionConfig = toml::from_str(s).map_err(|e| WagtailError::Config {
            reason: format!("failed to parse log action TOML: {}", e),
        })?;

        if let Some(blank) = config.actions.iter().position(|d| d.action.trim().is_empty()) {
            return Err(WagtailError::Config {
                reason: format!("log action declaration {} has an empty action", blank + 1),
            });
        }
        Ok(config)
    }

    /// Read the file at `path` and parse it as action declarations.
    pub fn from_file(path: &Path) -> WagtailResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WagtailError::Config {
            reason: format!("failed to read log action file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn into_hook(self) -> LogActionHook {
        Arc::new(move |actions: &mut LogActions| {
            for declaration in &self.actions {
                actions.register_action(
                    declaration.action.clone(),
                    declaration.label.clone(),
                    declaration.message.as_str(),
                );
            }
        })
    }
}
