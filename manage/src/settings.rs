//! Settings file.
//!
//! ```toml
//! log_level = "info"
//!
//! [database]
//! dir = "data"
//! ```
//!
//! A relative `database.dir` is resolved against the directory holding the
//! settings file, not the working directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use wagtail_contracts::error::{WagtailError, WagtailResult};

/// Settings path used when neither `--settings` nor `WAGTAIL_SETTINGS` is given.
pub const DEFAULT_SETTINGS: &str = "wagtail.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,

    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn from_toml_str(s: &str) -> WagtailResult<Self> {
        toml::from_str(s).map_err(|e| WagtailError::Config {
            reason: format!("failed to parse settings TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> WagtailResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WagtailError::Config {
            reason: format!("failed to read settings file '{}': {}", path.display(), e),
        })?;
        let mut settings = Self::from_toml_str(&contents)?;

        if settings.database.dir.is_relative() {
            if let Some(base) = path.parent() {
                settings.database.dir = base.join(&settings.database.dir);
            }
        }
        Ok(settings)
    }
}
