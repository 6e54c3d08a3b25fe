//! Settings loading and validation
//!
//! Built-in defaults are overlaid with an optional settings file. Missing
//! keys in the file keep their defaults through serde.

use super::schema::Settings;
use crate::error::{BootstrapError, Result};
use std::path::Path;

/// Settings loader
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let settings = match path {
            Some(path) => Self::load_file(path)?,
            None => Self::load_defaults(),
        };
        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a file
    pub fn load_file(path: &Path) -> Result<Settings> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| BootstrapError::ReadInput {
                what: "settings file",
                path: path.to_path_buf(),
                source,
            })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            BootstrapError::InvalidSettings(format!(
                "failed to parse {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load default settings
    pub fn load_defaults() -> Settings {
        super::defaults::default_settings()
    }

    /// Reject values that would produce broken objects or a wait that never polls
    pub fn validate(settings: &Settings) -> Result<()> {
        let gitops = &settings.gitops;
        for (key, value) in [
            ("gitops.name", &gitops.name),
            ("gitops.namespace", &gitops.namespace),
            ("gitops.url", &gitops.url),
            ("gitops.branch", &gitops.branch),
            ("gitops.path", &gitops.path),
            ("gitops.interval", &gitops.interval),
            ("apply.fieldManager", &settings.apply.field_manager),
        ] {
            if value.trim().is_empty() {
                return Err(BootstrapError::InvalidSettings(format!(
                    "{} must not be empty",
                    key
                )));
            }
        }

        let wait = &settings.wait;
        if wait.poll_interval_seconds == 0 {
            return Err(BootstrapError::InvalidSettings(
                "wait.pollIntervalSeconds must be greater than 0".to_string(),
            ));
        }
        if wait.poll_interval_seconds > wait.timeout_seconds {
            return Err(BootstrapError::InvalidSettings(format!(
                "wait.pollIntervalSeconds ({}) must not exceed wait.timeoutSeconds ({})",
                wait.poll_interval_seconds, wait.timeout_seconds
            )));
        }

        Ok(())
    }
}
