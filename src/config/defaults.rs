//! Default settings values

use super::schema::Settings;

/// Get the default settings
pub fn default_settings() -> Settings {
    Settings::default()
}
