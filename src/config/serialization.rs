//! Config serialization to TOML
//!
//! Single source of truth for the config file format.

use super::Config;

impl Config {
    /// Render the config as a commented TOML template
    pub fn to_toml(&self) -> String {
        format!(
            r#"# cartflow configuration
# Precedence: environment variables (CARTFLOW_*) > this file > defaults

# Directory holding the raw event export
data_dir = {data_dir:?}

# File name of the event export inside data_dir
events_file = {events_file:?}

# Directory artifacts are written to (created on first run)
artifacts_dir = {artifacts_dir:?}

# Inactivity gap in minutes that closes a session.
# A gap of exactly this many minutes does NOT start a new session.
session_gap_minutes = {gap}

# Address the API server binds to
bind_addr = {bind_addr:?}

[logging]
# Log level: trace, debug, info, warn, error
level = {level:?}
# Write logs to rotating files in addition to stdout
file_enabled = {file_enabled}
file_dir = {file_dir:?}
# Rotation: hourly, daily, never
file_rotation = {rotation:?}
file_prefix = {prefix:?}
"#,
            data_dir = self.data_dir.display().to_string(),
            events_file = self.events_file,
            artifacts_dir = self.artifacts_dir.display().to_string(),
            gap = self.session_gap_minutes,
            bind_addr = self.bind_addr.to_string(),
            level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display().to_string(),
            rotation = self.logging.file_rotation.as_str(),
            prefix = self.logging.file_prefix,
        )
    }

    /// Write the template config file if none exists yet (helps users
    /// discover options)
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        if std::fs::write(&path, Self::default().to_toml()).is_ok() {
            eprintln!("Created config template at {}", path.display());
        }
    }
}
