//! Configuration for the funnel pipeline and API server
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority, CARTFLOW_*)
//! 2. Config file (~/.config/cartflow/config.toml)
//! 3. Built-in defaults (lowest priority)
//!
//! The struct is passed explicitly to every entry point; nothing reads
//! paths from globals, and no directory is created until a run asks for it.

mod serialization;

#[cfg(test)]
mod tests;

use chrono::Duration;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─────────────────────────────────────────────────────────────────────────────
// Log Rotation
// ─────────────────────────────────────────────────────────────────────────────

/// Log file rotation strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogRotation {
    /// Rotate log files hourly
    Hourly,
    /// Rotate log files daily (default)
    #[default]
    Daily,
    /// Never rotate - single log file
    Never,
}

impl LogRotation {
    /// Parse rotation string from config
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "daily" => Self::Daily,
            "never" => Self::Never,
            _ => Self::Daily, // Default to daily for unknown values
        }
    }

    /// Convert to string for TOML serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Enable file logging (in addition to stdout)
    pub file_enabled: bool,
    /// Directory for log files
    pub file_dir: PathBuf,
    /// Log file rotation strategy
    pub file_rotation: LogRotation,
    /// Prefix for log file names (e.g., "cartflow" -> "cartflow.2024-01-15.log")
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false, // Opt-in feature
            file_dir: PathBuf::from("./logs"),
            file_rotation: LogRotation::Daily,
            file_prefix: "cartflow".to_string(),
        }
    }
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.file_dir),
            file_rotation: file
                .file_rotation
                .map(|s| LogRotation::from_str(&s))
                .unwrap_or(defaults.file_rotation),
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the raw event export
    pub data_dir: PathBuf,

    /// File name of the event export inside `data_dir`
    pub events_file: String,

    /// Directory artifacts are written to
    pub artifacts_dir: PathBuf,

    /// Inactivity gap in minutes that closes a session. The comparison is
    /// strictly-greater-than: a gap of exactly this many minutes does not
    /// start a new session.
    pub session_gap_minutes: i64,

    /// Address the API server binds to
    pub bind_addr: SocketAddr,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/raw"),
            events_file: "events.csv".to_string(),
            artifacts_dir: PathBuf::from("./artifacts"),
            session_gap_minutes: 30,
            bind_addr: "127.0.0.1:5501".parse().unwrap(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub data_dir: Option<String>,
    pub events_file: Option<String>,
    pub artifacts_dir: Option<String>,
    pub session_gap_minutes: Option<i64>,
    pub bind_addr: Option<String>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

impl Config {
    /// Path to the config file (~/.config/cartflow/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("cartflow").join("config.toml"))
    }

    /// Load configuration: env > file > defaults
    pub fn from_env() -> Self {
        let mut config = Self::from_file();

        if let Ok(v) = std::env::var("CARTFLOW_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CARTFLOW_EVENTS_FILE") {
            config.events_file = v;
        }
        if let Ok(v) = std::env::var("CARTFLOW_ARTIFACTS_DIR") {
            config.artifacts_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CARTFLOW_SESSION_GAP_MINUTES") {
            match v.parse() {
                Ok(minutes) => config.session_gap_minutes = minutes,
                Err(_) => eprintln!(
                    "Warning: invalid CARTFLOW_SESSION_GAP_MINUTES {:?}, keeping {}",
                    v, config.session_gap_minutes
                ),
            }
        }
        if let Ok(v) = std::env::var("CARTFLOW_BIND_ADDR") {
            match v.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => eprintln!(
                    "Warning: invalid CARTFLOW_BIND_ADDR {:?}, keeping {}",
                    v, config.bind_addr
                ),
            }
        }
        if let Ok(v) = std::env::var("CARTFLOW_LOG_LEVEL") {
            config.logging.level = v;
        }

        config
    }

    /// Load from the config file, falling back to defaults
    fn from_file() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str::<FileConfig>(&contents) {
            Ok(file) => Self::from_file_config(file),
            Err(e) => {
                eprintln!("Warning: could not parse {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub(crate) fn from_file_config(file: FileConfig) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: file
                .data_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            events_file: file.events_file.unwrap_or(defaults.events_file),
            artifacts_dir: file
                .artifacts_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.artifacts_dir),
            session_gap_minutes: file
                .session_gap_minutes
                .unwrap_or(defaults.session_gap_minutes),
            bind_addr: file
                .bind_addr
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bind_addr),
            logging: LoggingConfig::from_file(file.logging),
        }
    }

    /// Inactivity gap as a chrono Duration
    pub fn session_gap(&self) -> Duration {
        Duration::minutes(self.session_gap_minutes)
    }

    /// Full path to the raw event export
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(&self.events_file)
    }
}
