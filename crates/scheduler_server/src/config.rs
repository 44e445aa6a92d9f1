//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve listen port, database file, static web root and logging settings.
//!
//! # Invariants
//! - Blank variables behave like unset ones.
//! - The server always binds to loopback.

use scheduler_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const PORT_ENV: &str = "TODO_PORT";
pub const DB_FILE_ENV: &str = "TODO_DBFILE";
pub const WEB_DIR_ENV: &str = "TODO_WEB_DIR";
pub const LOG_DIR_ENV: &str = "TODO_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "TODO_LOG_LEVEL";

const DEFAULT_PORT: u16 = 7540;
const BIND_HOST: &str = "127.0.0.1";
const DEFAULT_DB_FILE_NAME: &str = "scheduler.db";
const DEFAULT_WEB_DIR: &str = "./web";
const DEFAULT_LOG_DIR_NAME: &str = "scheduler-logs";

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `TODO_PORT` is not a port number.
    InvalidPort(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPort(raw) => write!(f, "{PORT_ENV} must be a port number, got `{raw}`"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub web_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl ServerConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for missing
    /// or blank values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            db_path: read(DB_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            web_dir: read(WEB_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_DIR)),
            log_dir: read(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
        })
    }

    /// Loopback `host:port` the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{BIND_HOST}:{}", self.port)
    }
}

/// `scheduler.db` next to the running executable, or in the working
/// directory when the executable path is unknown.
fn default_db_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DB_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME))
}
