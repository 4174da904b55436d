/**
 * Server Configuration
 *
 * Loading and validation of server configuration from environment variables,
 * with defaults suitable for local development.
 *
 * # Variables
 *
 * | variable | default |
 * |---|---|
 * | `SERVER_PORT` | `18000` |
 * | `LOG_BACKEND` | `memory-list` (`memory-stream`, `sqlite`) |
 * | `DATABASE_URL` | `sqlite://talkroom.db?mode=rwc` |
 * | `LOG_MAX_LEN` | `5000` |
 * | `CATCH_UP_LIMIT` | `100` |
 * | `BROADCAST_WRITE_TIMEOUT_MS` | `2000` |
 * | `OUTBOUND_QUEUE` | `256` |
 * | `HANDSHAKE_TIMEOUT_MS` | `10000` |
 * | `ALLOWED_ORIGINS` | empty (all origins) |
 *
 * # Error Handling
 *
 * A variable that is set but cannot be parsed is a `ConfigError`; the server
 * refuses to start rather than silently falling back to the default.
 */

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::backend::chat::log::DEFAULT_MAX_LEN;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}: cannot parse '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Which message log backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogBackend {
    MemoryList,
    MemoryStream,
    Sqlite,
}

impl FromStr for LogBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory-list" | "memory" | "list" => Ok(Self::MemoryList),
            "memory-stream" | "stream" => Ok(Self::MemoryStream),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown log backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub log_backend: LogBackend,
    pub database_url: String,
    pub log_max_len: usize,
    pub catch_up_limit: usize,
    pub broadcast_write_timeout: Duration,
    pub outbound_queue: usize,
    pub handshake_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 18000,
            log_backend: LogBackend::MemoryList,
            database_url: "sqlite://talkroom.db?mode=rwc".to_string(),
            log_max_len: DEFAULT_MAX_LEN,
            catch_up_limit: 100,
            broadcast_write_timeout: Duration::from_millis(2000),
            outbound_queue: 256,
            handshake_timeout: Duration::from_millis(10_000),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            parse_var(&lookup, name, default.as_millis() as u64).map(Duration::from_millis)
        };

        let config = Self {
            port: parse_var(&lookup, "SERVER_PORT", defaults.port)?,
            log_backend: parse_var(&lookup, "LOG_BACKEND", defaults.log_backend)?,
            database_url: lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.database_url),
            log_max_len: parse_var(&lookup, "LOG_MAX_LEN", defaults.log_max_len)?,
            catch_up_limit: parse_var(&lookup, "CATCH_UP_LIMIT", defaults.catch_up_limit)?,
            broadcast_write_timeout: millis("BROADCAST_WRITE_TIMEOUT_MS", defaults.broadcast_write_timeout)?,
            outbound_queue: parse_var(&lookup, "OUTBOUND_QUEUE", defaults.outbound_queue)?,
            handshake_timeout: millis("HANDSHAKE_TIMEOUT_MS", defaults.handshake_timeout)?,
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("LOG_MAX_LEN", self.log_max_len),
            ("OUTBOUND_QUEUE", self.outbound_queue),
            ("BROADCAST_WRITE_TIMEOUT_MS", self.broadcast_write_timeout.as_millis() as usize),
            ("HANDSHAKE_TIMEOUT_MS", self.handshake_timeout.as_millis() as usize),
        ];
        match positive.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Zero { name: *name }),
            None => Ok(()),
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
