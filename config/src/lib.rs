//! Console configuration.
//!
//! Resolution order, later wins:
//! 1. Built-in defaults (read-only, local bridge).
//! 2. `~/.towerlink/config.toml`, or the file named by `TOWERLINK_CONFIG`.
//! 3. `TOWERLINK_WS_URL`, `TOWERLINK_API_URL`, `TOWERLINK_READ_ONLY`.
//!
//! The file format is private to this crate; callers only ever see a
//! validated [`ConsoleConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const ENV_CONFIG_PATH: &str = "TOWERLINK_CONFIG";
pub const ENV_TELEMETRY_URL: &str = "TOWERLINK_WS_URL";
pub const ENV_API_URL: &str = "TOWERLINK_API_URL";
pub const ENV_READ_ONLY: &str = "TOWERLINK_READ_ONLY";

const DEFAULT_TELEMETRY_URL: &str = "ws://localhost/ws";
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_RECONNECT_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONFIRMATION_FRAMES: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{field}: '{value}' is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        source: url::ParseError,
    },
    #[error("{field}: scheme '{scheme}' is not one of {expected}")]
    UnsupportedScheme {
        field: &'static str,
        scheme: String,
        expected: &'static str,
    },
    #[error("{field}: invalid value '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

impl ConfigError {
    /// The config file involved, if the error came from reading it.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Validated console configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Telemetry stream, `ws://` or `wss://`.
    pub telemetry_url: Url,
    /// Control API base, `http://` or `https://`.
    pub api_url: Url,
    /// Blocks every mutating command. Fixed for the life of a session.
    pub read_only: bool,
    pub reconnect_interval: Duration,
    pub request_timeout: Duration,
    /// Frames to wait for a command's effect before calling it lost.
    pub confirmation_window: u32,
    /// Poll `/api/status` at this interval while the stream is down.
    pub poll_interval: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    endpoints: Option<RawEndpoints>,
    session: Option<RawSession>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEndpoints {
    telemetry: Option<String>,
    api: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSession {
    read_only: Option<bool>,
    reconnect_interval_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    confirmation_frames: Option<u32>,
    poll_interval_ms: Option<u64>,
}

impl ConsoleConfig {
    /// Load from the default location and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .or_else(config_path);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load from `path` (if it exists) with overrides read through `env`.
    pub fn load_with(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = match path {
            Some(path) if path.exists() => read_raw(path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "No config file; using defaults");
                RawConfig::default()
            }
            None => RawConfig::default(),
        };
        resolve(raw, &env)
    }

    /// Parse a config document with no environment overrides.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        resolve(raw, &|_| None)
    }
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("Failed to read config at {:?}: {}", path, err);
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    match toml::from_str(&content) {
        Ok(raw) => Ok(raw),
        Err(err) => {
            tracing::warn!("Failed to parse config at {:?}: {}", path, err);
            Err(ConfigError::Parse {
                path: path.to_path_buf(),
                source: err,
            })
        }
    }
}

fn resolve(
    raw: RawConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ConsoleConfig, ConfigError> {
    let endpoints = raw.endpoints.unwrap_or_default();
    let session = raw.session.unwrap_or_default();

    let telemetry_url = env(ENV_TELEMETRY_URL)
        .or(endpoints.telemetry)
        .unwrap_or_else(|| DEFAULT_TELEMETRY_URL.to_string());
    let telemetry_url = parse_url("telemetry", &telemetry_url, &["ws", "wss"])?;
    let api_url = env(ENV_API_URL)
        .or(endpoints.api)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_url = parse_url("api", &api_url, &["http", "https"])?;
    // Fail closed.
    let read_only = match env(ENV_READ_ONLY) {
        Some(value) => parse_flag(ENV_READ_ONLY, &value)?,
        None => session.read_only.unwrap_or(true),
    };

    let reconnect_interval = match session.reconnect_interval_ms {
        Some(0) => {
            return Err(ConfigError::InvalidValue {
                field: "reconnect_interval_ms",
                value: "0".to_string(),
            });
        }
        Some(ms) => Duration::from_millis(ms),
        None => Duration::from_millis(DEFAULT_RECONNECT_MS),
    };
    let request_timeout = session
        .request_timeout_secs
        .map_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS), Duration::from_secs);
    let confirmation_window = match session.confirmation_frames {
        Some(0) => {
            return Err(ConfigError::InvalidValue {
                field: "confirmation_frames",
                value: "0".to_string(),
            });
        }
        Some(frames) => frames,
        None => DEFAULT_CONFIRMATION_FRAMES,
    };
    let poll_interval = session
        .poll_interval_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);

    if !read_only {
        tracing::warn!("Read-only gate disabled; plant commands will be dispatched");
    }

    Ok(ConsoleConfig {
        telemetry_url,
        api_url,
        read_only,
        reconnect_interval,
        request_timeout,
        confirmation_window,
        poll_interval,
    })
}

fn parse_url(
    field: &'static str,
    value: &str,
    schemes: &'static [&'static str],
) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
            expected: if schemes[0] == "ws" { "ws, wss" } else { "http, https" },
        });
    }
    Ok(url)
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".towerlink").join("config.toml"))
}
