//! Host configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use routeguard_observability::LogFormat;

use crate::RevalidatePolicy;

pub const ENV_ROUTES: &str = "ROUTEGUARD_ROUTES";
pub const ENV_FETCH_TIMEOUT_MS: &str = "ROUTEGUARD_FETCH_TIMEOUT_MS";
pub const ENV_REVALIDATE_ON_FOCUS: &str = "ROUTEGUARD_REVALIDATE_ON_FOCUS";
pub const ENV_REVALIDATE_INTERVAL_SECS: &str = "ROUTEGUARD_REVALIDATE_INTERVAL_SECS";
pub const ENV_LOG_FORMAT: &str = "ROUTEGUARD_LOG_FORMAT";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// JSON route tree to load; the built-in tree is used when unset.
    pub routes_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub revalidate: RevalidatePolicy,
    pub log_format: LogFormat,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            routes_path: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            revalidate: RevalidatePolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_ROUTES) {
            config.routes_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = get(ENV_FETCH_TIMEOUT_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_FETCH_TIMEOUT_MS, "millisecond count", &raw))?;
            config.fetch_timeout = Duration::from_millis(ms);
        }

        if let Some(raw) = get(ENV_REVALIDATE_ON_FOCUS) {
            config.revalidate.on_focus =
                parse_bool(&raw).ok_or_else(|| invalid(ENV_REVALIDATE_ON_FOCUS, "boolean", &raw))?;
        }

        if let Some(raw) = get(ENV_REVALIDATE_INTERVAL_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_REVALIDATE_INTERVAL_SECS, "second count", &raw))?;
            config.revalidate.interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = get(ENV_LOG_FORMAT) {
            config.log_format = raw
                .parse()
                .map_err(|_| invalid(ENV_LOG_FORMAT, "log format", &raw))?;
        }

        Ok(config)
    }
}

fn invalid(var: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
