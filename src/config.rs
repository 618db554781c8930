//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_API_HOST: &str = "https://api.charlieop.com";
pub const API_VERSION_PATH: &str = "/v1";
pub const DEFAULT_STORE_PATH: &str = ".weekcp/store.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme + host of the backend, without a trailing slash.
    pub api_host: String,
    /// Location of the persistent key/value store holding the token.
    pub store_path: PathBuf,
    pub timeouts: Timeouts,
    /// Countdown recompute period in milliseconds.
    pub tick_millis: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            tick_millis: DEFAULT_TICK_MILLIS,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `WEEKCP_API_HOST`: default `https://api.charlieop.com`
    /// - `WEEKCP_STORE_PATH`: default `.weekcp/store.json`
    /// - `WEEKCP_REQUEST_TIMEOUT_SECS`: default 30
    /// - `WEEKCP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `WEEKCP_TICK_MILLIS`: default 1000
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `WEEKCP_API_HOST` is not an http(s) URL.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the API host is not an http(s) URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = normalize_host(lookup("WEEKCP_API_HOST").as_deref().unwrap_or(DEFAULT_API_HOST))?;
        let store_path = lookup("WEEKCP_STORE_PATH").map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);
        let timeouts = Timeouts {
            request_secs: parse_or(&lookup, "WEEKCP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "WEEKCP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let tick_millis = parse_or(&lookup, "WEEKCP_TICK_MILLIS", DEFAULT_TICK_MILLIS).max(1);

        Ok(Self { api_host, store_path, timeouts, tick_millis })
    }

    /// Replace the API host, validating it the same way `from_env` does.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `host` is not an http(s) URL.
    pub fn with_api_host(mut self, host: &str) -> Result<Self, ClientError> {
        self.api_host = normalize_host(host)?;
        Ok(self)
    }

    /// Versioned API root, e.g. `https://api.charlieop.com/v1`.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}{API_VERSION_PATH}", self.api_host)
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

fn normalize_host(raw: &str) -> Result<String, ClientError> {
    let host = raw.trim().trim_end_matches('/');
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        return Err(ClientError::Config(format!("WEEKCP_API_HOST must be an http(s) URL, got '{raw}'")));
    }
    Ok(host.to_string())
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
