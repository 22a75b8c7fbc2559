//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 4000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The backend base URL is empty after trimming.
    #[error("{var} must not be empty")]
    EmptyBaseUrl { var: &'static str },

    /// The base URL does not use an HTTP scheme.
    #[error("{var} must start with http:// or https://, got '{value}'")]
    InvalidBaseUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend API root without a trailing slash.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<String>,
    pub autosave_debounce_ms: u64,
    pub timeouts: RequestTimeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            timeouts: RequestTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `NOTECANVAS_API_BASE_URL`: default `http://127.0.0.1:5000/api`
    /// - `NOTECANVAS_API_TOKEN`: bearer token, unset by default
    /// - `NOTECANVAS_AUTOSAVE_DEBOUNCE_MS`: default 4000
    /// - `NOTECANVAS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `NOTECANVAS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not an HTTP URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = std::env::var("NOTECANVAS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_base_url("NOTECANVAS_API_BASE_URL", &raw_url)?;
        let api_token = std::env::var("NOTECANVAS_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            api_base_url,
            api_token,
            autosave_debounce_ms: env_parse("NOTECANVAS_AUTOSAVE_DEBOUNCE_MS", DEFAULT_AUTOSAVE_DEBOUNCE_MS),
            timeouts: RequestTimeouts {
                request_secs: env_parse("NOTECANVAS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("NOTECANVAS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        })
    }

    /// Replace the base URL, validating it like `NOTECANVAS_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or not an HTTP URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_base_url("--base-url", raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

fn parse_base_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl { var });
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::InvalidBaseUrl { var, value: trimmed.to_string() });
    }
    Ok(trimmed.to_string())
}

/// Parse `key` from the environment, falling back to `default` when unset or invalid.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
