//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_FILE: &str = ".backoffice/auth_token";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{0}': expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// Ceiling for a whole request, connect included.
    pub timeout: Duration,
    /// Where [`crate::store::FileCredentialStore`] keeps the bearer token.
    pub token_file: PathBuf,
}

impl ClientConfig {
    /// Config for `base_url` with the default timeout and token location.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_file: default_token_file(std::env::var("HOME").ok().as_deref()),
        })
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `BACKOFFICE_API_URL`: default `http://localhost:5000/api`
    /// - `BACKOFFICE_TIMEOUT_SECS`: default 30
    /// - `BACKOFFICE_TOKEN_FILE`: default `$HOME/.backoffice/auth_token`
    ///
    /// # Errors
    ///
    /// Returns an error if `BACKOFFICE_API_URL` is set to something that is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is not an http(s) URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("BACKOFFICE_API_URL");
        let base_url = normalize_base_url(raw_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout_secs = lookup("BACKOFFICE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let token_file = lookup("BACKOFFICE_TOKEN_FILE")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| default_token_file(lookup("HOME").as_deref()), PathBuf::from);

        Ok(Self { base_url, timeout: Duration::from_secs(timeout_secs), token_file })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }
}

/// Trim whitespace and trailing slashes; reject anything that is not http(s).
///
/// # Errors
///
/// Returns an error if the scheme is missing or the host part is empty.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::InvalidBaseUrl(raw.to_owned()))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn default_token_file(home: Option<&str>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(DEFAULT_TOKEN_FILE),
        None => PathBuf::from(DEFAULT_TOKEN_FILE),
    }
}
