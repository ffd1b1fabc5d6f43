//! Sync configuration.
//!
//! Loaded from `MEMO_*` environment variables. Nothing set means sync is not
//! configured; a partial set is an error so typos surface early.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::remote::RetryPolicy;
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const ENV_URL: &str = "MEMO_WEBDAV_URL";
const ENV_USERNAME: &str = "MEMO_WEBDAV_USERNAME";
const ENV_PASSWORD: &str = "MEMO_WEBDAV_PASSWORD";
const ENV_REMOTE_ROOT: &str = "MEMO_REMOTE_ROOT";
const ENV_TIMEOUT_SECS: &str = "MEMO_HTTP_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "MEMO_SYNC_MAX_RETRIES";

/// Remote folder used when `MEMO_REMOTE_ROOT` is not set.
pub const DEFAULT_REMOTE_ROOT: &str = "memo_data";

/// Per-request HTTP timeout used when `MEMO_HTTP_TIMEOUT_SECS` is not set.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// WebDAV endpoint and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct WebDavConfig {
    /// Server base URL without trailing slash
    pub url: String,
    pub username: String,
    pub password: String,
}

impl WebDavConfig {
    /// Build a config, validating and normalizing the URL.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            url: normalize_base_url(&url.into())?,
            username: username.into(),
            password: password.into(),
        })
    }
}

impl fmt::Debug for WebDavConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the sync engine needs to reach the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub webdav: WebDavConfig,
    /// Folder under the WebDAV base URL holding `notes/` and `assets/`
    pub remote_root: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Config with default root, timeout and retry policy.
    #[must_use]
    pub fn new(webdav: WebDavConfig) -> Self {
        Self {
            webdav,
            remote_root: DEFAULT_REMOTE_ROOT.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Load sync configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no sync variables are set.
    /// Returns an error when only a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| env::var(key).ok())
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<SyncConfig>> {
    let read = |key: &str| lookup(key).map(|value| value.trim().to_string());

    let url = read(ENV_URL);
    let username = read(ENV_USERNAME);
    let password = read(ENV_PASSWORD);
    let remote_root = read(ENV_REMOTE_ROOT);
    let timeout = read(ENV_TIMEOUT_SECS);
    let max_retries = read(ENV_MAX_RETRIES);

    let any_present = url.is_some()
        || username.is_some()
        || password.is_some()
        || remote_root.is_some()
        || timeout.is_some()
        || max_retries.is_some();

    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    if url.as_ref().map_or(true, String::is_empty) {
        missing.push(ENV_URL);
    }
    if username.as_ref().map_or(true, String::is_empty) {
        missing.push(ENV_USERNAME);
    }
    if password.as_ref().map_or(true, String::is_empty) {
        missing.push(ENV_PASSWORD);
    }

    let (Some(url), Some(username), Some(password)) = (url, username, password) else {
        return Err(incomplete(&missing));
    };
    if !missing.is_empty() {
        return Err(incomplete(&missing));
    }

    let mut config = SyncConfig::new(WebDavConfig::new(url, username, password)?);
    if let Some(root) = normalize_text_option(remote_root) {
        config.remote_root = normalize_remote_root(&root)?;
    }
    if let Some(raw) = normalize_text_option(timeout) {
        let secs = parse_number::<u64>(ENV_TIMEOUT_SECS, &raw)?;
        if secs == 0 {
            return Err(Error::InvalidInput(format!(
                "{ENV_TIMEOUT_SECS} must be greater than zero"
            )));
        }
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(raw) = normalize_text_option(max_retries) {
        config.retry = RetryPolicy::with_max_retries(parse_number::<u32>(ENV_MAX_RETRIES, &raw)?);
    }

    Ok(Some(config))
}

fn incomplete(missing: &[&str]) -> Error {
    Error::InvalidInput(format!(
        "WebDAV configuration is incomplete. Missing: {}",
        missing.join(", ")
    ))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a non-negative integer")))
}

fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim();
    if !is_http_url(url) {
        return Err(Error::InvalidInput(format!(
            "{ENV_URL} must start with http:// or https://"
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn normalize_remote_root(root: &str) -> Result<String> {
    let root = root.trim().trim_matches('/');
    if root.is_empty() || root.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidInput(format!(
            "{ENV_REMOTE_ROOT} must be a relative folder path"
        )));
    }
    Ok(root.to_string())
}
