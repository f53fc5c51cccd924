//! User settings.
//!
//! Settings live in `settings.json` under [`default_config_dir`]. Missing
//! fields fall back to defaults, and a handful of environment variables
//! override the file:
//!
//! | Variable             | Field        |
//! |----------------------|--------------|
//! | `METRICA_API_URL`    | `api_url`    |
//! | `METRICA_CLIENT_ID`  | `client_id`  |
//! | `METRICA_TOKEN_PATH` | `token_path` |
//!
//! [`default_config_dir`]: crate::persistence::default_config_dir

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Defaults
// ============================================================================

/// API host serving both the log-export and reporting APIs.
pub const DEFAULT_API_URL: &str = "https://api.appmetrica.yandex.ru";

/// OAuth authorization page.
pub const DEFAULT_OAUTH_URL: &str = "https://oauth.yandex.ru/authorize";

/// OAuth client id of the registered application.
pub const DEFAULT_CLIENT_ID: &str = "metrica-cli";

/// Token cache file, relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = "metrica_token.json";

/// Delay between log-export status checks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Rows requested per reporting page.
pub const DEFAULT_PAGE_SIZE: u64 = 99_998;

/// Limit on establishing a connection. Requests themselves have no deadline
/// unless `request_timeout_secs` is set.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "METRICA_API_URL";
const ENV_CLIENT_ID: &str = "METRICA_CLIENT_ID";
const ENV_TOKEN_PATH: &str = "METRICA_TOKEN_PATH";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_oauth_url() -> String {
    DEFAULT_OAUTH_URL.to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_token_path() -> PathBuf {
    PathBuf::from(DEFAULT_TOKEN_FILE)
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

// ============================================================================
// Settings
// ============================================================================

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the API host.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// OAuth authorization page.
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,

    /// OAuth client id.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Where the token is cached.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Store the token in the OS keychain instead of a file.
    #[serde(default)]
    pub use_keychain: bool,

    /// Seconds between log-export status checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up after this many status checks. `None` waits forever.
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,

    /// Give up after waiting this many seconds in total. `None` waits forever.
    #[serde(default)]
    pub max_poll_wait_secs: Option<u64>,

    /// Rows requested per reporting page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Seconds allowed for establishing a connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Total deadline per request, body included. `None` lets large
    /// downloads run as long as they need.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            oauth_url: default_oauth_url(),
            client_id: default_client_id(),
            token_path: default_token_path(),
            use_keychain: false,
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: None,
            max_poll_wait_secs: None,
            page_size: default_page_size(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load_from(&default_settings_path()).await
    }

    /// Loads settings from a path, using defaults when the file is missing.
    ///
    /// A file that exists but does not parse is logged and replaced by
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        info!(path = %path.display(), "Loading settings");
        match load_json(path).await {
            Ok(settings) => Ok(settings),
            Err(StoreError::Serialization(e)) => {
                warn!(error = %e, "Failed to parse settings, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves settings to the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&default_settings_path()).await
    }

    /// Saves settings to a path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup. Empty values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            debug!(api_url = %url, "API URL overridden from environment");
            self.api_url = url;
        }
        if let Some(id) = get(ENV_CLIENT_ID) {
            self.client_id = id;
        }
        if let Some(path) = get(ENV_TOKEN_PATH) {
            self.token_path = PathBuf::from(path);
        }
        self
    }

    /// Checks values that would otherwise fail deep inside a request loop.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.page_size == 0 {
            return Err(StoreError::Config("page_size must be positive".into()));
        }
        if self.api_url.trim().is_empty() {
            return Err(StoreError::Config("api_url is empty".into()));
        }
        if self.client_id.trim().is_empty() {
            return Err(StoreError::Config("client_id is empty".into()));
        }
        Ok(())
    }

    /// Returns the poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Returns the connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the total request deadline, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.token_path, PathBuf::from("metrica_token.json"));
        assert_eq!(settings.poll_interval(), Duration::from_secs(10));
        assert_eq!(settings.page_size, 99_998);
        assert!(settings.max_poll_attempts.is_none());
        assert!(settings.max_poll_wait_secs.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_no_request_deadline_by_default() {
        let settings = Settings::default();
        assert_eq!(settings.connect_timeout(), Duration::from_secs(30));
        assert_eq!(settings.request_timeout(), None);

        let settings: Settings =
            serde_json::from_str(r#"{"request_timeout_secs": 600}"#).unwrap();
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(settings.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"page_size": 500}"#).unwrap();
        assert_eq!(settings.page_size, 500);
        assert_eq!(settings.oauth_url, DEFAULT_OAUTH_URL);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("METRICA_API_URL", "http://127.0.0.1:9000"),
            ("METRICA_CLIENT_ID", "abc"),
            ("METRICA_TOKEN_PATH", ""),
        ]
        .into_iter()
        .collect();

        let settings =
            Settings::default().with_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(settings.api_url, "http://127.0.0.1:9000");
        assert_eq!(settings.client_id, "abc");
        // Empty values do not override
        assert_eq!(settings.token_path, PathBuf::from(DEFAULT_TOKEN_FILE));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(StoreError::Config(_))));
    }
}
