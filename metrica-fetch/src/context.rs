//! Fetch context shared by the API clients.
//!
//! The context bundles the HTTP client, the token provider, the sleeper used
//! while polling and the per-run settings. Both [`LogExportClient`] and
//! [`ReportClient`] hold an `Arc<FetchContext>`.
//!
//! [`LogExportClient`]: crate::logs::LogExportClient
//! [`ReportClient`]: crate::reports::ReportClient

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use metrica_store::settings::{
    DEFAULT_API_URL, DEFAULT_CLIENT_ID, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_OAUTH_URL,
    DEFAULT_PAGE_SIZE, DEFAULT_TOKEN_FILE,
};
use metrica_store::{CredentialStore, FileCredentialStore, KeychainCredentialStore, Settings};
use tracing::debug;

use crate::auth::{AuthProvider, AuthorizationFlow, InteractiveFlow};
use crate::error::FetchError;
use crate::host::http::HttpClient;
use crate::poll::{PollPolicy, Sleeper, TokioSleeper};

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for one run of the clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Where the token is cached.
    pub token_path: PathBuf,
    /// Log-export polling policy.
    pub poll: PollPolicy,
    /// Rows requested per reporting page.
    pub page_size: u64,
    /// Limit on establishing a connection.
    pub connect_timeout: Duration,
    /// Total deadline per request. `None` lets downloads run to completion.
    pub timeout: Option<Duration>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_FILE),
            poll: PollPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout: None,
        }
    }
}

impl FetchSettings {
    /// Derives fetch settings from user settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut poll = PollPolicy::new(settings.poll_interval());
        if let Some(attempts) = settings.max_poll_attempts {
            poll = poll.with_max_attempts(attempts);
        }
        if let Some(secs) = settings.max_poll_wait_secs {
            poll = poll.with_max_wait(Duration::from_secs(secs));
        }

        Self {
            token_path: settings.token_path.clone(),
            poll,
            page_size: settings.page_size,
            connect_timeout: settings.connect_timeout(),
            timeout: settings.request_timeout(),
        }
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Everything the API clients need to make requests.
pub struct FetchContext {
    /// HTTP client bound to the API host.
    pub http: HttpClient,
    /// Token provider.
    pub auth: AuthProvider,
    /// Waits between log-export status checks.
    pub sleeper: Arc<dyn Sleeper>,
    /// Run settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns `explicit` if given, otherwise a token from the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization flow fails.
    pub async fn token(&self, explicit: Option<&str>) -> Result<String, FetchError> {
        match explicit {
            Some(token) => {
                debug!("Using caller-supplied token");
                Ok(token.to_string())
            }
            None => self.auth.get_token(&self.settings.token_path).await,
        }
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("base_url", &self.http.base_url().as_str())
            .field("auth", &self.auth)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a [`FetchContext`].
pub struct FetchContextBuilder {
    api_url: String,
    oauth_url: String,
    client_id: String,
    use_keychain: bool,
    store: Option<Arc<dyn CredentialStore>>,
    flow: Option<Arc<dyn AuthorizationFlow>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            use_keychain: false,
            store: None,
            flow: None,
            sleeper: None,
            settings: FetchSettings::default(),
        }
    }

    /// Creates a builder from user settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            oauth_url: settings.oauth_url.clone(),
            client_id: settings.client_id.clone(),
            use_keychain: settings.use_keychain,
            settings: FetchSettings::from_settings(settings),
            ..Self::new()
        }
    }

    /// Sets the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the OAuth authorization page.
    pub fn oauth_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_url = url.into();
        self
    }

    /// Sets the OAuth client id.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Sets the credential store.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the authorization flow.
    pub fn authorization_flow(mut self, flow: Arc<dyn AuthorizationFlow>) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Sets the sleeper.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Sets the polling policy.
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.settings.poll = policy;
        self
    }

    /// Sets the reporting page size.
    pub fn page_size(mut self, size: u64) -> Self {
        self.settings.page_size = size;
        self
    }

    /// Sets the token cache path.
    pub fn token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.token_path = path.into();
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.settings.connect_timeout = timeout;
        self
    }

    /// Sets a total deadline for each request, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = Some(timeout);
        self
    }

    /// Builds the fetch context.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed base URL, a zero page size, or if
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<FetchContext, FetchError> {
        if self.settings.page_size == 0 {
            return Err(metrica_core::CoreError::InvalidArgument(
                "page size must be positive".into(),
            )
            .into());
        }

        let http = HttpClient::with_timeouts(
            &self.api_url,
            self.settings.connect_timeout,
            self.settings.timeout,
        )?;

        let use_keychain = self.use_keychain;
        let store = self.store.unwrap_or_else(|| {
            if use_keychain {
                Arc::new(KeychainCredentialStore::new())
            } else {
                Arc::new(FileCredentialStore::new())
            }
        });
        let flow = self
            .flow
            .unwrap_or_else(|| Arc::new(InteractiveFlow::new()));

        debug!(
            base_url = %http.base_url(),
            backend = store.backend(),
            "Fetch context ready"
        );

        Ok(FetchContext {
            http,
            auth: AuthProvider::new(store, flow, self.oauth_url, self.client_id),
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper)),
            settings: self.settings,
        })
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PresetFlow;
    use metrica_store::MemoryCredentialStore;

    #[test]
    fn test_fetch_settings_from_settings() {
        let settings = Settings {
            poll_interval_secs: 2,
            max_poll_attempts: Some(5),
            max_poll_wait_secs: Some(60),
            page_size: 100,
            ..Settings::default()
        };

        let fetch = FetchSettings::from_settings(&settings);
        assert_eq!(fetch.poll.interval, Duration::from_secs(2));
        assert_eq!(fetch.poll.max_attempts, Some(5));
        assert_eq!(fetch.poll.max_wait, Some(Duration::from_secs(60)));
        assert_eq!(fetch.page_size, 100);
    }

    #[test]
    fn test_default_settings_poll_forever() {
        let fetch = FetchSettings::from_settings(&Settings::default());
        assert!(fetch.poll.is_unbounded());
        assert_eq!(fetch.page_size, 99_998);
    }

    #[test]
    fn test_default_context_has_no_request_deadline() {
        let ctx = FetchContext::builder().build().unwrap();
        assert_eq!(ctx.http.timeout(), None);
        assert_eq!(ctx.settings.connect_timeout, Duration::from_secs(30));

        let ctx = FetchContextBuilder::from_settings(&Settings::default())
            .build()
            .unwrap();
        assert_eq!(ctx.http.timeout(), None);

        let ctx = FetchContext::builder()
            .timeout(Duration::from_secs(900))
            .build()
            .unwrap();
        assert_eq!(ctx.http.timeout(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert!(matches!(
            FetchContext::builder().base_url("::nope").build(),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            FetchContext::builder().page_size(0).build(),
            Err(FetchError::Core(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_token_wins() {
        let ctx = FetchContext::builder()
            .credential_store(Arc::new(MemoryCredentialStore::with_token(
                "metrica_token.json",
                "cached",
            )))
            .authorization_flow(Arc::new(PresetFlow::new("prompted", false)))
            .build()
            .unwrap();

        assert_eq!(ctx.token(Some("explicit")).await.unwrap(), "explicit");
        assert_eq!(ctx.token(None).await.unwrap(), "cached");
    }
}
