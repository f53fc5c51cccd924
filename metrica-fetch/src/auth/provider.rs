//! Token acquisition with a local cache.

use std::path::Path;
use std::sync::Arc;

use metrica_store::CredentialStore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::flow::AuthorizationFlow;
use crate::error::FetchError;

/// Obtains a bearer token, from the cache or by asking the user.
#[derive(Clone)]
pub struct AuthProvider {
    store: Arc<dyn CredentialStore>,
    flow: Arc<dyn AuthorizationFlow>,
    oauth_url: String,
    client_id: String,
}

impl AuthProvider {
    /// Creates a provider.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        flow: Arc<dyn AuthorizationFlow>,
        oauth_url: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            flow,
            oauth_url: oauth_url.into(),
            client_id: client_id.into(),
        }
    }

    /// Returns the credential store backend.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Builds the page the user visits to issue a token.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the configured OAuth URL is
    /// malformed.
    pub fn authorize_url(&self) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.oauth_url,
            &[
                ("response_type", "token"),
                ("client_id", self.client_id.as_str()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.oauth_url)))
    }

    /// Returns the token cached at `path`, or runs the authorization flow.
    ///
    /// A cache that cannot be read is treated as empty. A token the user
    /// chose to keep is saved; failing to save it is only logged.
    ///
    /// # Errors
    ///
    /// Returns an error only if the authorization flow fails.
    #[instrument(skip(self), fields(path = %path.display(), backend = self.store.backend()))]
    pub async fn get_token(&self, path: &Path) -> Result<String, FetchError> {
        match self.store.load(path).await {
            Ok(Some(token)) => {
                info!("Token loaded from {}", path.display());
                return Ok(token);
            }
            Ok(None) => debug!("No cached token"),
            Err(e) => warn!(error = %e, "Failed to read cached token, ignoring it"),
        }

        self.authorize(path).await
    }

    /// Runs the authorization flow even if a token is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization flow fails.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn login(&self, path: &Path) -> Result<String, FetchError> {
        self.authorize(path).await
    }

    /// Removes the token cached at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to delete it.
    pub async fn forget(&self, path: &Path) -> Result<(), FetchError> {
        self.store.delete(path).await?;
        info!("Token removed from {}", path.display());
        Ok(())
    }

    async fn authorize(&self, path: &Path) -> Result<String, FetchError> {
        let url = self.authorize_url()?;
        let token = self.flow.prompt_for_code(url.as_str()).await?;

        if self.flow.prompt_for_save_preference(path).await? {
            match self.store.save(path, &token).await {
                Ok(()) => info!("Token saved to {}", path.display()),
                Err(e) => warn!(error = %e, "Failed to save token"),
            }
        } else {
            debug!("Token not saved");
        }

        Ok(token)
    }
}

impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProvider")
            .field("backend", &self.store.backend())
            .field("oauth_url", &self.oauth_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
