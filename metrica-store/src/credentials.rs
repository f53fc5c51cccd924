//! Token persistence.
//!
//! A [`CredentialStore`] maps a cache path to one bearer token. Three
//! backends are provided:
//!
//! 1. **File** - JSON file at the path itself (default)
//! 2. **Memory** - process-local map, for tests and embedding
//! 3. **Keychain** - OS keychain entry whose account name is the path

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::StoreError;
use crate::persistence::{load_json, remove_file, save_json};

/// Keychain service name for Metrica tokens.
const KEYCHAIN_SERVICE: &str = "metrica";

// ============================================================================
// Credential Store Trait
// ============================================================================

/// Path-keyed storage for a single bearer token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads the token stored for `path`.
    ///
    /// # Returns
    /// * `Ok(Some(token))` - Token found
    /// * `Ok(None)` - Nothing stored for this path
    /// * `Err(e)` - Storage exists but could not be read
    async fn load(&self, path: &Path) -> Result<Option<String>, StoreError>;

    /// Stores `token` for `path`, replacing any previous value.
    async fn save(&self, path: &Path, token: &str) -> Result<(), StoreError>;

    /// Removes the token stored for `path`. Removing nothing is not an error.
    async fn delete(&self, path: &Path) -> Result<(), StoreError>;

    /// Short backend name for log output.
    fn backend(&self) -> &'static str;
}

// ============================================================================
// File Store
// ============================================================================

/// Token record stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// The OAuth bearer token.
    pub access_token: String,

    /// When the token was stored.
    #[serde(default)]
    pub stored_at: Option<String>,
}

impl StoredToken {
    /// Wraps a token with the current time.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            access_token: token.into(),
            stored_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Stores the token as JSON in the file named by the path.
#[derive(Debug, Clone, Default)]
pub struct FileCredentialStore;

impl FileCredentialStore {
    /// Creates a new file store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn load(&self, path: &Path) -> Result<Option<String>, StoreError> {
        match load_json::<StoredToken>(path).await {
            Ok(stored) => Ok(Some(stored.access_token)),
            Err(e) if e.is_not_found() => {
                debug!("No token file");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, token), fields(path = %path.display()))]
    async fn save(&self, path: &Path, token: &str) -> Result<(), StoreError> {
        save_json(path, &StoredToken::new(token)).await?;
        debug!("Token saved to file");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn delete(&self, path: &Path) -> Result<(), StoreError> {
        remove_file(path).await
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// Keeps tokens in memory for the lifetime of the store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one token.
    pub fn with_token(path: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut tokens) = store.tokens.lock() {
            tokens.insert(path.into(), token.into());
        }
        store
    }

    /// Returns the number of stored tokens.
    pub fn len(&self) -> usize {
        self.tokens.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::Config("credential map lock poisoned".to_string())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, path: &Path) -> Result<Option<String>, StoreError> {
        let tokens = self.tokens.lock().map_err(|_| Self::poisoned())?;
        Ok(tokens.get(path).cloned())
    }

    async fn save(&self, path: &Path, token: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().map_err(|_| Self::poisoned())?;
        tokens.insert(path.to_path_buf(), token.to_string());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().map_err(|_| Self::poisoned())?;
        tokens.remove(path);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Keychain Store
// ============================================================================

/// Stores tokens in the system keychain.
///
/// Uses the `keyring` crate:
/// - macOS Keychain Services
/// - Windows Credential Manager
/// - Linux Secret Service API
#[derive(Debug, Clone)]
pub struct KeychainCredentialStore {
    service: String,
}

impl KeychainCredentialStore {
    /// Creates a store using the default service name.
    pub fn new() -> Self {
        Self {
            service: KEYCHAIN_SERVICE.to_string(),
        }
    }

    /// Returns the keychain account name used for a path.
    fn account(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn entry(&self, path: &Path) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, &Self::account(path)).map_err(StoreError::from)
    }
}

impl Default for KeychainCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn load(&self, path: &Path) -> Result<Option<String>, StoreError> {
        match self.entry(path)?.get_password() {
            Ok(token) if !token.is_empty() => Ok(Some(token)),
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!("Credential not found");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Failed to read credential");
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, token), fields(path = %path.display()))]
    async fn save(&self, path: &Path, token: &str) -> Result<(), StoreError> {
        self.entry(path)?.set_password(token)?;
        debug!("Token saved to keychain");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn delete(&self, path: &Path) -> Result<(), StoreError> {
        match self.entry(path)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend(&self) -> &'static str {
        "keychain"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let store = FileCredentialStore::new();

        // Awkward characters must survive unchanged
        let token = "AQAAAAA \"quoted\"\\back\tslash\u{e9} ";
        store.save(&path, token).await.unwrap();

        assert_eq!(store.load(&path).await.unwrap().as_deref(), Some(token));
    }

    #[tokio::test]
    async fn test_file_store_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new();

        assert_eq!(store.load(&dir.path().join("absent.json")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let result = FileCredentialStore::new().load(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let store = FileCredentialStore::new();

        store.save(&path, "abc").await.unwrap();
        store.delete(&path).await.unwrap();
        assert_eq!(store.load(&path).await.unwrap(), None);

        // Deleting twice is fine
        store.delete(&path).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        FileCredentialStore::new().save(&path, "abc").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_memory_store_is_path_keyed() {
        let store = MemoryCredentialStore::with_token("/a", "token-a");

        assert_eq!(store.load(Path::new("/a")).await.unwrap().as_deref(), Some("token-a"));
        assert_eq!(store.load(Path::new("/b")).await.unwrap(), None);

        store.save(Path::new("/b"), "token-b").await.unwrap();
        assert_eq!(store.len(), 2);

        store.delete(Path::new("/a")).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_parse_stored_token() {
        let json = r#"{
            "access_token": "AQAAAAAabc",
            "stored_at": "2024-01-01T00:00:00Z"
        }"#;

        let token: StoredToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "AQAAAAAabc");

        // stored_at is optional
        let bare: StoredToken = serde_json::from_str(r#"{"access_token":"x"}"#).unwrap();
        assert_eq!(bare.stored_at, None);
    }

    #[test]
    fn test_keychain_account_is_path() {
        assert_eq!(
            KeychainCredentialStore::account(Path::new("/tmp/token.json")),
            "/tmp/token.json"
        );
        assert_eq!(KeychainCredentialStore::new().backend(), "keychain");
    }
}
