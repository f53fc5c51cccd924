// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Metrica Store
//!
//! Local state for the Metrica client.
//!
//! This crate provides:
//!
//! - **CredentialStore**: Path-keyed token persistence with file, in-memory
//!   and OS keychain backends
//! - **Settings**: User configuration with JSON persistence and environment
//!   overrides
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use metrica_store::{CredentialStore, FileCredentialStore, Settings};
//!
//! let settings = Settings::load_default().await?.with_env_overrides();
//! let store = FileCredentialStore::new();
//!
//! if let Some(token) = store.load(&settings.token_path).await? {
//!     println!("cached token: {} chars", token.len());
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod persistence;
pub mod settings;

pub use credentials::{
    CredentialStore, FileCredentialStore, KeychainCredentialStore, MemoryCredentialStore,
    StoredToken,
};
pub use error::StoreError;
pub use persistence::{default_config_dir, default_settings_path, load_json, save_json};
pub use settings::Settings;
