//! OAuth token bootstrap.
//!
//! The platform issues bearer tokens through a browser page. This module
//! opens that page, asks the user to paste the token it shows, and caches it
//! through a [`CredentialStore`](metrica_store::CredentialStore).
//!
//! ## Flow
//!
//! 1. **Load**: return the cached token for the path, if any
//! 2. **Prompt**: open the authorization page and read the token
//! 3. **Save**: persist it if the user agrees
//!
//! ## Example
//!
//! ```ignore
//! let auth = AuthProvider::new(
//!     Arc::new(FileCredentialStore::new()),
//!     Arc::new(InteractiveFlow::new()),
//!     DEFAULT_OAUTH_URL,
//!     client_id,
//! );
//! let token = auth.get_token(Path::new("metrica_token.json")).await?;
//! ```

mod flow;
mod provider;

pub use flow::{AuthorizationFlow, InteractiveFlow, PresetFlow, is_affirmative};
pub use provider::AuthProvider;
