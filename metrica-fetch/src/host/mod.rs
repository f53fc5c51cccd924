//! Host APIs for the Metrica clients.
//!
//! - [`http`] - HTTP client with OAuth header, tracing and base-URL handling
//! - [`browser`] - Opening the authorization page

pub mod browser;
pub mod http;

pub use browser::open_in_browser;
pub use http::HttpClient;
