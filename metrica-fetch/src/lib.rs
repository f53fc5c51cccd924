// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Metrica Fetch
//!
//! HTTP clients for the AppMetrica log-export and reporting APIs.
//!
//! ## Host APIs
//!
//! The [`host`] module wraps system interactions:
//!
//! - [`host::http`] - HTTP client with OAuth header, tracing and base URL
//! - [`host::browser`] - Opening the authorization page
//!
//! ## Clients
//!
//! - [`auth::AuthProvider`] - Cached token bootstrap
//! - [`logs::LogExportClient`] - Bulk export with `202` polling
//! - [`reports::ReportClient`] - Pre-flight check plus CSV pagination
//! - [`context::FetchContext`] - Shared HTTP client, provider and settings
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use metrica_core::{LogExportRequest, LogResource};
//! use metrica_fetch::{FetchContext, LogExportClient};
//!
//! let ctx = Arc::new(FetchContext::builder().build()?);
//! let logs = LogExportClient::new(ctx);
//!
//! let request = LogExportRequest::new(
//!     LogResource::Events,
//!     1234567,
//!     "2024-01-01 00:00:00",
//!     "2024-01-01 23:59:59",
//!     "event_name, event_timestamp",
//! );
//! let table = logs.fetch_logs(&request, None).await?;
//! ```

pub mod auth;
pub mod context;
pub mod error;
pub mod host;
pub mod logs;
pub mod parser;
pub mod poll;
pub mod reports;

// Errors
pub use error::FetchError;

// Host APIs
pub use host::{browser::open_in_browser, http::HttpClient};

// Authorization
pub use auth::{AuthProvider, AuthorizationFlow, InteractiveFlow, PresetFlow, is_affirmative};

// Clients
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use logs::LogExportClient;
pub use poll::{DEFAULT_POLL_INTERVAL, PollPolicy, PollState, Sleeper, TokioSleeper};
pub use reports::ReportClient;

// Parsing
pub use parser::{error_message, parse_csv};
