//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level HTTP failure (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a 4xx/5xx status.
    ///
    /// `message` is the remote detail verbatim: the response body for the
    /// log-export API, the JSON `message` field for the reporting API.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error detail reported by the service.
        message: String,
    },

    /// A status the request loop does not know how to handle.
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    /// The export job was still pending when the poll policy ran out.
    #[error("Export not ready after {attempts} attempts ({waited:?} waited)")]
    PollExhausted {
        /// Requests made.
        attempts: u32,
        /// Total time slept between requests.
        waited: Duration,
    },

    /// The next report page would start past `u64::MAX`.
    #[error("Page offset overflow: {offset} + {limit}")]
    PageOffsetOverflow {
        /// Offset of the last page requested.
        offset: u64,
        /// Page size.
        limit: u64,
    },

    /// Response body is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base URL or endpoint path could not be turned into a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The token cannot be sent as a header value.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The authorization flow could not obtain a token.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Request construction error.
    #[error("Core error: {0}")]
    Core(#[from] metrica_core::CoreError),

    /// Credential or settings storage error.
    #[error("Store error: {0}")]
    Store(#[from] metrica_store::StoreError),
}

impl FetchError {
    /// Returns the HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Api { status, .. } | FetchError::UnexpectedStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the service rejected the token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
