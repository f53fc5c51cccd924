//! HTTP client with OAuth authentication and tracing.
//!
//! Every Metrica endpoint is a GET relative to one base URL, authenticated
//! with `Authorization: OAuth <token>`. This wrapper owns the base URL so
//! tests can point the clients at a local mock server.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Default limit on establishing a connection.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Metrica.
const USER_AGENT: &str = concat!("metrica/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpClient {
    /// Creates a client with the default connect timeout and no total
    /// request deadline.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for a malformed base URL and
    /// [`FetchError::Http`] if the TLS backend cannot be initialised.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_timeouts(base_url, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS), None)
    }

    /// Creates a client with custom timeouts.
    ///
    /// `timeout` bounds a whole request including the body; `None` leaves
    /// only the connect timeout in place.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: builder.build()?,
            base_url: Self::parse_base(base_url)?,
            timeout,
        })
    }

    /// Parses a base URL, making sure relative joins keep its path.
    fn parse_base(base_url: &str) -> Result<Url, FetchError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }

        let url = Url::parse(&normalized)
            .map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;

        if url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(format!("{base_url}: not a base URL")));
        }
        Ok(url)
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the total request deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolves an endpoint path (e.g. `stat/v1/data`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Builds the `Authorization` header value for a token.
    pub fn auth_header(token: &str) -> Result<HeaderValue, FetchError> {
        let mut value = HeaderValue::from_str(&format!("OAuth {token}"))
            .map_err(|_| FetchError::InvalidToken("contains characters not allowed in a header".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Performs an authenticated GET request.
    ///
    /// Any status is returned as-is; interpreting it is up to the caller.
    #[instrument(skip(self, query, token), fields(path = %path))]
    pub async fn get_with_auth(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Response, FetchError> {
        let url = self.endpoint(path)?;
        debug!("GET request with auth");

        let response = self
            .inner
            .get(url)
            .query(query)
            .header(AUTHORIZATION, Self::auth_header(token)?)
            .send()
            .await?;

        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client = HttpClient::new("https://api.appmetrica.yandex.ru").unwrap();
        assert_eq!(
            client.endpoint("/logs/v1/export/events.csv").unwrap().as_str(),
            "https://api.appmetrica.yandex.ru/logs/v1/export/events.csv"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpClient::new("http://localhost:8080/proxy/metrica").unwrap();
        assert_eq!(
            client.endpoint("stat/v1/data.csv").unwrap().as_str(),
            "http://localhost:8080/proxy/metrica/stat/v1/data.csv"
        );
    }

    #[test]
    fn test_no_total_deadline_by_default() {
        let client = HttpClient::new("https://api.appmetrica.yandex.ru").unwrap();
        assert_eq!(client.timeout(), None);

        let client = HttpClient::with_timeouts(
            "https://api.appmetrica.yandex.ru",
            Duration::from_secs(5),
            Some(Duration::from_secs(600)),
        )
        .unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpClient::new("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpClient::new("mailto:someone@example.com"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_auth_header() {
        let value = HttpClient::auth_header("AQAAAAAabc").unwrap();
        assert_eq!(value.to_str().unwrap(), "OAuth AQAAAAAabc");
        assert!(value.is_sensitive());

        assert!(matches!(
            HttpClient::auth_header("bad\ntoken"),
            Err(FetchError::InvalidToken(_))
        ));
    }
}
