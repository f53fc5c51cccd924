//! Log-export client.
//!
//! The export API prepares data asynchronously. A request for a job that is
//! not ready yet is answered with `202 Accepted`; the same request is then
//! repeated until the service answers `200 OK` with the CSV body.

use std::sync::Arc;

use metrica_core::{LogExportRequest, ResultTable};
use reqwest::StatusCode;
use tracing::{debug, info, instrument};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::parser::parse_csv;

/// Client for `logs/v1/export/{resource}.csv`.
#[derive(Debug, Clone)]
pub struct LogExportClient {
    ctx: Arc<FetchContext>,
}

impl LogExportClient {
    /// Creates a client.
    pub fn new(ctx: Arc<FetchContext>) -> Self {
        Self { ctx }
    }

    /// Endpoint path for a request.
    fn path(request: &LogExportRequest) -> String {
        format!("logs/v1/export/{}.csv", request.resource.as_str())
    }

    /// Downloads one log export, waiting for the job to become ready.
    ///
    /// Without a `token` one is obtained from the context's provider.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Api`] with the response body on a 4xx/5xx answer
    /// - [`FetchError::PollExhausted`] when a bounded poll policy runs out
    /// - [`FetchError::UnexpectedStatus`] on any other non-200 answer
    #[instrument(
        skip(self, request, token),
        fields(resource = %request.resource, application_id = request.application_id)
    )]
    pub async fn fetch_logs(
        &self,
        request: &LogExportRequest,
        token: Option<&str>,
    ) -> Result<ResultTable, FetchError> {
        let token = self.ctx.token(token).await?;

        let path = Self::path(request);
        let query = request.query_pairs();
        let mut poll = self.ctx.settings.poll.start();

        loop {
            let response = self.ctx.http.get_with_auth(&path, &query, &token).await?;
            let status = response.status();

            if status == StatusCode::ACCEPTED {
                let delay = poll.next_delay()?;
                self.ctx.sleeper.sleep(delay).await;
                info!(
                    attempt = poll.attempts(),
                    waited_secs = poll.waited().as_secs(),
                    "Export is being prepared, waiting"
                );
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                let message = response.text().await?;
                return Err(FetchError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            if status != StatusCode::OK {
                return Err(FetchError::UnexpectedStatus(status.as_u16()));
            }

            let body = response.text().await?;
            let table = parse_csv(&body)?;
            debug!(rows = table.len(), columns = table.columns.len(), "Export downloaded");
            return Ok(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrica_core::LogResource;

    #[test]
    fn test_path() {
        let request = LogExportRequest::new(
            LogResource::PushTokens,
            1,
            "2024-01-01 00:00:00",
            "2024-01-02 00:00:00",
            "token",
        );
        assert_eq!(LogExportClient::path(&request), "logs/v1/export/push_tokens.csv");
    }
}
