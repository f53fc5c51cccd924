//! Reporting client.
//!
//! A report is fetched in two phases:
//!
//! 1. **Pre-flight**: one JSON request with `limit=1` so that a bad query
//!    fails fast with the service's own error message
//! 2. **Pages**: CSV requests with `limit`/`offset` (offsets start at 1)
//!    until a page comes back without rows
//!
//! Every CSV page starts with a header line. It is never returned as data;
//! the one from the first page names the columns of the result.

use std::sync::Arc;

use metrica_core::{ReportQuery, ResultTable};
use reqwest::Response;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::parser::{error_message, parse_csv};

/// JSON reporting endpoint, used for the pre-flight request.
const DATA_PATH: &str = "stat/v1/data";

/// CSV reporting endpoint, used for pagination.
const DATA_CSV_PATH: &str = "stat/v1/data.csv";

/// Offset of the first row. The reporting API counts from 1.
const FIRST_OFFSET: u64 = 1;

/// The part of the pre-flight answer worth logging.
#[derive(Debug, Deserialize)]
struct PreflightSummary {
    #[serde(default)]
    total_rows: Option<u64>,
}

/// Client for `stat/v1/data` and `stat/v1/data.csv`.
#[derive(Debug, Clone)]
pub struct ReportClient {
    ctx: Arc<FetchContext>,
}

impl ReportClient {
    /// Creates a client.
    pub fn new(ctx: Arc<FetchContext>) -> Self {
        Self { ctx }
    }

    /// Fetches every row of a report.
    ///
    /// Without a `token` one is obtained from the context's provider.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Api`] carrying the service's `message` when the
    /// pre-flight request or any page is rejected. No page is requested when
    /// the pre-flight fails. [`FetchError::PageOffsetOverflow`] ends a report
    /// whose next offset does not fit in a `u64`.
    #[instrument(skip(self, query, token), fields(ids = ?query.ids))]
    pub async fn fetch_report(
        &self,
        query: &ReportQuery,
        token: Option<&str>,
    ) -> Result<ResultTable, FetchError> {
        let token = self.ctx.token(token).await?;
        let params = query.query_pairs();

        self.preflight(&params, &token).await?;

        let limit = self.ctx.settings.page_size;
        let mut offset = FIRST_OFFSET;
        let mut pages = Vec::new();

        loop {
            let page = self.fetch_page(&params, limit, offset, &token).await?;
            let done = page.is_empty();
            // The first page names the columns even when it has no rows.
            if !done || pages.is_empty() {
                pages.push(page);
            }
            if done {
                break;
            }
            offset = offset
                .checked_add(limit)
                .ok_or(FetchError::PageOffsetOverflow { offset, limit })?;
        }

        let table = ResultTable::concat(pages);
        info!(rows = table.len(), columns = table.columns.len(), "Report downloaded");
        Ok(table)
    }

    /// Validates the query with a single-row JSON request.
    async fn preflight(&self, params: &[(&str, String)], token: &str) -> Result<(), FetchError> {
        let mut query = params.to_vec();
        query.push(("limit", "1".to_string()));

        let response = self.ctx.http.get_with_auth(DATA_PATH, &query, token).await?;
        let body = Self::success_body(response).await?;

        match serde_json::from_str::<PreflightSummary>(&body) {
            Ok(PreflightSummary {
                total_rows: Some(total),
            }) => debug!(total_rows = total, "Report query accepted"),
            _ => debug!("Report query accepted"),
        }
        Ok(())
    }

    /// Fetches one CSV page, with its header line removed from the rows.
    #[instrument(skip(self, params, token))]
    async fn fetch_page(
        &self,
        params: &[(&str, String)],
        limit: u64,
        offset: u64,
        token: &str,
    ) -> Result<ResultTable, FetchError> {
        let mut query = params.to_vec();
        query.push(("limit", limit.to_string()));
        query.push(("offset", offset.to_string()));

        let response = self
            .ctx
            .http
            .get_with_auth(DATA_CSV_PATH, &query, token)
            .await?;
        let body = Self::success_body(response).await?;

        let page = parse_csv(&body)?;
        debug!(rows = page.len(), "Page received");
        Ok(page)
    }

    /// Returns the body of a successful response, or the service's error.
    async fn success_body(response: Response) -> Result<String, FetchError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }
        Ok(body)
    }
}
