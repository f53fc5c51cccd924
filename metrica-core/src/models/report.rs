//! Reporting query types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{normalize_lang, strip_whitespace};
use crate::error::CoreError;

// ============================================================================
// Accuracy
// ============================================================================

/// Sampling accuracy requested from the reporting API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// Smallest sample, fastest response.
    Low,
    /// Medium sample.
    Medium,
    /// Large sample.
    High,
    /// No sampling.
    #[default]
    Full,
}

impl Accuracy {
    /// Returns the query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Accuracy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "full" => Ok(Self::Full),
            _ => Err(CoreError::UnknownValue {
                kind: "accuracy",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Report Query
// ============================================================================

/// Parameters of an aggregated report.
///
/// Pagination (`limit`/`offset`) is not part of the query; the report client
/// adds it per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Application (counter) ids.
    pub ids: Vec<u64>,
    /// Range start (`YYYY-MM-DD`, `today`, `7daysAgo`, ...).
    pub date1: String,
    /// Range end.
    pub date2: String,
    /// Comma-separated metrics.
    pub metrics: String,
    /// Comma-separated dimensions.
    pub dimensions: String,
    /// Filter expression.
    #[serde(default)]
    pub filters: Option<String>,
    /// Time grouping (`day`, `week`, ...).
    #[serde(default)]
    pub group: Option<String>,
    /// Sampling accuracy.
    #[serde(default)]
    pub accuracy: Accuracy,
    /// Whether rows with undefined dimension values are included.
    #[serde(default)]
    pub include_undefined: Option<bool>,
    /// Language of dimension values.
    #[serde(default)]
    pub lang: Option<String>,
}

impl ReportQuery {
    /// Starts building a query.
    pub fn builder() -> ReportQueryBuilder {
        ReportQueryBuilder::default()
    }

    /// Returns the query parameters, with metrics and dimensions stripped of
    /// whitespace and the language lower-cased. Optional parameters are only
    /// present when set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let ids = self
            .ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut pairs = vec![
            ("ids", ids),
            ("date1", self.date1.clone()),
            ("date2", self.date2.clone()),
            ("metrics", strip_whitespace(&self.metrics)),
            ("dimensions", strip_whitespace(&self.dimensions)),
        ];

        if let Some(ref filters) = self.filters {
            pairs.push(("filters", filters.clone()));
        }
        if let Some(ref group) = self.group {
            pairs.push(("group", group.clone()));
        }
        pairs.push(("accuracy", self.accuracy.as_str().to_string()));
        if let Some(include) = self.include_undefined {
            pairs.push(("include_undefined", include.to_string()));
        }
        if let Some(ref lang) = self.lang {
            pairs.push(("lang", normalize_lang(lang)));
        }

        pairs
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ReportQuery`].
#[derive(Debug, Default)]
pub struct ReportQueryBuilder {
    ids: Vec<u64>,
    date1: Option<String>,
    date2: Option<String>,
    metrics: Option<String>,
    dimensions: Option<String>,
    filters: Option<String>,
    group: Option<String>,
    accuracy: Accuracy,
    include_undefined: Option<bool>,
    lang: Option<String>,
}

impl ReportQueryBuilder {
    /// Adds an application id.
    pub fn id(mut self, id: u64) -> Self {
        self.ids.push(id);
        self
    }

    /// Adds several application ids.
    pub fn ids(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.ids.extend(ids);
        self
    }

    /// Sets the date range.
    pub fn date_range(mut self, date1: impl Into<String>, date2: impl Into<String>) -> Self {
        self.date1 = Some(date1.into());
        self.date2 = Some(date2.into());
        self
    }

    /// Sets the metrics.
    pub fn metrics(mut self, metrics: impl Into<String>) -> Self {
        self.metrics = Some(metrics.into());
        self
    }

    /// Sets the dimensions.
    pub fn dimensions(mut self, dimensions: impl Into<String>) -> Self {
        self.dimensions = Some(dimensions.into());
        self
    }

    /// Sets the filter expression.
    pub fn filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }

    /// Sets the time grouping.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the sampling accuracy.
    pub fn accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the include-undefined flag.
    pub fn include_undefined(mut self, include: bool) -> Self {
        self.include_undefined = Some(include);
        self
    }

    /// Sets the language.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Builds the query.
    ///
    /// Nothing is checked here; the reporting API rejects incomplete queries
    /// with its own message.
    pub fn build(self) -> ReportQuery {
        ReportQuery {
            ids: self.ids,
            date1: self.date1.unwrap_or_default(),
            date2: self.date2.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            dimensions: self.dimensions.unwrap_or_default(),
            filters: self.filters,
            group: self.group,
            accuracy: self.accuracy,
            include_undefined: self.include_undefined,
            lang: self.lang,
        }
    }
}
