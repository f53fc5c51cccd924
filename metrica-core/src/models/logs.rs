//! Log export request types.
//!
//! This module contains the parameters of a bulk log export:
//! - [`LogResource`] - Which log is exported
//! - [`DateDimension`] - Which timestamp the date range filters on
//! - [`LogExportRequest`] - The full request

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::strip_whitespace;
use crate::error::CoreError;

// ============================================================================
// Log Resource
// ============================================================================

/// Exportable log resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogResource {
    /// Tracker clicks.
    Clicks,
    /// Tracker postbacks.
    Postbacks,
    /// App installations.
    Installations,
    /// Deep link openings.
    Deeplinks,
    /// Session starts.
    SessionsStarts,
    /// Custom events.
    Events,
    /// Crashes.
    Crashes,
    /// Errors.
    Errors,
    /// Push tokens.
    PushTokens,
    /// In-app revenue events.
    RevenueEvents,
    /// User profiles.
    Profiles,
}

impl LogResource {
    /// Returns the path segment used by the export endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clicks => "clicks",
            Self::Postbacks => "postbacks",
            Self::Installations => "installations",
            Self::Deeplinks => "deeplinks",
            Self::SessionsStarts => "sessions_starts",
            Self::Events => "events",
            Self::Crashes => "crashes",
            Self::Errors => "errors",
            Self::PushTokens => "push_tokens",
            Self::RevenueEvents => "revenue_events",
            Self::Profiles => "profiles",
        }
    }

    /// Returns all exportable resources.
    pub fn all() -> &'static [LogResource] {
        &[
            Self::Clicks,
            Self::Postbacks,
            Self::Installations,
            Self::Deeplinks,
            Self::SessionsStarts,
            Self::Events,
            Self::Crashes,
            Self::Errors,
            Self::PushTokens,
            Self::RevenueEvents,
            Self::Profiles,
        ]
    }
}

impl fmt::Display for LogResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogResource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownResource(s.to_string()))
    }
}

// ============================================================================
// Date Dimension
// ============================================================================

/// Which timestamp the export date range applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateDimension {
    /// Time the event happened on the device.
    #[default]
    Default,
    /// Time the event was received by the server.
    Receive,
}

impl DateDimension {
    /// Returns the query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Receive => "receive",
        }
    }
}

impl fmt::Display for DateDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateDimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "receive" => Ok(Self::Receive),
            _ => Err(CoreError::UnknownValue {
                kind: "date dimension",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Log Export Request
// ============================================================================

/// Parameters of one bulk log export.
///
/// The field list is stored as given; [`LogExportRequest::query_pairs`]
/// strips its whitespace when the request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogExportRequest {
    /// Exported resource.
    pub resource: LogResource,
    /// Application id.
    pub application_id: u64,
    /// Range start, e.g. `2024-01-01 00:00:00`.
    pub date_since: String,
    /// Range end, e.g. `2024-01-31 23:59:59`.
    pub date_until: String,
    /// Which timestamp the range applies to.
    #[serde(default)]
    pub date_dimension: DateDimension,
    /// Comma-separated field list.
    pub fields: String,
}

impl LogExportRequest {
    /// Creates a request with the default date dimension.
    pub fn new(
        resource: LogResource,
        application_id: u64,
        date_since: impl Into<String>,
        date_until: impl Into<String>,
        fields: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            application_id,
            date_since: date_since.into(),
            date_until: date_until.into(),
            date_dimension: DateDimension::default(),
            fields: fields.into(),
        }
    }

    /// Sets the date dimension.
    #[must_use]
    pub fn with_date_dimension(mut self, dimension: DateDimension) -> Self {
        self.date_dimension = dimension;
        self
    }

    /// Returns the field list with all whitespace removed.
    pub fn normalized_fields(&self) -> String {
        strip_whitespace(&self.fields)
    }

    /// Returns the query parameters in transmission order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("application_id", self.application_id.to_string()),
            ("date_since", self.date_since.clone()),
            ("date_until", self.date_until.clone()),
            ("date_dimension", self.date_dimension.as_str().to_string()),
            ("fields", self.normalized_fields()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogExportRequest {
        LogExportRequest::new(
            LogResource::Events,
            1_234_567,
            "2024-01-01 00:00:00",
            "2024-01-02 00:00:00",
            "event_name,\n    event_timestamp,\tdevice_id ",
        )
    }

    #[test]
    fn test_resource_parsing() {
        assert_eq!("events".parse::<LogResource>().unwrap(), LogResource::Events);
        assert_eq!(
            "Sessions_Starts".parse::<LogResource>().unwrap(),
            LogResource::SessionsStarts
        );
        assert!(matches!(
            "nope".parse::<LogResource>(),
            Err(CoreError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_resource_names_round_trip() {
        for resource in LogResource::all() {
            assert_eq!(resource.as_str().parse::<LogResource>().unwrap(), *resource);
        }
    }

    #[test]
    fn test_date_dimension_default() {
        assert_eq!(DateDimension::default(), DateDimension::Default);
        assert_eq!("RECEIVE".parse::<DateDimension>().unwrap(), DateDimension::Receive);
        assert!("sent".parse::<DateDimension>().is_err());
    }

    #[test]
    fn test_query_pairs_strip_fields() {
        let pairs = sample().with_date_dimension(DateDimension::Receive).query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("application_id", "1234567".to_string()),
                ("date_since", "2024-01-01 00:00:00".to_string()),
                ("date_until", "2024-01-02 00:00:00".to_string()),
                ("date_dimension", "receive".to_string()),
                ("fields", "event_name,event_timestamp,device_id".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_fields_are_sent_empty() {
        let mut request = sample();
        request.fields = " \n ".to_string();
        assert_eq!(request.query_pairs()[4], ("fields", String::new()));
    }
}
