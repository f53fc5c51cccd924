//! Core error types for Metrica.

use thiserror::Error;

/// Core error type for request construction and parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A request argument is missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown log export resource type.
    #[error("Unknown log resource: {0}")]
    UnknownResource(String),

    /// Unknown value for an enumerated parameter.
    #[error("Unknown {kind}: {value}")]
    UnknownValue {
        /// Parameter name.
        kind: &'static str,
        /// Rejected value.
        value: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
