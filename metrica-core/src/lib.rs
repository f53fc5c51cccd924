// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Metrica Core
//!
//! Core types and models shared by the Metrica crates.
//!
//! This crate has no I/O. It defines the request and result types that the
//! fetch layer turns into HTTP calls:
//!
//! ### Log Export
//! - [`LogExportRequest`] - Parameters of one bulk log export
//! - [`LogResource`] - Exportable resource types (events, installations, ...)
//! - [`DateDimension`] - Which timestamp the date range applies to
//!
//! ### Reporting
//! - [`ReportQuery`] - Parameters of an aggregated report
//! - [`Accuracy`] - Sampling accuracy of a report
//!
//! ### Results
//! - [`ResultTable`] - Named columns plus rows of string cells

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Log export
    DateDimension,
    LogExportRequest,
    LogResource,
    // Reporting
    Accuracy,
    ReportQuery,
    ReportQueryBuilder,
    // Results
    ResultTable,
    // Helpers
    normalize_lang,
    strip_whitespace,
};
