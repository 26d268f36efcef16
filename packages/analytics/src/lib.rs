#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Windowed, read-only analytics over collected posts.
//!
//! Each public function in [`aggregator`] answers one dashboard
//! question for a lookback window of N days. Aggregations that the SQL
//! layer handles well (counts, sums, group-bys) run as raw queries;
//! shape-heavy transforms (zero-filled time buckets, co-occurrence
//! graphs) fetch rows and run through the pure functions in [`series`].

pub mod aggregator;
pub mod series;

use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
