#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database connection, schema, and queries for collected social
//! content.
//!
//! Uses `switchy_database` with raw parameterized SQL throughout.
//! The schema is created in code ([`schema::ensure_schema`]) so a fresh
//! database bootstraps from the `init-db` command alone.

pub mod db;
pub mod queries;
pub mod schema;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
