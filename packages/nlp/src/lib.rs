#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text processing for collected posts: cleaning, keyword extraction,
//! hashtag extraction, and lexicon-based sentiment scoring.
//!
//! All linguistic data lives in an explicit [`resources::NlpResources`]
//! bundle loaded once at startup and passed by reference into the
//! processors. There is no global lazy state.

pub mod processor;
pub mod resources;
pub mod sentiment;

use social_pulse_database::DbError;

/// Errors that can occur during text processing.
#[derive(Debug, thiserror::Error)]
pub enum NlpError {
    /// A store operation failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// Reading a custom stopwords file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cleaning pattern failed to compile.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Which posts a keyword-extraction pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordScope {
    /// Every post with no keyword rows yet.
    AllUnprocessed,
    /// One specific post; its existing keyword rows are replaced.
    One(i64),
}

/// Which posts a sentiment-scoring pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentScope {
    /// Every post whose sentiment is still unscored.
    AllUnscored,
    /// One specific post; its score is recomputed.
    One(i64),
}
