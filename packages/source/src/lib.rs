#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Config-driven definitions of social content sources.
//!
//! Each source is a TOML file describing where a platform can be
//! searched (an ordered list of mirrors), how results are located
//! (CSS selector fallback chains), and how the page should be driven
//! (scrolling, wait selectors). [`source_def::SourceDefinition::scrape`]
//! turns a keyword into normalized [`social_pulse_models::NewPost`]
//! candidates.
//!
//! The [`registry`] embeds every shipped source config at compile time.

pub mod registry;
pub mod source_def;

/// Errors that can occur while loading or scraping a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A direct HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A configured CSS selector does not parse.
    #[error("invalid selector `{0}`")]
    Selector(String),

    /// A source TOML config is malformed or incomplete.
    #[error("Config error: {0}")]
    Config(String),

    /// An API response body could not be decoded.
    #[error("API response error: {0}")]
    Api(#[from] serde_json::Error),

    /// A source selection named an id that is not registered.
    #[error("unknown source `{0}`")]
    UnknownSource(String),
}
