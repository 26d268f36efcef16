#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Browser automation and parsing primitives for social content scraping.
//!
//! Provides [`browser::BrowserSession`] (a managed headless-browser
//! lifecycle with engine fallback, retried navigation, and human-like
//! scrolling), [`rate_limiter::RateLimiter`] for request pacing, and the
//! [`parsing`] helpers that turn display strings ("1.2K", "3 hours ago")
//! into numbers and timestamps.
//!
//! This crate has no awareness of sources or storage. Callers drive the
//! session and hand the resulting HTML to their own extractors.

pub mod browser;
pub mod parsing;
pub mod rate_limiter;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// No browser engine could be launched through the fallback chain.
    #[error("no usable browser engine found")]
    NoEngine,

    /// An operation needed an open page but none has been navigated to.
    #[error("no page is currently open")]
    NoPage,

    /// The browser protocol reported an error.
    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
}
