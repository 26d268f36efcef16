#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collection orchestration: fan out over sources, persist candidates.
//!
//! One collection run drives a single browser session sequentially
//! through every selected source for every keyword. Per-source failures
//! are logged and the session recovered; only a browser that cannot be
//! launched at all, or a failed transaction commit, aborts the run.

use std::time::Duration;

use social_pulse_database::{DbError, queries};
use social_pulse_models::NewPost;
use social_pulse_nlp::processor::extract_hashtags;
use social_pulse_scraper::ScrapeError;
use social_pulse_scraper::browser::BrowserSession;
use social_pulse_source::source_def::SourceDefinition;
use social_pulse_source::{SourceError, registry};
use switchy_database::Database;

/// Minimum gap between navigations within one session.
const MIN_REQUEST_GAP: Duration = Duration::from_secs(2);

/// Keywords used when `SOCIAL_PULSE_KEYWORDS` is unset.
const DEFAULT_KEYWORDS: &str = "tech,ai,rust,data";

/// Errors that can occur during collection runs.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The browser session could not be launched or recovered.
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// A source selection or config problem.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A store operation failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Keywords to collect, from `SOCIAL_PULSE_KEYWORDS` (comma-separated)
/// or the built-in default list.
#[must_use]
pub fn keywords_from_env() -> Vec<String> {
    let raw = std::env::var("SOCIAL_PULSE_KEYWORDS")
        .unwrap_or_else(|_| DEFAULT_KEYWORDS.to_string());
    parse_keyword_list(&raw)
}

/// Splits a comma-separated keyword list, trimming and dropping empties.
#[must_use]
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Optional custom stopwords file from `SOCIAL_PULSE_STOPWORDS_FILE`.
#[must_use]
pub fn stopwords_path_from_env() -> Option<std::path::PathBuf> {
    std::env::var("SOCIAL_PULSE_STOPWORDS_FILE")
        .ok()
        .map(std::path::PathBuf::from)
}

/// Scrapes every source in `sources` for `keyword`, sequentially.
///
/// A failing source is logged and skipped after recovering the browser
/// session; the remaining sources still run. Returns the concatenation
/// of every source's posts.
///
/// # Errors
///
/// Returns [`CollectError::Scrape`] only when the session cannot be
/// recovered (no usable browser engine).
pub async fn collect_all(
    session: &mut BrowserSession,
    sources: &[SourceDefinition],
    keyword: &str,
    days: i64,
    per_source_cap: usize,
) -> Result<Vec<NewPost>, CollectError> {
    let mut collected = Vec::new();
    for source in sources {
        match source.scrape(session, keyword, days, per_source_cap).await {
            Ok(posts) => {
                log::info!(
                    "{}: collected {} posts for '{keyword}'",
                    source.id,
                    posts.len()
                );
                collected.extend(posts);
            }
            Err(e) => {
                log::error!("{}: scrape failed for '{keyword}': {e}", source.id);
                session.recover().await?;
            }
        }
    }
    Ok(collected)
}

/// Persists a batch of post candidates in one transaction.
///
/// Duplicates are skipped by the store's unique index. Hashtags are
/// extracted from each newly inserted post and upserted/linked inside
/// the same transaction. Per-post failures, including per-hashtag
/// failures, are logged and skipped; a failed commit drops the whole
/// batch and surfaces.
///
/// # Errors
///
/// Returns [`CollectError::Db`] if the transaction cannot be opened or
/// committed.
pub async fn persist(db: &dyn Database, posts: &[NewPost]) -> Result<u64, CollectError> {
    if posts.is_empty() {
        return Ok(0);
    }
    let txn = db.begin_transaction().await.map_err(DbError::Database)?;
    let mut inserted = 0u64;

    for post in posts {
        match queries::insert_post(txn.as_ref(), post).await {
            Ok(Some(post_id)) => {
                inserted += 1;
                for tag in extract_hashtags(&post.content) {
                    if let Err(e) = attach_hashtag(txn.as_ref(), post_id, &tag).await {
                        log::warn!("failed to attach #{tag} to post {post_id}: {e}");
                    }
                }
            }
            Ok(None) => {
                log::debug!("duplicate post skipped ({})", post.platform);
            }
            Err(e) => {
                log::warn!("failed to insert post from {}: {e}", post.platform);
            }
        }
    }

    txn.commit().await.map_err(DbError::Database)?;
    log::info!("persisted {inserted} new posts ({} candidates)", posts.len());
    Ok(inserted)
}

async fn attach_hashtag(db: &dyn Database, post_id: i64, tag: &str) -> Result<(), DbError> {
    let hashtag_id = queries::upsert_hashtag(db, tag).await?;
    queries::link_post_hashtag(db, post_id, hashtag_id).await
}

/// Collects every keyword across the selected sources and persists the
/// results, returning the number of newly inserted posts.
///
/// # Errors
///
/// Returns [`CollectError`] when the source selection is unknown, the
/// browser cannot be launched at all, or a persist commit fails.
pub async fn collect_and_save(
    db: &dyn Database,
    source_selection: &str,
    keywords: &[String],
    per_source_cap: usize,
    days: i64,
) -> Result<u64, CollectError> {
    let sources = registry::sources_by_selection(source_selection)?;
    log::info!(
        "collecting {} keyword(s) across {} source(s)",
        keywords.len(),
        sources.len()
    );

    let mut session = BrowserSession::launch(MIN_REQUEST_GAP).await?;
    let result = run_collection(db, &mut session, &sources, keywords, per_source_cap, days).await;
    session.close().await;
    result
}

async fn run_collection(
    db: &dyn Database,
    session: &mut BrowserSession,
    sources: &[SourceDefinition],
    keywords: &[String],
    per_source_cap: usize,
    days: i64,
) -> Result<u64, CollectError> {
    let mut total_inserted = 0u64;
    for keyword in keywords {
        let posts = collect_all(session, sources, keyword, days, per_source_cap).await?;
        total_inserted += persist(db, &posts).await?;
    }
    Ok(total_inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_list_parsing_trims_and_drops_empties() {
        assert_eq!(
            parse_keyword_list("tech, ai ,rust,,data,"),
            vec!["tech", "ai", "rust", "data"]
        );
        assert!(parse_keyword_list("").is_empty());
        assert!(parse_keyword_list(" , ,").is_empty());
    }

    #[test]
    fn default_keywords_cover_the_shipped_topics() {
        assert_eq!(
            parse_keyword_list(DEFAULT_KEYWORDS),
            vec!["tech", "ai", "rust", "data"]
        );
    }
}
