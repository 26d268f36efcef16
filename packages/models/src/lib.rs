#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared record types for collected social content.
//!
//! Scrapers produce [`NewPost`] candidates; the store assigns ids and
//! returns [`Post`] rows. Keyword and hashtag rows hang off a post and
//! are produced by the processing pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The family of platform a source belongs to.
///
/// Families share page structure: every micro-blog mirror is scraped
/// with the same flow, as is every forum and every news aggregator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlatformFamily {
    /// Short-form timeline sites (Twitter/X mirrors such as Nitter).
    MicroBlog,
    /// Threaded discussion boards (Reddit and its mirrors).
    Forum,
    /// Link aggregators and news indexes (Hacker News search).
    News,
}

/// A stored post with its assigned id and scoring state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Database primary key.
    pub id: i64,
    /// Raw post text as scraped.
    pub content: String,
    /// Display label of the originating platform (e.g. "Twitter").
    pub platform: String,
    /// When the post was published.
    pub created_at: DateTime<Utc>,
    /// Like/upvote count at scrape time.
    pub likes: i64,
    /// Share/repost/comment-thread count at scrape time.
    pub shares: i64,
    /// Compound sentiment in [-1, 1]. `None` until the scoring pass
    /// has run for this post.
    pub sentiment_score: Option<f64>,
    /// Link back to the original post, when the source exposes one.
    pub source_url: Option<String>,
    /// Author handle, when the source exposes one.
    pub author: Option<String>,
}

impl Post {
    /// Combined engagement metric (likes + shares).
    #[must_use]
    pub const fn engagement(&self) -> i64 {
        self.likes + self.shares
    }
}

/// A candidate post produced by a scraper, before storage.
///
/// Carries no id and no sentiment; both belong to the store and the
/// processing pass respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Raw post text as scraped.
    pub content: String,
    /// Display label of the originating platform.
    pub platform: String,
    /// When the post was published.
    pub created_at: DateTime<Utc>,
    /// Like/upvote count at scrape time.
    pub likes: i64,
    /// Share/repost count at scrape time.
    pub shares: i64,
    /// Link back to the original post, when available.
    pub source_url: Option<String>,
    /// Author handle, when available.
    pub author: Option<String>,
}

/// A keyword extracted from a post's content.
///
/// A post with at least one keyword row counts as processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    /// Database primary key.
    pub id: i64,
    /// Post this keyword was extracted from.
    pub post_id: i64,
    /// The token itself, lowercase.
    pub text: String,
    /// Occurrence count within the post.
    pub frequency: i64,
}

/// A hashtag, unique by normalized (lowercase) text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    /// Database primary key.
    pub id: i64,
    /// Tag text without the leading `#`, lowercase.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn platform_family_round_trips_through_strings() {
        assert_eq!(PlatformFamily::MicroBlog.to_string(), "micro_blog");
        assert_eq!(
            PlatformFamily::from_str("forum").unwrap(),
            PlatformFamily::Forum
        );
        assert!(PlatformFamily::from_str("blog").is_err());
    }

    #[test]
    fn engagement_sums_likes_and_shares() {
        let post = Post {
            id: 1,
            content: "hello".to_string(),
            platform: "Twitter".to_string(),
            created_at: Utc::now(),
            likes: 10,
            shares: 3,
            sentiment_score: None,
            source_url: None,
            author: None,
        };
        assert_eq!(post.engagement(), 13);
    }
}
