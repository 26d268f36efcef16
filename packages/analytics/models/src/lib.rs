#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed result and parameter types for the analytics queries.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Bucket width for activity time series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeInterval {
    /// Hourly buckets.
    Hour,
    /// Daily buckets.
    Day,
    /// Weekly buckets, starting Monday.
    Week,
}

/// Ordering metric for top-post queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TopMetric {
    /// Most liked first.
    Likes,
    /// Most shared first.
    Shares,
    /// Highest likes + shares first.
    #[default]
    Engagement,
    /// Most positive sentiment first.
    SentimentPositive,
    /// Most negative sentiment first.
    SentimentNegative,
    /// Newest first.
    Recency,
}

impl std::str::FromStr for TopMetric {
    type Err = std::convert::Infallible;

    /// Unrecognized metric names fall back to [`TopMetric::Engagement`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "likes" => Self::Likes,
            "shares" => Self::Shares,
            "sentiment_positive" | "positive" => Self::SentimentPositive,
            "sentiment_negative" | "negative" => Self::SentimentNegative,
            "recency" | "recent" => Self::Recency,
            _ => Self::Engagement,
        })
    }
}

/// Post count for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCount {
    /// Platform display label.
    pub platform: String,
    /// Number of posts.
    pub count: i64,
}

/// Scored posts bucketed by sentiment polarity.
///
/// Positive is a compound score above 0.05, negative below -0.05, and
/// neutral the band between. Unscored posts are excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentBuckets {
    /// Posts scoring above the positive threshold.
    pub positive: i64,
    /// Posts within the neutral band.
    pub neutral: i64,
    /// Posts scoring below the negative threshold.
    pub negative: i64,
}

/// Headline numbers for the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Posts collected in the window.
    pub total_posts: i64,
    /// Per-platform post counts, descending.
    pub platforms: Vec<PlatformCount>,
    /// Sum of likes across the window.
    pub total_likes: i64,
    /// Sum of shares across the window.
    pub total_shares: i64,
    /// Mean likes per post (0 when the window is empty).
    pub avg_likes: f64,
    /// Mean shares per post (0 when the window is empty).
    pub avg_shares: f64,
    /// Sentiment polarity distribution over scored posts.
    pub sentiment: SentimentBuckets,
}

/// A hashtag and how many posts carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    /// Tag text without the leading `#`.
    pub text: String,
    /// Number of associated posts.
    pub count: i64,
}

/// A keyword and its summed frequency across posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordWeight {
    /// Keyword token.
    pub text: String,
    /// Summed per-post frequency.
    pub frequency: i64,
}

/// Top hashtags and keywords for the lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTopics {
    /// Hashtags by post-association count, descending.
    pub hashtags: Vec<TagCount>,
    /// Keywords by summed frequency, descending.
    pub keywords: Vec<KeywordWeight>,
}

/// One time bucket with a post count for every known platform.
///
/// Platforms with no posts in the bucket are present with a count of 0,
/// so consumers can chart aligned series without gap handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBucket {
    /// Inclusive start of the bucket.
    pub bucket_start: DateTime<Utc>,
    /// Post count per platform label.
    pub counts: BTreeMap<String, i64>,
}

/// Per-day engagement averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementPoint {
    /// Calendar day (UTC).
    pub date: NaiveDate,
    /// Mean likes per post that day.
    pub avg_likes: f64,
    /// Mean shares per post that day.
    pub avg_shares: f64,
    /// Posts that day.
    pub posts: i64,
}

/// A node in the hashtag co-occurrence network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    /// Tag text.
    pub text: String,
    /// Number of posts carrying the tag.
    pub occurrences: i64,
}

/// An undirected co-occurrence edge between two hashtags.
///
/// Endpoints are stored sorted (`a < b`) so each unordered pair appears
/// once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEdge {
    /// Lexicographically smaller endpoint.
    pub a: String,
    /// Lexicographically larger endpoint.
    pub b: String,
    /// Number of posts where both tags appear.
    pub weight: i64,
}

/// Hashtag co-occurrence graph over the lookback window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagNetwork {
    /// Top tags by occurrence.
    pub nodes: Vec<NetworkNode>,
    /// Edges between top tags only.
    pub edges: Vec<NetworkEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn unknown_metric_defaults_to_engagement() {
        assert_eq!(TopMetric::from_str("nonsense").unwrap(), TopMetric::Engagement);
        assert_eq!(TopMetric::from_str("").unwrap(), TopMetric::Engagement);
    }

    #[test]
    fn known_metrics_parse() {
        assert_eq!(TopMetric::from_str("likes").unwrap(), TopMetric::Likes);
        assert_eq!(TopMetric::from_str("SHARES").unwrap(), TopMetric::Shares);
        assert_eq!(
            TopMetric::from_str("sentiment_negative").unwrap(),
            TopMetric::SentimentNegative
        );
        assert_eq!(TopMetric::from_str("recency").unwrap(), TopMetric::Recency);
    }

    #[test]
    fn interval_round_trips_through_strings() {
        assert_eq!(TimeInterval::from_str("hour").unwrap(), TimeInterval::Hour);
        assert_eq!(TimeInterval::Week.to_string(), "week");
        assert!(TimeInterval::from_str("fortnight").is_err());
    }
}
