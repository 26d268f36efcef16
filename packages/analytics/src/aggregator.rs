//! Read-only aggregation queries over the post store.
//!
//! Every function takes a `days` lookback: only posts with
//! `created_at >= now - days` participate.

use chrono::{Duration, NaiveDate, Utc};
use moosicbox_json_utils::database::ToValue as _;
use social_pulse_analytics_models::{
    ActivityBucket, DashboardSummary, EngagementPoint, HashtagNetwork, KeywordWeight,
    PlatformCount, SentimentBuckets, TagCount, TimeInterval, TopMetric, TrendingTopics,
};
use social_pulse_models::Post;
use switchy_database::{Database, DatabaseValue};

use crate::AnalyticsError;
use crate::series::{bucket_activity, build_network};

fn window_start(days: i64) -> DatabaseValue {
    DatabaseValue::DateTime((Utc::now() - Duration::days(days)).naive_utc())
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: i64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

fn conversion(message: impl Into<String>) -> AnalyticsError {
    AnalyticsError::Conversion {
        message: message.into(),
    }
}

fn row_to_post(row: &switchy_database::Row) -> Result<Post, AnalyticsError> {
    let created_at_naive: chrono::NaiveDateTime = row
        .to_value("created_at")
        .map_err(|e| conversion(format!("Failed to parse created_at: {e}")))?;
    Ok(Post {
        id: row
            .to_value("id")
            .map_err(|e| conversion(format!("Failed to parse id: {e}")))?,
        content: row
            .to_value("content")
            .map_err(|e| conversion(format!("Failed to parse content: {e}")))?,
        platform: row
            .to_value("platform")
            .map_err(|e| conversion(format!("Failed to parse platform: {e}")))?,
        created_at: chrono::DateTime::from_naive_utc_and_offset(created_at_naive, Utc),
        likes: row
            .to_value("likes")
            .map_err(|e| conversion(format!("Failed to parse likes: {e}")))?,
        shares: row
            .to_value("shares")
            .map_err(|e| conversion(format!("Failed to parse shares: {e}")))?,
        sentiment_score: row.to_value("sentiment_score").unwrap_or(None),
        source_url: row.to_value("source_url").unwrap_or(None),
        author: row.to_value("author").unwrap_or(None),
    })
}

/// Headline numbers for the lookback window: totals, per-platform
/// counts, engagement sums and means, and the sentiment polarity
/// distribution over scored posts.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn dashboard_summary(
    db: &dyn Database,
    days: i64,
) -> Result<DashboardSummary, AnalyticsError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*)::bigint AS total,
                    COALESCE(SUM(likes), 0)::bigint AS total_likes,
                    COALESCE(SUM(shares), 0)::bigint AS total_shares
             FROM posts WHERE created_at >= $1",
            &[window_start(days)],
        )
        .await?;
    let totals = rows
        .first()
        .ok_or_else(|| conversion("Empty totals result"))?;
    let total_posts: i64 = totals
        .to_value("total")
        .map_err(|e| conversion(format!("Failed to parse total: {e}")))?;
    let total_likes: i64 = totals
        .to_value("total_likes")
        .map_err(|e| conversion(format!("Failed to parse total_likes: {e}")))?;
    let total_shares: i64 = totals
        .to_value("total_shares")
        .map_err(|e| conversion(format!("Failed to parse total_shares: {e}")))?;

    let platform_rows = db
        .query_raw_params(
            "SELECT platform, COUNT(*)::bigint AS count
             FROM posts WHERE created_at >= $1
             GROUP BY platform ORDER BY count DESC",
            &[window_start(days)],
        )
        .await?;
    let platforms = platform_rows
        .iter()
        .map(|row| {
            Ok(PlatformCount {
                platform: row
                    .to_value("platform")
                    .map_err(|e| conversion(format!("Failed to parse platform: {e}")))?,
                count: row
                    .to_value("count")
                    .map_err(|e| conversion(format!("Failed to parse count: {e}")))?,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    let sentiment_rows = db
        .query_raw_params(
            "SELECT COUNT(*) FILTER (WHERE sentiment_score > 0.05) AS positive,
                    COUNT(*) FILTER (WHERE sentiment_score < -0.05) AS negative,
                    COUNT(*) FILTER (
                        WHERE sentiment_score IS NOT NULL
                          AND sentiment_score >= -0.05
                          AND sentiment_score <= 0.05
                    ) AS neutral
             FROM posts WHERE created_at >= $1",
            &[window_start(days)],
        )
        .await?;
    let sentiment = sentiment_rows.first().map_or_else(SentimentBuckets::default, |row| {
        SentimentBuckets {
            positive: row.to_value("positive").unwrap_or(0),
            neutral: row.to_value("neutral").unwrap_or(0),
            negative: row.to_value("negative").unwrap_or(0),
        }
    });

    Ok(DashboardSummary {
        total_posts,
        platforms,
        total_likes,
        total_shares,
        avg_likes: mean(total_likes, total_posts),
        avg_shares: mean(total_shares, total_posts),
        sentiment,
    })
}

/// Top hashtags (by post association) and keywords (by summed
/// frequency) in the window, each capped at `limit`. Tie order follows
/// store order and is not stable.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn trending_topics(
    db: &dyn Database,
    days: i64,
    limit: u64,
) -> Result<TrendingTopics, AnalyticsError> {
    let hashtag_rows = db
        .query_raw_params(
            &format!(
                "SELECT h.text, COUNT(ph.post_id)::bigint AS count
                 FROM hashtags h
                 JOIN post_hashtags ph ON ph.hashtag_id = h.id
                 JOIN posts p ON p.id = ph.post_id
                 WHERE p.created_at >= $1
                 GROUP BY h.text
                 ORDER BY count DESC
                 LIMIT {limit}"
            ),
            &[window_start(days)],
        )
        .await?;
    let hashtags = hashtag_rows
        .iter()
        .map(|row| {
            Ok(TagCount {
                text: row
                    .to_value("text")
                    .map_err(|e| conversion(format!("Failed to parse hashtag: {e}")))?,
                count: row
                    .to_value("count")
                    .map_err(|e| conversion(format!("Failed to parse count: {e}")))?,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    let keyword_rows = db
        .query_raw_params(
            &format!(
                "SELECT k.text, COALESCE(SUM(k.frequency), 0)::bigint AS frequency
                 FROM keywords k
                 JOIN posts p ON p.id = k.post_id
                 WHERE p.created_at >= $1
                 GROUP BY k.text
                 ORDER BY frequency DESC
                 LIMIT {limit}"
            ),
            &[window_start(days)],
        )
        .await?;
    let keywords = keyword_rows
        .iter()
        .map(|row| {
            Ok(KeywordWeight {
                text: row
                    .to_value("text")
                    .map_err(|e| conversion(format!("Failed to parse keyword: {e}")))?,
                frequency: row
                    .to_value("frequency")
                    .map_err(|e| conversion(format!("Failed to parse frequency: {e}")))?,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    Ok(TrendingTopics { hashtags, keywords })
}

const fn order_clause(metric: TopMetric) -> &'static str {
    match metric {
        TopMetric::Likes => "likes DESC",
        TopMetric::Shares => "shares DESC",
        TopMetric::Engagement => "(likes + shares) DESC",
        TopMetric::SentimentPositive => "sentiment_score DESC NULLS LAST",
        TopMetric::SentimentNegative => "sentiment_score ASC NULLS LAST",
        TopMetric::Recency => "created_at DESC",
    }
}

/// The `limit` highest-ranked posts in the window for the given metric.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn top_posts(
    db: &dyn Database,
    days: i64,
    metric: TopMetric,
    limit: u64,
) -> Result<Vec<Post>, AnalyticsError> {
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT id, content, platform, created_at, likes, shares,
                        sentiment_score, source_url, author
                 FROM posts
                 WHERE created_at >= $1
                 ORDER BY {}
                 LIMIT {limit}",
                order_clause(metric)
            ),
            &[window_start(days)],
        )
        .await?;
    rows.iter().map(row_to_post).collect()
}

/// Zero-filled activity buckets per platform over the window.
///
/// The distinct platform list comes from the whole store, so a platform
/// with no posts inside the window still appears with zeros.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn time_series_activity(
    db: &dyn Database,
    days: i64,
    interval: TimeInterval,
) -> Result<Vec<ActivityBucket>, AnalyticsError> {
    let platform_rows = db
        .query_raw_params("SELECT DISTINCT platform FROM posts ORDER BY platform", &[])
        .await?;
    let platforms = platform_rows
        .iter()
        .map(|row| {
            row.to_value("platform")
                .map_err(|e| conversion(format!("Failed to parse platform: {e}")))
        })
        .collect::<Result<Vec<String>, AnalyticsError>>()?;

    let rows = db
        .query_raw_params(
            "SELECT created_at, platform FROM posts WHERE created_at >= $1",
            &[window_start(days)],
        )
        .await?;
    let points = rows
        .iter()
        .map(|row| {
            let naive: chrono::NaiveDateTime = row
                .to_value("created_at")
                .map_err(|e| conversion(format!("Failed to parse created_at: {e}")))?;
            let platform: String = row
                .to_value("platform")
                .map_err(|e| conversion(format!("Failed to parse platform: {e}")))?;
            Ok((
                chrono::DateTime::from_naive_utc_and_offset(naive, Utc),
                platform,
            ))
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    Ok(bucket_activity(&points, &platforms, Utc::now(), days, interval))
}

/// Per-day mean likes/shares and post counts, ascending by day,
/// optionally filtered to one platform.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn time_series_engagement(
    db: &dyn Database,
    days: i64,
    platform: Option<&str>,
) -> Result<Vec<EngagementPoint>, AnalyticsError> {
    let mut sql = "SELECT to_char(created_at, 'YYYY-MM-DD') AS day,
                COALESCE(AVG(likes), 0)::double precision AS avg_likes,
                COALESCE(AVG(shares), 0)::double precision AS avg_shares,
                COUNT(*)::bigint AS posts
         FROM posts WHERE created_at >= $1"
        .to_string();
    let mut params = vec![window_start(days)];
    if let Some(platform) = platform {
        sql.push_str(" AND platform = $2");
        params.push(DatabaseValue::String(platform.to_string()));
    }
    sql.push_str(" GROUP BY day ORDER BY day ASC");

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.iter()
        .map(|row| {
            let day: String = row
                .to_value("day")
                .map_err(|e| conversion(format!("Failed to parse day: {e}")))?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| conversion(format!("Invalid day '{day}': {e}")))?;
            Ok(EngagementPoint {
                date,
                avg_likes: row
                    .to_value("avg_likes")
                    .map_err(|e| conversion(format!("Failed to parse avg_likes: {e}")))?,
                avg_shares: row
                    .to_value("avg_shares")
                    .map_err(|e| conversion(format!("Failed to parse avg_shares: {e}")))?,
                posts: row
                    .to_value("posts")
                    .map_err(|e| conversion(format!("Failed to parse posts: {e}")))?,
            })
        })
        .collect()
}

/// Hashtag co-occurrence network over the window, restricted to the
/// top `limit` tags.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn hashtag_network(
    db: &dyn Database,
    days: i64,
    limit: usize,
) -> Result<HashtagNetwork, AnalyticsError> {
    let rows = db
        .query_raw_params(
            "SELECT ph.post_id, h.text
             FROM post_hashtags ph
             JOIN hashtags h ON h.id = ph.hashtag_id
             JOIN posts p ON p.id = ph.post_id
             WHERE p.created_at >= $1",
            &[window_start(days)],
        )
        .await?;
    let pairs = rows
        .iter()
        .map(|row| {
            let post_id: i64 = row
                .to_value("post_id")
                .map_err(|e| conversion(format!("Failed to parse post_id: {e}")))?;
            let text: String = row
                .to_value("text")
                .map_err(|e| conversion(format!("Failed to parse text: {e}")))?;
            Ok((post_id, text))
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    Ok(build_network(&pairs, limit))
}

/// Posts whose content contains any of the whitespace-separated query
/// terms (case-insensitive), newest first. An empty query matches
/// everything in the window.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query or row decode fails.
pub async fn search_posts(
    db: &dyn Database,
    query: &str,
    days: i64,
    limit: u64,
) -> Result<Vec<Post>, AnalyticsError> {
    let terms: Vec<&str> = query.split_whitespace().collect();
    let mut sql = "SELECT id, content, platform, created_at, likes, shares,
                sentiment_score, source_url, author
         FROM posts WHERE created_at >= $1"
        .to_string();
    let mut params = vec![window_start(days)];
    if !terms.is_empty() {
        let clauses: Vec<String> = terms
            .iter()
            .enumerate()
            .map(|(index, _)| format!("content ILIKE ${}", index + 2))
            .collect();
        sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
        params.extend(
            terms
                .iter()
                .map(|term| DatabaseValue::String(format!("%{term}%"))),
        );
    }
    sql.push_str(&format!(" ORDER BY created_at DESC LIMIT {limit}"));

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.iter().map(row_to_post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_covers_every_metric() {
        assert_eq!(order_clause(TopMetric::Likes), "likes DESC");
        assert_eq!(order_clause(TopMetric::Shares), "shares DESC");
        assert_eq!(order_clause(TopMetric::Engagement), "(likes + shares) DESC");
        assert_eq!(
            order_clause(TopMetric::SentimentPositive),
            "sentiment_score DESC NULLS LAST"
        );
        assert_eq!(
            order_clause(TopMetric::SentimentNegative),
            "sentiment_score ASC NULLS LAST"
        );
        assert_eq!(order_clause(TopMetric::Recency), "created_at DESC");
    }

    #[test]
    fn mean_of_empty_window_is_zero() {
        assert!((mean(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((mean(10, 4) - 2.5).abs() < f64::EPSILON);
    }
}
