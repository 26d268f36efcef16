//! Pure shaping functions for time buckets and co-occurrence graphs.
//!
//! These take rows already fetched from the store, so the windowing and
//! zero-fill behavior is unit-testable without a database.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike as _, Duration, Timelike as _, Utc};
use social_pulse_analytics_models::{
    ActivityBucket, HashtagNetwork, NetworkEdge, NetworkNode, TimeInterval,
};

/// Aligns a timestamp to the start of its bucket.
///
/// Weeks start on Monday.
#[must_use]
pub fn align_bucket(dt: DateTime<Utc>, interval: TimeInterval) -> DateTime<Utc> {
    let date = dt.date_naive();
    let naive = match interval {
        TimeInterval::Hour => date.and_hms_opt(dt.hour(), 0, 0),
        TimeInterval::Day => date.and_hms_opt(0, 0, 0),
        TimeInterval::Week => {
            let monday =
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
            monday.and_hms_opt(0, 0, 0)
        }
    };
    naive.unwrap_or_default().and_utc()
}

/// Buckets `(created_at, platform)` rows over the aligned lookback
/// window ending at `now`.
///
/// Every bucket between the aligned window start and the aligned `now`
/// is present, and every platform in `platforms` is keyed in every
/// bucket, zero-filled. Rows outside the aligned window are ignored.
#[must_use]
pub fn bucket_activity(
    rows: &[(DateTime<Utc>, String)],
    platforms: &[String],
    now: DateTime<Utc>,
    days: i64,
    interval: TimeInterval,
) -> Vec<ActivityBucket> {
    let step = match interval {
        TimeInterval::Hour => Duration::hours(1),
        TimeInterval::Day => Duration::days(1),
        TimeInterval::Week => Duration::weeks(1),
    };
    let start = align_bucket(now - Duration::days(days), interval);
    let end = align_bucket(now, interval);

    let zero_counts: BTreeMap<String, i64> = platforms
        .iter()
        .map(|platform| (platform.clone(), 0))
        .collect();

    let mut buckets: BTreeMap<DateTime<Utc>, BTreeMap<String, i64>> = BTreeMap::new();
    let mut cursor = start;
    while cursor <= end {
        buckets.insert(cursor, zero_counts.clone());
        cursor += step;
    }

    for (created_at, platform) in rows {
        let key = align_bucket(*created_at, interval);
        if let Some(counts) = buckets.get_mut(&key) {
            *counts.entry(platform.clone()).or_insert(0) += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(bucket_start, counts)| ActivityBucket {
            bucket_start,
            counts,
        })
        .collect()
}

/// Builds the hashtag co-occurrence network from `(post_id, tag)` rows.
///
/// Tags are counted once per post. Nodes are the top `limit` tags by
/// post occurrence (ties alphabetical); edges connect top tags that
/// appear together in at least one post, weighted by the number of
/// shared posts. A tag never pairs with itself.
#[must_use]
pub fn build_network(rows: &[(i64, String)], limit: usize) -> HashtagNetwork {
    let mut tags_by_post: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
    for (post_id, tag) in rows {
        tags_by_post.entry(*post_id).or_default().insert(tag.clone());
    }

    let mut occurrences: BTreeMap<String, i64> = BTreeMap::new();
    let mut pair_weights: BTreeMap<(String, String), i64> = BTreeMap::new();
    for tags in tags_by_post.values() {
        for tag in tags {
            *occurrences.entry(tag.clone()).or_insert(0) += 1;
        }
        let sorted: Vec<&String> = tags.iter().collect();
        for (index, first) in sorted.iter().enumerate() {
            for second in &sorted[index + 1..] {
                *pair_weights
                    .entry(((*first).clone(), (*second).clone()))
                    .or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, i64)> = occurrences.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);

    let node_names: BTreeSet<&str> = ranked.iter().map(|(text, _)| text.as_str()).collect();
    let nodes: Vec<NetworkNode> = ranked
        .iter()
        .map(|(text, occurrences)| NetworkNode {
            text: text.clone(),
            occurrences: *occurrences,
        })
        .collect();

    let mut edges: Vec<NetworkEdge> = pair_weights
        .into_iter()
        .filter(|((a, b), _)| node_names.contains(a.as_str()) && node_names.contains(b.as_str()))
        .map(|((a, b), weight)| NetworkEdge { a, b, weight })
        .collect();
    edges.sort_by(|x, y| {
        y.weight
            .cmp(&x.weight)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });

    HashtagNetwork { nodes, edges }
}
