//! Parsing of display strings scraped from social pages.
//!
//! Metric counters come in forms like "1.2K" or "3,456"; timestamps come
//! as relative phrases ("2 hours ago") or one of a handful of absolute
//! formats. Both parsers are total: junk input degrades to `0` or to the
//! supplied reference time rather than failing the post.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Parses an engagement counter display string into a count.
///
/// Handles thousands separators and the `K`/`M` suffixes
/// (case-insensitive). Trailing non-numeric text ("likes") is ignored.
/// Unparseable input yields 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_metric(raw: &str) -> u64 {
    let lower = raw.trim().to_lowercase().replace([',', '\u{a0}'], "");
    let mut digits = String::new();
    let mut suffix = None;
    for c in lower.chars() {
        if c.is_ascii_digit() || c == '.' {
            digits.push(c);
        } else if !digits.is_empty() {
            if matches!(c, 'k' | 'm') {
                suffix = Some(c);
            }
            break;
        }
    }
    let multiplier = match suffix {
        Some('k') => 1_000.0,
        Some('m') => 1_000_000.0,
        _ => 1.0,
    };
    digits
        .parse::<f64>()
        .map_or(0, |value| (value * multiplier).max(0.0) as u64)
}

/// Parses a post timestamp display string.
///
/// Tries relative phrases first ("just now", "N seconds/minutes/hours/days
/// ago" with "a"/"an" meaning 1, "yesterday"), then a list of absolute
/// formats. Anything unrecognized resolves to `now` so the post is kept
/// rather than dropped.
#[must_use]
pub fn parse_post_date(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return now;
    }
    let lower = trimmed.to_lowercase();
    if lower == "just now" || lower == "now" {
        return now;
    }
    if lower == "yesterday" {
        return now - Duration::days(1);
    }
    if let Some(dt) = parse_relative(&lower, now) {
        return dt;
    }
    parse_absolute(trimmed).unwrap_or(now)
}

fn parse_relative(lower: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut words = lower.split_whitespace();
    let amount_word = words.next()?;
    let unit = words.next()?;
    if words.next()? != "ago" || words.next().is_some() {
        return None;
    }
    let amount: i64 = match amount_word {
        "a" | "an" => 1,
        other => other.parse().ok()?,
    };
    let delta = match unit.trim_end_matches('s') {
        "second" | "sec" => Duration::seconds(amount),
        "minute" | "min" => Duration::minutes(amount),
        "hour" | "hr" => Duration::hours(amount),
        "day" => Duration::days(amount),
        "week" | "wk" => Duration::weeks(amount),
        _ => return None,
    };
    Some(now - delta)
}

fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%d %b %Y", "%Y-%m-%d"];

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parses_plain_metric() {
        assert_eq!(parse_metric("42"), 42);
    }

    #[test]
    fn parses_metric_with_thousands_separator() {
        assert_eq!(parse_metric("3,456"), 3456);
    }

    #[test]
    fn parses_k_suffix() {
        assert_eq!(parse_metric("1.2K"), 1200);
        assert_eq!(parse_metric("15k"), 15_000);
    }

    #[test]
    fn parses_m_suffix() {
        assert_eq!(parse_metric("3M"), 3_000_000);
        assert_eq!(parse_metric("1.5m"), 1_500_000);
    }

    #[test]
    fn ignores_trailing_text() {
        assert_eq!(parse_metric("128 likes"), 128);
        assert_eq!(parse_metric("2.5K retweets"), 2500);
    }

    #[test]
    fn junk_metric_is_zero() {
        assert_eq!(parse_metric(""), 0);
        assert_eq!(parse_metric("lots"), 0);
        assert_eq!(parse_metric("..."), 0);
    }

    #[test]
    fn parses_just_now() {
        let now = reference_time();
        assert_eq!(parse_post_date("just now", now), now);
    }

    #[test]
    fn parses_relative_phrases() {
        let now = reference_time();
        assert_eq!(
            parse_post_date("30 seconds ago", now),
            now - Duration::seconds(30)
        );
        assert_eq!(
            parse_post_date("5 minutes ago", now),
            now - Duration::minutes(5)
        );
        assert_eq!(parse_post_date("2 hours ago", now), now - Duration::hours(2));
        assert_eq!(parse_post_date("3 days ago", now), now - Duration::days(3));
    }

    #[test]
    fn article_counts_as_one() {
        let now = reference_time();
        assert_eq!(parse_post_date("an hour ago", now), now - Duration::hours(1));
        assert_eq!(parse_post_date("a minute ago", now), now - Duration::minutes(1));
    }

    #[test]
    fn parses_yesterday() {
        let now = reference_time();
        assert_eq!(parse_post_date("yesterday", now), now - Duration::days(1));
    }

    #[test]
    fn parses_absolute_formats() {
        let now = reference_time();
        assert_eq!(
            parse_post_date("2024-01-15T14:30:00", now).to_string(),
            "2024-01-15 14:30:00 UTC"
        );
        assert_eq!(
            parse_post_date("2024-01-15 14:30", now).to_string(),
            "2024-01-15 14:30:00 UTC"
        );
        assert_eq!(
            parse_post_date("Jan 15, 2024", now).to_string(),
            "2024-01-15 00:00:00 UTC"
        );
        assert_eq!(
            parse_post_date("15 Jan 2024", now).to_string(),
            "2024-01-15 00:00:00 UTC"
        );
        assert_eq!(
            parse_post_date("2024-01-15", now).to_string(),
            "2024-01-15 00:00:00 UTC"
        );
    }

    #[test]
    fn unrecognized_date_falls_back_to_now() {
        let now = reference_time();
        assert_eq!(parse_post_date("sometime last spring", now), now);
        assert_eq!(parse_post_date("", now), now);
    }
}
