//! Query functions for posts, keywords, and hashtags.
//!
//! All functions take `&dyn Database`, so they run equally inside a
//! transaction (`begin_transaction()` handles) and on a plain
//! connection.

use moosicbox_json_utils::database::ToValue as _;
use social_pulse_models::NewPost;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Hex digest identifying a post's content for deduplication.
#[must_use]
pub fn content_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Inserts a post candidate, skipping duplicates via the unique
/// `(platform, content_hash)` index.
///
/// Returns the new row's id, or `None` when an identical post already
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_post(db: &dyn Database, post: &NewPost) -> Result<Option<i64>, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO posts (
                content, content_hash, platform, created_at,
                likes, shares, source_url, author
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (platform, content_hash) DO NOTHING
             RETURNING id",
            &[
                DatabaseValue::String(post.content.clone()),
                DatabaseValue::String(content_hash(&post.content)),
                DatabaseValue::String(post.platform.clone()),
                DatabaseValue::DateTime(post.created_at.naive_utc()),
                DatabaseValue::Int64(post.likes),
                DatabaseValue::Int64(post.shares),
                post.source_url
                    .as_ref()
                    .map_or(DatabaseValue::Null, |u| DatabaseValue::String(u.clone())),
                post.author
                    .as_ref()
                    .map_or(DatabaseValue::Null, |a| DatabaseValue::String(a.clone())),
            ],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };
    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse inserted post id: {e}"),
    })?;
    Ok(Some(id))
}

/// Ids of posts with no keyword rows yet, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn unprocessed_post_ids(
    db: &dyn Database,
    limit: Option<u64>,
) -> Result<Vec<i64>, DbError> {
    let mut sql = "SELECT p.id FROM posts p
         WHERE NOT EXISTS (SELECT 1 FROM keywords k WHERE k.post_id = p.id)
         ORDER BY p.id"
        .to_string();
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    let rows = db.query_raw_params(&sql, &[]).await?;
    collect_ids(&rows)
}

/// Ids of posts whose sentiment has not been scored yet, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn unscored_post_ids(
    db: &dyn Database,
    limit: Option<u64>,
) -> Result<Vec<i64>, DbError> {
    let mut sql = "SELECT id FROM posts WHERE sentiment_score IS NULL ORDER BY id".to_string();
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    let rows = db.query_raw_params(&sql, &[]).await?;
    collect_ids(&rows)
}

/// Fetches a single post's content.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_post_content(db: &dyn Database, post_id: i64) -> Result<Option<String>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT content FROM posts WHERE id = $1",
            &[DatabaseValue::Int64(post_id)],
        )
        .await?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    let content: String = row.to_value("content").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse post content: {e}"),
    })?;
    Ok(Some(content))
}

/// Inserts keyword rows for a post.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_keywords(
    db: &dyn Database,
    post_id: i64,
    keywords: &[(String, i64)],
) -> Result<(), DbError> {
    for (text, frequency) in keywords {
        db.exec_raw_params(
            "INSERT INTO keywords (post_id, text, frequency) VALUES ($1, $2, $3)",
            &[
                DatabaseValue::Int64(post_id),
                DatabaseValue::String(text.clone()),
                DatabaseValue::Int64(*frequency),
            ],
        )
        .await?;
    }
    Ok(())
}

/// Removes all keyword rows for a post. Used when re-extracting a
/// specific post's keywords.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_keywords_for_post(db: &dyn Database, post_id: i64) -> Result<u64, DbError> {
    Ok(db
        .exec_raw_params(
            "DELETE FROM keywords WHERE post_id = $1",
            &[DatabaseValue::Int64(post_id)],
        )
        .await?)
}

/// Stores a post's sentiment score.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn set_sentiment(db: &dyn Database, post_id: i64, score: f64) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE posts SET sentiment_score = $1 WHERE id = $2",
        &[DatabaseValue::Real64(score), DatabaseValue::Int64(post_id)],
    )
    .await?;
    Ok(())
}

/// Inserts or finds a hashtag by its normalized text, returning its id.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn upsert_hashtag(db: &dyn Database, text: &str) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO hashtags (text) VALUES ($1)
             ON CONFLICT (text) DO UPDATE SET text = EXCLUDED.text
             RETURNING id",
            &[DatabaseValue::String(text.to_string())],
        )
        .await?;
    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get hashtag id from upsert".to_string(),
    })?;
    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse hashtag id: {e}"),
    })?;
    Ok(id)
}

/// Associates a post with a hashtag, skipping existing links.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn link_post_hashtag(
    db: &dyn Database,
    post_id: i64,
    hashtag_id: i64,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO post_hashtags (post_id, hashtag_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
        &[
            DatabaseValue::Int64(post_id),
            DatabaseValue::Int64(hashtag_id),
        ],
    )
    .await?;
    Ok(())
}

fn collect_ids(rows: &[switchy_database::Row]) -> Result<Vec<i64>, DbError> {
    rows.iter()
        .map(|row| {
            row.to_value("id").map_err(|e| DbError::Conversion {
                message: format!("Failed to parse post id: {e}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_hex_md5() {
        assert_eq!(content_hash("hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn content_hash_distinguishes_content() {
        assert_ne!(content_hash("post a"), content_hash("post b"));
        assert_eq!(content_hash("same"), content_hash("same"));
    }
}
