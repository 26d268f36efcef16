//! In-code schema creation.
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so `ensure_schema`
//! can run on every startup and on the `init-db` command.

use switchy_database::Database;

use crate::DbError;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        content TEXT NOT NULL,
        content_hash VARCHAR(32) NOT NULL,
        platform VARCHAR(64) NOT NULL,
        created_at TIMESTAMP NOT NULL,
        likes BIGINT NOT NULL DEFAULT 0,
        shares BIGINT NOT NULL DEFAULT 0,
        sentiment_score DOUBLE PRECISION,
        source_url TEXT,
        author VARCHAR(255),
        collected_at TIMESTAMP NOT NULL DEFAULT NOW()
    )",
    // Dedup identity. Concurrent collectors race on the same content;
    // the unique index makes the second insert a no-op.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_posts_platform_content_hash
        ON posts (platform, content_hash)",
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_posts_platform ON posts (platform)",
    "CREATE INDEX IF NOT EXISTS idx_posts_sentiment_score
        ON posts (sentiment_score)",
    "CREATE TABLE IF NOT EXISTS keywords (
        id BIGSERIAL PRIMARY KEY,
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        text VARCHAR(128) NOT NULL,
        frequency BIGINT NOT NULL DEFAULT 1
    )",
    "CREATE INDEX IF NOT EXISTS idx_keywords_post_id ON keywords (post_id)",
    "CREATE INDEX IF NOT EXISTS idx_keywords_text ON keywords (text)",
    "CREATE TABLE IF NOT EXISTS hashtags (
        id BIGSERIAL PRIMARY KEY,
        text VARCHAR(128) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS post_hashtags (
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        hashtag_id BIGINT NOT NULL REFERENCES hashtags(id) ON DELETE CASCADE,
        PRIMARY KEY (post_id, hashtag_id)
    )",
];

/// Creates all tables and indexes if they do not already exist.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    for statement in SCHEMA_STATEMENTS {
        db.exec_raw(statement).await?;
    }
    log::info!("Database schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_statements_are_idempotent() {
        for statement in SCHEMA_STATEMENTS {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {statement}"
            );
        }
    }
}
