//! Text cleaning, tokenization, and keyword extraction.

use std::collections::HashMap;

use regex::Regex;
use social_pulse_database::queries;
use switchy_database::Database;

use crate::resources::NlpResources;
use crate::{KeywordScope, NlpError};

/// Keywords persisted per post.
const TOP_KEYWORDS: usize = 10;

/// Minimum token length kept after cleaning.
const MIN_TOKEN_LEN: usize = 3;

/// Longest token kept; matches the store's VARCHAR(128) text columns
/// so no extracted keyword or hashtag can fail its insert.
const MAX_TOKEN_LEN: usize = 128;

/// Cleans post text and extracts weighted keywords.
pub struct TextProcessor<'a> {
    resources: &'a NlpResources,
    url_regex: Regex,
    mention_regex: Regex,
    hashtag_regex: Regex,
    non_letter_regex: Regex,
    spaces_regex: Regex,
}

impl<'a> TextProcessor<'a> {
    /// Compiles the cleaning patterns against a loaded resource bundle.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Regex`] if a pattern fails to compile.
    pub fn new(resources: &'a NlpResources) -> Result<Self, NlpError> {
        Ok(Self {
            resources,
            url_regex: Regex::new(r"https?://\S+|www\.\S+")?,
            mention_regex: Regex::new(r"@\w+")?,
            hashtag_regex: Regex::new(r"#(\w+)")?,
            non_letter_regex: Regex::new(r"[^\p{L}\s]")?,
            spaces_regex: Regex::new(r"\s+")?,
        })
    }

    /// Normalizes raw post text: lowercase, URLs and @mentions removed,
    /// `#tag` reduced to `tag`, everything but letters and spaces
    /// dropped, whitespace collapsed.
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let no_urls = self.url_regex.replace_all(&lowered, " ");
        let no_mentions = self.mention_regex.replace_all(&no_urls, " ");
        let tags_as_words = self.hashtag_regex.replace_all(&no_mentions, "$1");
        let letters_only = self.non_letter_regex.replace_all(&tags_as_words, " ");
        let collapsed = self.spaces_regex.replace_all(&letters_only, " ");
        collapsed.trim().to_string()
    }

    /// Splits cleaned text into tokens, dropping stopwords and tokens
    /// shorter than three characters or longer than the store's column
    /// width.
    #[must_use]
    pub fn tokenize(&self, cleaned: &str) -> Vec<String> {
        cleaned
            .split_whitespace()
            .filter(|token| {
                (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&token.chars().count())
                    && !self.resources.stopwords.contains(*token)
            })
            .map(ToString::to_string)
            .collect()
    }

    /// The most frequent tokens of a post, capped at `limit`, ordered by
    /// frequency descending with ties broken alphabetically.
    #[must_use]
    pub fn top_keywords(&self, text: &str, limit: usize) -> Vec<(String, i64)> {
        let cleaned = self.clean_text(text);
        let mut counts: HashMap<String, i64> = HashMap::new();
        for token in self.tokenize(&cleaned) {
            *counts.entry(token).or_insert(0) += 1;
        }
        let mut ranked: Vec<(String, i64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Extracts and persists keywords for the posts in `scope`.
    ///
    /// Returns the number of posts that received keyword rows. For
    /// [`KeywordScope::One`] the post's existing rows are deleted first,
    /// so re-running replaces rather than duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Db`] if a store operation fails.
    pub async fn extract_keywords(
        &self,
        db: &dyn Database,
        scope: KeywordScope,
        limit: Option<u64>,
    ) -> Result<u64, NlpError> {
        let post_ids = match scope {
            KeywordScope::AllUnprocessed => queries::unprocessed_post_ids(db, limit).await?,
            KeywordScope::One(post_id) => {
                let removed = queries::delete_keywords_for_post(db, post_id).await?;
                if removed > 0 {
                    log::debug!("replaced {removed} existing keyword rows for post {post_id}");
                }
                vec![post_id]
            }
        };

        let mut processed = 0u64;
        for post_id in post_ids {
            let Some(content) = queries::get_post_content(db, post_id).await? else {
                log::warn!("post {post_id} vanished before keyword extraction");
                continue;
            };
            let keywords = self.top_keywords(&content, TOP_KEYWORDS);
            if keywords.is_empty() {
                log::debug!("post {post_id} has no extractable keywords");
                continue;
            }
            queries::insert_keywords(db, post_id, &keywords).await?;
            processed += 1;
        }
        log::info!("extracted keywords for {processed} posts");
        Ok(processed)
    }
}

/// Pulls `#tag` tokens out of raw (uncleaned) text, lowercased. Tags
/// wider than the store's column are dropped.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    // Compiled per call; hashtag extraction runs once per persisted
    // post, off the hot path.
    let Ok(regex) = Regex::new(r"#(\w+)") else {
        return Vec::new();
    };
    regex
        .captures_iter(text)
        .map(|captures| captures[1].to_lowercase())
        .filter(|tag| tag.chars().count() <= MAX_TOKEN_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> NlpResources {
        NlpResources::load(None).unwrap()
    }

    #[test]
    fn cleaning_strips_urls_mentions_and_punctuation() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        let cleaned = processor.clean_text(
            "Check https://example.com/x?y=1 out, @alice! #RustLang is great!!!",
        );
        assert_eq!(cleaned, "check out rustlang is great");
    }

    #[test]
    fn cleaning_lowercases_and_collapses_whitespace() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        assert_eq!(processor.clean_text("  MANY\t\nSpaces   HERE "), "many spaces here");
    }

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        let tokens = processor.tokenize("the quick ox is on fire");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"ox".to_string()));
        assert!(tokens.contains(&"quick".to_string()));
        assert!(tokens.contains(&"fire".to_string()));
    }

    #[test]
    fn top_keywords_ranks_by_frequency() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        let keywords =
            processor.top_keywords("rust rust rust compiler compiler borrow", 10);
        assert_eq!(keywords[0], ("rust".to_string(), 3));
        assert_eq!(keywords[1], ("compiler".to_string(), 2));
        assert_eq!(keywords[2], ("borrow".to_string(), 1));
    }

    #[test]
    fn top_keywords_respects_the_cap() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliett kilo lima";
        let keywords = processor.top_keywords(text, 10);
        assert_eq!(keywords.len(), 10);
    }

    #[test]
    fn top_keywords_breaks_ties_alphabetically() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        let keywords = processor.top_keywords("zebra apple zebra apple", 10);
        assert_eq!(keywords[0].0, "apple");
        assert_eq!(keywords[1].0, "zebra");
    }

    #[test]
    fn tokenize_drops_tokens_wider_than_the_store_column() {
        let resources = resources();
        let processor = TextProcessor::new(&resources).unwrap();
        let overlong = "x".repeat(MAX_TOKEN_LEN + 1);
        let widest = "y".repeat(MAX_TOKEN_LEN);
        let tokens = processor.tokenize(&format!("{overlong} {widest} normal"));
        assert!(!tokens.contains(&overlong));
        assert!(tokens.contains(&widest));
        assert!(tokens.contains(&"normal".to_string()));
    }

    #[test]
    fn overlong_hashtags_are_dropped() {
        let overlong = "z".repeat(MAX_TOKEN_LEN + 1);
        let tags = extract_hashtags(&format!("#keep #{overlong} #also"));
        assert_eq!(tags, vec!["keep", "also"]);
    }

    #[test]
    fn hashtags_are_extracted_lowercase() {
        let tags = extract_hashtags("Loving #RustLang and #AI today! #rustlang");
        assert_eq!(tags, vec!["rustlang", "ai", "rustlang"]);
    }

    #[test]
    fn text_without_hashtags_yields_none() {
        assert!(extract_hashtags("no tags here").is_empty());
    }
}
