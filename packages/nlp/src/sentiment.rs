//! Lexicon-based sentiment scoring.

use social_pulse_database::queries;
use switchy_database::Database;

use crate::resources::NlpResources;
use crate::{NlpError, SentimentScope};

/// Normalization constant; larger values pull compound scores toward 0.
const NORMALIZATION_ALPHA: f64 = 15.0;

/// How many preceding tokens a negation reaches across.
const NEGATION_WINDOW: usize = 3;

/// Scores post text on a [-1, 1] compound scale.
pub struct SentimentScorer<'a> {
    resources: &'a NlpResources,
}

impl<'a> SentimentScorer<'a> {
    /// Creates a scorer over a loaded resource bundle.
    #[must_use]
    pub const fn new(resources: &'a NlpResources) -> Self {
        Self { resources }
    }

    /// Computes the compound sentiment of `text`.
    ///
    /// Each lexicon hit contributes its polarity, boosted by an
    /// immediately preceding intensifier and flipped when a negation
    /// appears within the preceding three tokens. The weighted sum is
    /// normalized into [-1, 1]; text with no lexicon hits scores 0.
    #[must_use]
    pub fn score(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .to_lowercase()
            .split_whitespace()
            .map(|token| {
                token
                    .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                    .replace('\'', "")
            })
            .filter(|token| !token.is_empty())
            .collect();

        let mut total = 0.0f64;
        for (index, token) in tokens.iter().enumerate() {
            let Some(&polarity) = self.resources.lexicon.get(token) else {
                continue;
            };
            let mut weight = polarity;

            if index > 0 {
                if let Some(&boost) = self.resources.intensifiers.get(&tokens[index - 1]) {
                    weight *= boost;
                }
            }

            let window_start = index.saturating_sub(NEGATION_WINDOW);
            let negated = tokens[window_start..index]
                .iter()
                .any(|prior| self.resources.negations.contains(prior));
            if negated {
                weight = -weight;
            }

            total += weight;
        }

        normalize(total)
    }

    /// Scores and persists sentiment for the posts in `scope`.
    ///
    /// Returns the number of posts scored.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Db`] if a store operation fails.
    pub async fn score_posts(
        &self,
        db: &dyn Database,
        scope: SentimentScope,
        limit: Option<u64>,
    ) -> Result<u64, NlpError> {
        let post_ids = match scope {
            SentimentScope::AllUnscored => queries::unscored_post_ids(db, limit).await?,
            SentimentScope::One(post_id) => vec![post_id],
        };

        let mut scored = 0u64;
        for post_id in post_ids {
            let Some(content) = queries::get_post_content(db, post_id).await? else {
                log::warn!("post {post_id} vanished before sentiment scoring");
                continue;
            };
            let score = self.score(&content);
            queries::set_sentiment(db, post_id, score).await?;
            scored += 1;
        }
        log::info!("scored sentiment for {scored} posts");
        Ok(scored)
    }
}

/// Maps an unbounded weighted sum into [-1, 1].
fn normalize(total: f64) -> f64 {
    let normalized = total / NORMALIZATION_ALPHA.mul_add(1.0, total * total).sqrt();
    normalized.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> NlpResources {
        NlpResources::load(None).unwrap()
    }

    #[test]
    fn positive_text_scores_positive() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        assert!(scorer.score("this library is amazing and i love it") > 0.05);
    }

    #[test]
    fn negative_text_scores_negative() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        assert!(scorer.score("terrible release, everything is broken and slow") < -0.05);
    }

    #[test]
    fn neutral_text_scores_zero() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        let score = scorer.score("the compiler emits machine code");
        assert!(score.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_text_scores_zero() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        assert!(scorer.score("").abs() < f64::EPSILON);
    }

    #[test]
    fn negation_flips_polarity() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        let plain = scorer.score("this is good");
        let negated = scorer.score("this is not good");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn intensifier_boosts_magnitude() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        let plain = scorer.score("this is good");
        let boosted = scorer.score("this is very good");
        assert!(boosted > plain);
    }

    #[test]
    fn scores_stay_in_bounds() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        let gushing = "amazing ".repeat(200);
        let scathing = "horrible ".repeat(200);
        assert!(scorer.score(&gushing) <= 1.0);
        assert!(scorer.score(&scathing) >= -1.0);
        assert!(scorer.score(&gushing) > 0.9);
        assert!(scorer.score(&scathing) < -0.9);
    }

    #[test]
    fn punctuation_does_not_hide_lexicon_hits() {
        let resources = resources();
        let scorer = SentimentScorer::new(&resources);
        assert!(scorer.score("Amazing!") > 0.0);
        assert!(scorer.score("...terrible...") < 0.0);
    }
}
