//! Linguistic resources: stopwords and the sentiment lexicon.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::NlpError;

/// Word polarities, roughly on a [-2, 2] scale before normalization.
const LEXICON: &[(&str, f64)] = &[
    // positive
    ("good", 1.0),
    ("great", 1.5),
    ("excellent", 2.0),
    ("amazing", 2.0),
    ("wonderful", 1.8),
    ("fantastic", 1.8),
    ("happy", 1.2),
    ("joy", 1.5),
    ("love", 2.0),
    ("like", 1.0),
    ("best", 1.5),
    ("better", 1.2),
    ("awesome", 1.8),
    ("perfect", 2.0),
    ("brilliant", 1.8),
    ("outstanding", 1.8),
    ("impressive", 1.5),
    ("excited", 1.5),
    ("thrilled", 1.8),
    ("grateful", 1.5),
    ("successful", 1.5),
    ("win", 1.5),
    ("useful", 1.0),
    ("helpful", 1.2),
    ("fast", 0.8),
    ("reliable", 1.2),
    ("elegant", 1.2),
    ("recommend", 1.3),
    // negative
    ("bad", -1.0),
    ("terrible", -2.0),
    ("awful", -2.0),
    ("horrible", -2.0),
    ("worst", -2.0),
    ("hate", -2.0),
    ("dislike", -1.0),
    ("poor", -1.2),
    ("disappointing", -1.5),
    ("sad", -1.2),
    ("angry", -1.5),
    ("upset", -1.2),
    ("frustrated", -1.5),
    ("annoying", -1.2),
    ("broken", -1.3),
    ("useless", -1.5),
    ("worthless", -1.8),
    ("slow", -0.8),
    ("buggy", -1.3),
    ("crash", -1.5),
    ("fail", -1.5),
    ("failure", -1.5),
    ("unreliable", -1.3),
    ("confusing", -1.0),
    ("bloated", -1.0),
    ("scam", -2.0),
];

/// Multipliers applied when the preceding token intensifies or dampens.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("incredibly", 2.0),
    ("absolutely", 2.0),
    ("completely", 1.8),
    ("totally", 1.8),
    ("really", 1.3),
    ("quite", 1.2),
    ("somewhat", 0.8),
    ("slightly", 0.7),
    ("barely", 0.5),
    ("hardly", 0.5),
];

/// Words that flip the polarity of what follows.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "neither", "nor", "cannot", "cant",
    "dont", "doesnt", "didnt", "wont", "isnt", "wasnt", "arent",
];

/// Stopwords plus the sentiment lexicon, loaded once and shared.
#[derive(Debug, Clone)]
pub struct NlpResources {
    /// Tokens dropped during tokenization.
    pub stopwords: HashSet<String>,
    /// Word polarity weights.
    pub lexicon: HashMap<String, f64>,
    /// Preceding-token multipliers.
    pub intensifiers: HashMap<String, f64>,
    /// Polarity-flipping tokens.
    pub negations: HashSet<String>,
}

impl NlpResources {
    /// Loads the English stopword list (optionally extended from a
    /// custom one-word-per-line file) and the built-in lexicon.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Io`] if the custom stopwords file cannot be
    /// read.
    pub fn load(custom_stopwords: Option<&Path>) -> Result<Self, NlpError> {
        let mut stopwords: HashSet<String> = stop_words::get(stop_words::LANGUAGE::English)
            .iter()
            .map(|word| word.to_lowercase())
            .collect();

        if let Some(path) = custom_stopwords {
            let contents = std::fs::read_to_string(path)?;
            let before = stopwords.len();
            stopwords.extend(
                contents
                    .lines()
                    .map(|line| line.trim().to_lowercase())
                    .filter(|line| !line.is_empty()),
            );
            log::info!(
                "loaded {} custom stopwords from {}",
                stopwords.len() - before,
                path.display()
            );
        }

        Ok(Self {
            stopwords,
            lexicon: LEXICON
                .iter()
                .map(|(word, weight)| ((*word).to_string(), *weight))
                .collect(),
            intensifiers: INTENSIFIERS
                .iter()
                .map(|(word, weight)| ((*word).to_string(), *weight))
                .collect(),
            negations: NEGATIONS.iter().map(|word| (*word).to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_builtin_resources() {
        let resources = NlpResources::load(None).unwrap();
        assert!(resources.stopwords.contains("the"));
        assert!(resources.lexicon.contains_key("love"));
        assert!(resources.lexicon["hate"] < 0.0);
        assert!(resources.negations.contains("not"));
    }

    #[test]
    fn extends_stopwords_from_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("social_pulse_custom_stopwords_test.txt");
        std::fs::write(&path, "zxqword\nanother\n\n").unwrap();
        let resources = NlpResources::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(resources.stopwords.contains("zxqword"));
        assert!(resources.stopwords.contains("another"));
    }

    #[test]
    fn missing_custom_file_is_an_error() {
        let missing = Path::new("/nonexistent/stopwords.txt");
        assert!(matches!(
            NlpResources::load(Some(missing)),
            Err(NlpError::Io(_))
        ));
    }
}
