//! Stopword filtering
//!
//! Built-in lists come from the `stop-words` crate. A custom list can be loaded from a
//! file instead. Whatever fails to load degrades to an empty filter: summaries are still
//! produced, only without stopword suppression.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use stop_words::{get, LANGUAGE};
use tracing::{debug, warn};

/// A case-insensitive set of words excluded from scoring
#[derive(Debug, Clone, Default)]
pub struct StopwordFilter {
    /// Stored lowercase
    words: HashSet<String>,
}

impl StopwordFilter {
    /// An empty filter (no filtering)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Built-in list for a language code, or `None` if the language has no list.
    pub fn builtin(language: &str) -> Option<Self> {
        let lang = match language.trim().to_lowercase().as_str() {
            "en" | "english" => LANGUAGE::English,
            "de" | "german" => LANGUAGE::German,
            "fr" | "french" => LANGUAGE::French,
            "es" | "spanish" => LANGUAGE::Spanish,
            "it" | "italian" => LANGUAGE::Italian,
            "pt" | "portuguese" => LANGUAGE::Portuguese,
            "nl" | "dutch" => LANGUAGE::Dutch,
            "ru" | "russian" => LANGUAGE::Russian,
            "sv" | "swedish" => LANGUAGE::Swedish,
            "no" | "norwegian" => LANGUAGE::Norwegian,
            "da" | "danish" => LANGUAGE::Danish,
            "fi" | "finnish" => LANGUAGE::Finnish,
            "hu" | "hungarian" => LANGUAGE::Hungarian,
            "tr" | "turkish" => LANGUAGE::Turkish,
            "pl" | "polish" => LANGUAGE::Polish,
            "ar" | "arabic" => LANGUAGE::Arabic,
            _ => return None,
        };
        Some(Self::from_words(get(lang).iter().map(|s| s.to_string())))
    }

    /// Read a list with one word per line; blank lines and `#` comments are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stopword file: {}", path.display()))?;
        Ok(Self::from_words(
            data.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    /// Load the stopwords for a run, failing open to an empty filter.
    ///
    /// A custom file, when given, replaces the built-in list for `language`.
    pub fn load(language: &str, custom_file: Option<&Path>) -> Self {
        let filter = match custom_file {
            Some(path) => match Self::from_file(path) {
                Ok(filter) => filter,
                Err(e) => {
                    warn!(error = %e, "stopword data unavailable, continuing without stopword filtering");
                    return Self::empty();
                }
            },
            None => match Self::builtin(language) {
                Some(filter) => filter,
                None => {
                    warn!(%language, "no stopword list for language, continuing without stopword filtering");
                    return Self::empty();
                }
            },
        };
        debug!(count = filter.len(), %language, "stopwords loaded");
        filter
    }

    /// Check if a word is a stopword (case-insensitive)
    pub fn is_stopword(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        let lower = word.to_lowercase();
        lower != word && self.words.contains(&lower)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
