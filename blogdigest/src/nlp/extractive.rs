//! Frequency-weighted extractive summarization.
//!
//! Every sentence is scored by the summed document frequency of its content words; the
//! highest-scoring sentences are kept and put back in document order.

use std::collections::HashMap;
use tracing::debug;

use super::stopwords::StopwordFilter;
use super::tokenizer::{split_sentences, tokenize, Sentence};

/// Occurrence count of each non-stopword token across a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, usize>,
}

impl FrequencyTable {
    /// Count already-normalized tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = HashMap::new();
        for token in tokens {
            *counts.entry(token.into()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Tokenize the whole document and count every token that is not a stopword.
    pub fn build(text: &str, stopwords: &StopwordFilter) -> Self {
        Self::from_tokens(tokenize(text).into_iter().filter(|t| !stopwords.is_stopword(t)))
    }

    /// Count for `token`, 0 when absent
    pub fn get(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// A sentence position paired with its score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredSentence {
    pub index: usize,
    pub score: usize,
}

/// Score each sentence by summing the table counts of its tokens.
pub fn score_sentences(sentences: &[Sentence<'_>], table: &FrequencyTable) -> Vec<ScoredSentence> {
    sentences
        .iter()
        .map(|sentence| ScoredSentence {
            index: sentence.index,
            score: tokenize(sentence.text).iter().map(|t| table.get(t)).sum(),
        })
        .collect()
}

/// Indices of the `k` best sentences, in ascending order.
///
/// Higher scores win; equal scores go to the earlier sentence.
pub fn select_top(scored: &[ScoredSentence], k: usize) -> Vec<usize> {
    let mut ranked = scored.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
    let mut selected: Vec<usize> = ranked.into_iter().take(k).map(|s| s.index).collect();
    selected.sort_unstable();
    selected
}

/// Extractive summarizer with a fixed stopword set and summary length
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    stopwords: StopwordFilter,
    sentences: usize,
}

impl ExtractiveSummarizer {
    pub fn new(stopwords: StopwordFilter, sentences: usize) -> Self {
        Self { stopwords, sentences }
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences
    }

    /// Sentence indices chosen for `text`, ascending.
    pub fn select(&self, text: &str) -> Vec<usize> {
        let sentences = split_sentences(text);
        self.select_from(text, &sentences)
    }

    fn select_from(&self, text: &str, sentences: &[Sentence<'_>]) -> Vec<usize> {
        if sentences.len() <= self.sentences {
            return (0..sentences.len()).collect();
        }
        let table = FrequencyTable::build(text, &self.stopwords);
        debug!(sentences = sentences.len(), distinct_words = table.len(), "frequency table built");
        if table.is_empty() {
            // every score is zero
            return (0..self.sentences).collect();
        }
        select_top(&score_sentences(sentences, &table), self.sentences)
    }

    /// Summary of `text`: the chosen sentences joined with single spaces.
    /// Empty input gives an empty summary.
    pub fn summarize(&self, text: &str) -> String {
        let sentences = split_sentences(text);
        self.select_from(text, &sentences)
            .into_iter()
            .map(|i| sentences[i].text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETS: &str = "Cats are great. Dogs are great too. Birds can fly. Fish swim well.";

    fn pet_stopwords() -> StopwordFilter {
        StopwordFilter::from_words(["are", "too", "can", "well"])
    }

    #[test]
    fn frequency_table_excludes_stopwords_and_ignores_case() {
        let table = FrequencyTable::build("Great cats. GREAT dogs are great, 42 times!", &pet_stopwords());
        assert_eq!(table.get("great"), 3);
        assert_eq!(table.get("cats"), 1);
        assert_eq!(table.get("are"), 0);
        assert_eq!(table.get("42"), 0);
        assert_eq!(table.get("times"), 1);
    }

    #[test]
    fn picks_the_sentences_with_the_most_frequent_words() {
        let summarizer = ExtractiveSummarizer::new(pet_stopwords(), 2);
        assert_eq!(summarizer.select(PETS), vec![0, 1]);
        assert_eq!(summarizer.summarize(PETS), "Cats are great. Dogs are great too.");
    }

    #[test]
    fn pet_scores_match_hand_count() {
        let table = FrequencyTable::build(PETS, &pet_stopwords());
        assert_eq!(table.get("great"), 2);
        let scored = score_sentences(&split_sentences(PETS), &table);
        let scores: Vec<usize> = scored.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![3, 3, 2, 2]);
    }

    #[test]
    fn selection_is_returned_in_document_order() {
        let text = "Alpha beta. Gamma delta. Rust rust rust rust. Epsilon zeta. Rust rust rust.";
        let summarizer = ExtractiveSummarizer::new(StopwordFilter::empty(), 2);
        assert_eq!(summarizer.select(text), vec![2, 4]);
        assert_eq!(summarizer.summarize(text), "Rust rust rust rust. Rust rust rust.");
    }

    #[test]
    fn short_documents_are_returned_whole() {
        let summarizer = ExtractiveSummarizer::new(pet_stopwords(), 10);
        assert_eq!(summarizer.summarize(PETS), PETS);
        assert_eq!(summarizer.select(PETS), vec![0, 1, 2, 3]);

        let exact = ExtractiveSummarizer::new(pet_stopwords(), 4);
        assert_eq!(exact.summarize(PETS), PETS);
    }

    #[test]
    fn empty_document_gives_empty_summary() {
        let summarizer = ExtractiveSummarizer::new(pet_stopwords(), 3);
        assert_eq!(summarizer.summarize(""), "");
        assert!(summarizer.select("").is_empty());
    }

    #[test]
    fn zero_sentences_requested() {
        let summarizer = ExtractiveSummarizer::new(pet_stopwords(), 0);
        assert_eq!(summarizer.summarize(PETS), "");
    }

    #[test]
    fn all_zero_scores_fall_back_to_leading_sentences() {
        let stopwords = StopwordFilter::from_words(["the", "a", "is", "it", "was", "and"]);
        let text = "It is. The a. It was. And the.";
        let summarizer = ExtractiveSummarizer::new(stopwords, 2);
        assert_eq!(summarizer.select(text), vec![0, 1]);
        assert_eq!(summarizer.summarize(text), "It is. The a.");
    }

    #[test]
    fn ties_prefer_earlier_sentences() {
        let scored = vec![
            ScoredSentence { index: 0, score: 1 },
            ScoredSentence { index: 1, score: 5 },
            ScoredSentence { index: 2, score: 1 },
            ScoredSentence { index: 3, score: 5 },
            ScoredSentence { index: 4, score: 1 },
        ];
        assert_eq!(select_top(&scored, 3), vec![0, 1, 3]);
        assert_eq!(select_top(&scored, 0), Vec::<usize>::new());
        assert_eq!(select_top(&scored, 9), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let text = "One two three. Three two one. Two one three. Four five six. Six five four.";
        let summarizer = ExtractiveSummarizer::new(StopwordFilter::empty(), 2);
        let first = summarizer.summarize(text);
        for _ in 0..10 {
            assert_eq!(summarizer.summarize(text), first);
        }
    }

    #[test]
    fn selected_indices_stay_in_range() {
        let text = "A cat sat. The dog ran far away. Birds sing loudly at dawn. Rain fell. Sun rose.";
        let sentence_count = split_sentences(text).len();
        for k in 0..8 {
            let summarizer = ExtractiveSummarizer::new(StopwordFilter::empty(), k);
            let selected = summarizer.select(text);
            assert_eq!(selected.len(), k.min(sentence_count));
            assert!(selected.iter().all(|&i| i < sentence_count));
            assert!(selected.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
