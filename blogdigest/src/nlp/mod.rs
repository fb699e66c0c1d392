//! Text processing for the extractive summarizer: sentence and word tokenization,
//! stopword filtering, frequency scoring and sentence ranking.

pub mod extractive;
pub mod stopwords;
pub mod tokenizer;

pub use extractive::{ExtractiveSummarizer, FrequencyTable, ScoredSentence};
pub use stopwords::StopwordFilter;
pub use tokenizer::{split_sentences, tokenize, Sentence};
