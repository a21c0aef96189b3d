use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use thiserror::Error;

/// Case-folded base forms of the content words of a text.
pub type TokenSet = HashSet<String>;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("language model unavailable: {0}")]
    Unavailable(String),

    #[error("normalization failed: {0}")]
    Failed(String),
}

/// Turns free text into a comparable set of tokens.
///
/// Implementations must be deterministic: the same text always yields the same
/// set. An empty set is a valid answer meaning "nothing to compare".
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Result<TokenSet, NormalizeError>;
}

/// A large, but not exhaustive, list of common English stop words.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an",
    "and", "any", "anyway", "are", "aren't", "as", "at", "be", "because", "been",
    "before", "being", "below", "between", "both", "but", "by", "can", "can't",
    "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't", "doing",
    "don't", "down", "during", "each", "else", "ever", "every", "few", "for", "from",
    "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having", "he",
    "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
    "himself", "his", "how", "how's", "however", "i", "i'd", "i'll", "i'm", "i've",
    "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just",
    "let's", "may", "me", "might", "more", "most", "must", "mustn't", "my", "myself",
    "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "ought",
    "our", "ours", "ourselves", "out", "over", "own", "same", "shall", "shan't",
    "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
    "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then",
    "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've",
    "this", "those", "through", "to", "too", "under", "until", "up", "very", "was",
    "wasn't", "we", "we'd", "we'll", "we're", "we've", "were", "weren't", "what",
    "what's", "whatever", "when", "when's", "whenever", "where", "where's",
    "wherever", "which", "while", "who", "who's", "whom", "why", "why's", "will",
    "with", "won't", "would", "wouldn't", "yet", "you", "you'd", "you'll", "you're",
    "you've", "your", "yours", "yourself", "yourselves",
];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

// Words with optional apostrophe suffixes, so "don't" stays one token.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}]+)*").expect("word regex is valid"));

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}

/// English normalizer: lower-case, split into words, drop stop words and
/// punctuation, then reduce each word with the Snowball English stemmer.
pub struct EnglishNormalizer {
    stemmer: Stemmer,
}

impl EnglishNormalizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    fn tokenize(text: &str) -> Vec<String> {
        let lowered = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
        WORD_RE
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for EnglishNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for EnglishNormalizer {
    fn normalize(&self, text: &str) -> Result<TokenSet, NormalizeError> {
        Ok(Self::tokenize(text)
            .into_iter()
            .filter(|word| !is_stop_word(word))
            .map(|word| self.stemmer.stem(&word).into_owned())
            .filter(|stem| !stem.is_empty())
            .collect())
    }
}
