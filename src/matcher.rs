use crate::catalog::{Catalog, Intent};
use crate::normalizer::{Normalizer, TokenSet};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

/// Minimum similarity for a non-fallback intent to be accepted (inclusive).
pub const CONFIDENCE_THRESHOLD: f64 = 0.25;

/// Reply used when an intent is absent or has nothing to say.
pub const APOLOGY: &str = "I'm sorry, I'm having trouble understanding right now.";

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("similarity threshold must be within [0.0, 1.0], got {0}")]
pub struct InvalidThreshold(pub f64);

pub fn is_valid_threshold(threshold: f64) -> bool {
    (0.0..=1.0).contains(&threshold)
}

/// Set-overlap similarity: |a ∩ b| / |a ∪ b|, 0.0 when both are empty.
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// The intent chosen for an input together with the score that selected it.
///
/// `score` is the best similarity found, even when the fallback was returned
/// because it fell short of the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub intent: &'a Intent,
    pub score: f64,
}

impl Classification<'_> {
    pub fn is_fallback(&self) -> bool {
        self.intent.is_fallback()
    }
}

pub struct Matcher {
    catalog: Arc<Catalog>,
    normalizer: Arc<dyn Normalizer>,
    // pattern_tokens[i][j] is the normalized j-th pattern of intent i.
    pattern_tokens: Vec<Vec<TokenSet>>,
    threshold: f64,
}

impl Matcher {
    pub fn new(catalog: Arc<Catalog>, normalizer: Arc<dyn Normalizer>) -> Self {
        let pattern_tokens = catalog
            .intents()
            .iter()
            .map(|intent| {
                intent
                    .patterns
                    .iter()
                    .map(|pattern| Self::tokens(normalizer.as_ref(), pattern))
                    .collect()
            })
            .collect();

        Self {
            catalog,
            normalizer,
            pattern_tokens,
            threshold: CONFIDENCE_THRESHOLD,
        }
    }

    /// Overrides the acceptance threshold. It must be a finite value in
    /// `[0.0, 1.0]`, the range of a Jaccard score.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, InvalidThreshold> {
        if !is_valid_threshold(threshold) {
            return Err(InvalidThreshold(threshold));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn tokens(normalizer: &dyn Normalizer, text: &str) -> TokenSet {
        normalizer.normalize(text).unwrap_or_else(|e| {
            log::warn!("Normalization of {:?} failed, treating as empty: {}", text, e);
            TokenSet::new()
        })
    }

    pub fn classify(&self, text: &str) -> &Intent {
        self.classify_scored(text).intent
    }

    pub fn classify_scored(&self, text: &str) -> Classification<'_> {
        let user_tokens = Self::tokens(self.normalizer.as_ref(), text);
        if user_tokens.is_empty() {
            return Classification {
                intent: self.catalog.fallback(),
                score: 0.0,
            };
        }

        let mut best_intent: Option<&Intent> = None;
        let mut best_score = 0.0;
        for (intent, patterns) in self.catalog.intents().iter().zip(&self.pattern_tokens) {
            let score = patterns
                .iter()
                .map(|pattern| jaccard(&user_tokens, pattern))
                .fold(0.0, f64::max);

            // Strict comparison: on ties the earlier intent keeps the lead.
            if score > best_score {
                best_score = score;
                best_intent = Some(intent);
            }
        }

        match best_intent {
            Some(intent) if best_score >= self.threshold => {
                log::debug!("Matched intent '{}' with score {:.3}", intent.tag, best_score);
                Classification {
                    intent,
                    score: best_score,
                }
            }
            _ => {
                log::debug!(
                    "No intent reached {:.2} (best {:.3}), using fallback",
                    self.threshold,
                    best_score
                );
                Classification {
                    intent: self.catalog.fallback(),
                    score: best_score,
                }
            }
        }
    }

    /// Picks one of the intent's responses uniformly at random.
    pub fn respond<R: Rng + ?Sized>(intent: Option<&Intent>, rng: &mut R) -> String {
        intent
            .and_then(|intent| intent.responses.choose(rng))
            .cloned()
            .unwrap_or_else(|| APOLOGY.to_string())
    }

    pub fn respond_random(intent: Option<&Intent>) -> String {
        Self::respond(intent, &mut rand::thread_rng())
    }
}
