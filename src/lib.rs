//! Intent router: matches free-text messages against a catalog of intents and
//! answers from canned responses, handing selected intents to a generative
//! model for an elaborated answer.

pub mod catalog;
pub mod conversation;
pub mod generator;
pub mod history;
pub mod matcher;
pub mod normalizer;
pub mod server;
pub mod settings;

pub use catalog::{Catalog, CatalogError, Intent, FALLBACK_TAG};
pub use conversation::{Assistant, DispatchPolicy, Reply, ReplySource};
pub use generator::{GeminiGenerator, Generator, GeneratorError};
pub use matcher::{jaccard, Classification, InvalidThreshold, Matcher, APOLOGY, CONFIDENCE_THRESHOLD};
pub use normalizer::{EnglishNormalizer, NormalizeError, Normalizer, TokenSet};
