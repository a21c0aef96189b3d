use crate::generator::{Generator, GENERATOR_APOLOGY};
use crate::matcher::Matcher;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Intents answered by the generative model, grounded on the catalog response.
pub const DEFAULT_COMPLEX_TAGS: &[&str] = &[
    "creator",
    "creator_details",
    "who_are_you",
    "capabilities",
    "company_info",
    "hours",
    "location",
    "origin",
    "payments",
    "returns",
    "shipping",
    "tracking",
    "order_management",
    "discounts",
    "technical_support",
    "account_issues",
    "privacy_policy",
    "product_info",
    "feedback",
    "human_handoff",
    "billing_issues",
];

pub const DEFAULT_PERSONA: &str = "Humongous AI";

/// Marks replies written by the generative model.
const GENERATED_PREFIX: &str = "\u{2728} ";

/// Which intents get an elaborated answer instead of the canned one.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    complex_tags: HashSet<String>,
}

impl DispatchPolicy {
    pub fn new<I, S>(complex_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            complex_tags: complex_tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_complex(&self, tag: &str) -> bool {
        self.complex_tags.contains(tag)
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLEX_TAGS.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Catalog,
    Generated,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub intent: String,
    pub score: f64,
    pub text: String,
    pub source: ReplySource,
}

pub fn grounded_prompt(persona: &str, context: &str, user_text: &str) -> String {
    format!(
        "You are {persona}, a friendly assistant.\n\
         Answer using only this context: \"{context}\"\n\
         User asked: \"{user_text}\"\n"
    )
}

/// Answers user messages: classify, then either reply from the catalog or
/// hand the catalog answer to the generative model as grounding context.
pub struct Assistant {
    matcher: Arc<Matcher>,
    generator: Arc<dyn Generator>,
    policy: DispatchPolicy,
    persona: String,
}

impl Assistant {
    pub fn new(
        matcher: Arc<Matcher>,
        generator: Arc<dyn Generator>,
        policy: DispatchPolicy,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            matcher,
            generator,
            policy,
            persona: persona.into(),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn greeting(&self) -> String {
        self.greeting_with(&mut rand::thread_rng())
    }

    /// Reply to "hello" from the catalog, or a persona greeting when the
    /// catalog has nothing better than its fallback.
    pub fn greeting_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let intent = self.matcher.classify("hello");
        if intent.is_fallback() {
            return format!("Hello! I'm {}.", self.persona);
        }
        Matcher::respond(Some(intent), rng)
    }

    pub async fn reply(&self, user_text: &str) -> Reply {
        // ThreadRng is not Send, so the pick happens before any await.
        let (intent, score, canned) = {
            let classification = self.matcher.classify_scored(user_text);
            let canned = Matcher::respond_random(Some(classification.intent));
            (classification.intent.tag.clone(), classification.score, canned)
        };
        self.dispatch(user_text, intent, score, canned).await
    }

    /// Same as [`Assistant::reply`] with a caller supplied random source.
    pub async fn reply_with<R: Rng + ?Sized>(&self, user_text: &str, rng: &mut R) -> Reply {
        let classification = self.matcher.classify_scored(user_text);
        let canned = Matcher::respond(Some(classification.intent), rng);
        let intent = classification.intent.tag.clone();
        self.dispatch(user_text, intent, classification.score, canned)
            .await
    }

    async fn dispatch(&self, user_text: &str, intent: String, score: f64, canned: String) -> Reply {
        if !self.policy.is_complex(&intent) {
            return Reply {
                intent,
                score,
                text: canned,
                source: ReplySource::Catalog,
            };
        }

        let prompt = grounded_prompt(&self.persona, &canned, user_text);
        let generated = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Generative model error for intent '{}': {}", intent, e);
                GENERATOR_APOLOGY.to_string()
            }
        };

        Reply {
            intent,
            score,
            text: format!("{GENERATED_PREFIX}{generated}"),
            source: ReplySource::Generated,
        }
    }
}
