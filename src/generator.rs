use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro-latest:generateContent";

/// Shown to the user when the generative model cannot answer.
pub const GENERATOR_APOLOGY: &str = "AI service temporarily unavailable.";

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("missing API key for the generative model")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("unexpected model response: {0}")]
    Response(String),
}

/// Text-in/text-out generative model.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

impl From<reqwest::Error> for GeneratorError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs may carry credentials, keep them out of logs.
        GeneratorError::Http(e.without_url())
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

impl GeminiResponse {
    fn into_text(self) -> Result<String, GeneratorError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| GeneratorError::Response("no candidates in response".to_string()))
    }
}

pub struct GeminiGenerator {
    api_url: String,
    api_key: Option<String>,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let api_url = api_url.into();
        let api_key = api_key.filter(|key| !key.is_empty());
        let client = Client::builder().timeout(timeout).build()?;
        if api_key.is_none() {
            log::warn!("No generative model API key configured, elaborated answers are disabled");
        }
        log::info!("Generative model client initialized ({})", api_url);
        Ok(Self {
            api_url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let api_key = self.api_key.as_deref().ok_or(GeneratorError::MissingApiKey)?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GeminiResponse>()
            .await?;

        response.into_text()
    }
}
