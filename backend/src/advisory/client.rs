use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::AdvisoryPrompt;

pub const FALLBACK_ANSWER: &str =
    "Sorry, I could not process your request at the moment. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("Advisory service is not configured")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Advisory service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Advisory service returned no text")]
    EmptyResponse,
}

/// A stateless single-shot text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &AdvisoryPrompt) -> Result<String, AdvisoryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryAnswer {
    Answered(String),
    Fallback,
}

impl AdvisoryAnswer {
    pub fn text(&self) -> &str {
        match self {
            AdvisoryAnswer::Answered(text) => text,
            AdvisoryAnswer::Fallback => FALLBACK_ANSWER,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AdvisoryAnswer::Fallback)
    }
}

/// Sends the prompt and substitutes the fallback on any failure.
pub async fn ask(generator: &dyn TextGenerator, prompt: &AdvisoryPrompt) -> AdvisoryAnswer {
    match generator.generate(prompt).await {
        Ok(text) => AdvisoryAnswer::Answered(text),
        Err(e) => {
            log::error!("Advisory request failed: {}", e);
            AdvisoryAnswer::Fallback
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Google Gemini `generateContent` over REST.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AdvisoryError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &AdvisoryPrompt) -> Result<String, AdvisoryError> {
        if self.config.api_key.is_empty() {
            return Err(AdvisoryError::NotConfigured);
        }

        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart {
                    text: prompt.as_str(),
                }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.into_text().ok_or(AdvisoryError::EmptyResponse)
    }
}
