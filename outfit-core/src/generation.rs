use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, error, instrument};

use crate::{
    Config,
    error::GenerationError,
    provider::{ProviderId, openweather::truncate_body},
};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Black-box text generation: one prompt in, one text out.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let api_key = config
            .provider_api_key(ProviderId::Gemini)
            .ok_or(GenerationError::MissingApiKey)?;

        Self::new(
            api_key.to_owned(),
            config.model.clone(),
            config.generation_timeout(),
        )
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Pull the generated text out of a response body.
///
/// Accepts a top-level `text` string, or `candidates[0].content.parts[*].text`
/// joined in order. Anything else is [`GenerationError::UnexpectedShape`].
pub fn extract_text(body: &Value) -> Result<String, GenerationError> {
    if let Some(text) = body.get("text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    let parts = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .filter(|parts| !parts.is_empty())
        .ok_or(GenerationError::UnexpectedShape)?;

    let fragments: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if fragments.is_empty() {
        return Err(GenerationError::UnexpectedShape);
    }

    Ok(fragments.concat())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Error calling generation service: {}", e);
                GenerationError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("Generation service returned status {}", status);
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            error!("Generation response is not JSON: {}", e);
            GenerationError::UnexpectedShape
        })?;

        let text = extract_text(&value).inspect_err(|_| {
            error!("Unexpected generation response format: {}", truncate_body(&body));
        })?;

        debug!("Generated {} characters", text.len());
        Ok(text)
    }
}
