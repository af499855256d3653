//! Google Gemini adapter. The generateContent API folds the system prompt
//! into `systemInstruction` and nests candidate text under
//! `candidates[0].content.parts[0].text`, so this adapter's shape is its
//! own again, like `claude.rs`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::adapter::Adapter;
use super::errors::AdapterError;
use super::types::{Completion, CompletionOptions, CompletionSource};

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Adapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, AdapterError> {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": user_prompt }] }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            },
        });
        if let Some(system) = system_prompt {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let response = self
            .client
            .post(self.endpoint())
            .timeout(std::time::Duration::from_millis(options.timeout_ms))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::TimeoutError(e.to_string())
                } else {
                    AdapterError::TransportError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AdapterError::ConfigError("invalid API key".to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AdapterError::RateLimitError("rate limit exceeded".to_string()));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AdapterError::UpstreamError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::ShapeError(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AdapterError::EmptyCompletionError);
        }

        Ok(Completion {
            text,
            source: CompletionSource::Primary,
        })
    }
}
