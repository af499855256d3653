//! OpenAI adapter, grounded on `ai::cloud_provider::CloudAiProvider::call_openai`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::adapter::Adapter;
use super::errors::AdapterError;
use super::types::{Completion, CompletionOptions, CompletionSource};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Adapter for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, AdapterError> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": user_prompt }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
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
        if status == reqwest::StatusCode::UNAUTHORIZED {
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::ShapeError(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
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
