//! GLM adapter, grounded on `original_source/analyzer/clients/glm_client.py`.
//!
//! GLM's "thinking" models sometimes return an empty `content` alongside a
//! non-empty `reasoning_content` — the model's scratch reasoning rather than
//! its final answer. `glm_client.py` salvages that trace instead of treating
//! the call as a failure; this adapter does the same and tags the result
//! with [`CompletionSource::ReasoningTrace`] so the parser can apply the
//! lower-confidence extraction path spec.md §4.1 calls for.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::adapter::Adapter;
use super::errors::AdapterError;
use super::types::{Completion, CompletionOptions, CompletionSource};

const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const DEFAULT_MODEL: &str = "glm-4.5";

pub struct GlmAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GlmAdapter {
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
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[async_trait]
impl Adapter for GlmAdapter {
    fn name(&self) -> &str {
        "glm"
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

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::ShapeError("no choices in response".to_string()))?;

        let primary = choice.message.content.unwrap_or_default();
        if !primary.trim().is_empty() {
            return Ok(Completion {
                text: primary,
                source: CompletionSource::Primary,
            });
        }

        // Primary content empty — salvage the reasoning trace if present.
        let trace = choice.message.reasoning_content.unwrap_or_default();
        if !trace.trim().is_empty() {
            return Ok(Completion {
                text: trace,
                source: CompletionSource::ReasoningTrace,
            });
        }

        Err(AdapterError::EmptyCompletionError)
    }
}
