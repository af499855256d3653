//! Anthropic Claude adapter. The Messages API puts the system prompt in its
//! own top-level field rather than as a message, so this adapter's request
//! shape differs from the OpenAI-compatible ones in `openai.rs`/`deepseek.rs`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::adapter::Adapter;
use super::errors::AdapterError;
use super::types::{Completion, CompletionOptions, CompletionSource};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClaudeAdapter {
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
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Adapter for ClaudeAdapter {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, AdapterError> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": [{ "role": "user", "content": user_prompt }],
        });
        if let Some(system) = system_prompt {
            body["system"] = json!(system);
        }

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::ShapeError(e.to_string()))?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AdapterError::EmptyCompletionError);
        }

        Ok(Completion {
            text,
            source: CompletionSource::Primary,
        })
    }
}
