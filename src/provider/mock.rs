//! In-memory adapter for tests, grounded on `ai::mock_provider::MockProvider`.
//!
//! Responses are registered by a key derived from the prompt (the first 50
//! characters, same truncation the teacher's `job_key()` uses) and are
//! consumed from a queue so a test can script a sequence of successes and
//! failures for the same prompt prefix, e.g. to exercise retry/fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::adapter::Adapter;
use super::errors::AdapterError;
use super::types::{Completion, CompletionOptions, CompletionSource};

#[derive(Debug, Clone)]
pub enum MockOutcome {
    Text(String),
    ReasoningTrace(String),
    Fail(MockFailure),
}

#[derive(Debug, Clone)]
pub enum MockFailure {
    Transport,
    Timeout,
    RateLimit,
    Upstream(u16),
    Shape,
    Empty,
}

impl MockFailure {
    fn into_error(self) -> AdapterError {
        match self {
            MockFailure::Transport => AdapterError::TransportError("mock transport failure".into()),
            MockFailure::Timeout => AdapterError::TimeoutError("mock timeout".into()),
            MockFailure::RateLimit => AdapterError::RateLimitError("mock rate limit".into()),
            MockFailure::Upstream(status) => AdapterError::UpstreamError {
                status,
                body: "mock upstream error".into(),
            },
            MockFailure::Shape => AdapterError::ShapeError("mock shape error".into()),
            MockFailure::Empty => AdapterError::EmptyCompletionError,
        }
    }
}

pub struct MockAdapter {
    name: String,
    queues: Arc<Mutex<HashMap<String, Vec<MockOutcome>>>>,
    default: MockOutcome,
    calls: Arc<Mutex<u32>>,
}

fn job_key(prompt: &str) -> String {
    prompt.chars().take(50).collect()
}

impl MockAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queues: Arc::new(Mutex::new(HashMap::new())),
            default: MockOutcome::Text("{}".to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_default(mut self, outcome: MockOutcome) -> Self {
        self.default = outcome;
        self
    }

    /// Registers an ordered sequence of outcomes to return for prompts whose
    /// first 50 characters match `prompt_prefix`. Outcomes are consumed
    /// first-in-first-out; once exhausted, `default` is returned.
    pub async fn queue(&self, prompt_prefix: &str, outcome: MockOutcome) {
        let mut queues = self.queues.lock().await;
        queues.entry(job_key(prompt_prefix)).or_default().push(outcome);
    }

    pub async fn call_count(&self) -> u32 {
        *self.calls.lock().await
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _system_prompt: Option<&str>,
        user_prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, AdapterError> {
        *self.calls.lock().await += 1;

        let outcome = {
            let mut queues = self.queues.lock().await;
            let exact = job_key(user_prompt);
            // Exact 50-char-prefix match first (cheap, covers the common
            // case where the caller queues by the job's own text); fall
            // back to substring containment so a caller can key on a short
            // unique fragment (e.g. the job title) even when it isn't at
            // the start of the rendered prompt, as screening prompts place
            // the profile block before the job block.
            let matched_key = if queues.get(&exact).is_some_and(|q| !q.is_empty()) {
                Some(exact)
            } else {
                queues
                    .iter()
                    .find(|(key, q)| !key.is_empty() && !q.is_empty() && user_prompt.contains(key.as_str()))
                    .map(|(key, _)| key.clone())
            };

            match matched_key {
                Some(key) => queues.get_mut(&key).unwrap().remove(0),
                None => self.default.clone(),
            }
        };

        match outcome {
            MockOutcome::Text(text) => Ok(Completion {
                text,
                source: CompletionSource::Primary,
            }),
            MockOutcome::ReasoningTrace(text) => Ok(Completion {
                text,
                source: CompletionSource::ReasoningTrace,
            }),
            MockOutcome::Fail(failure) => Err(failure.into_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_default_when_nothing_queued() {
        let adapter = MockAdapter::new("mock");
        let result = adapter
            .complete(None, "hello", &CompletionOptions::default_analysis())
            .await
            .unwrap();
        assert_eq!(result.text, "{}");
    }

    #[tokio::test]
    async fn queued_outcomes_are_consumed_in_order() {
        let adapter = MockAdapter::new("mock");
        adapter.queue("hello", MockOutcome::Fail(MockFailure::Timeout)).await;
        adapter.queue("hello", MockOutcome::Text("ok".to_string())).await;

        let first = adapter
            .complete(None, "hello world", &CompletionOptions::default_analysis())
            .await;
        assert!(matches!(first, Err(AdapterError::TimeoutError(_))));

        let second = adapter
            .complete(None, "hello world", &CompletionOptions::default_analysis())
            .await
            .unwrap();
        assert_eq!(second.text, "ok");
    }

    #[tokio::test]
    async fn call_count_increments() {
        let adapter = MockAdapter::new("mock");
        adapter.complete(None, "x", &CompletionOptions::default_analysis()).await.ok();
        adapter.complete(None, "y", &CompletionOptions::default_analysis()).await.ok();
        assert_eq!(adapter.call_count().await, 2);
    }
}
