//! The provider adapter contract (C1), generalizing the teacher's
//! `ai::provider::AiProvider` trait from five task-specific methods down to
//! a single `complete` call every concrete provider implements the same way.

use async_trait::async_trait;

use super::errors::AdapterError;
use super::types::{Completion, CompletionOptions};

/// A chat-style LLM backend. Every concrete adapter (DeepSeek, Claude,
/// Gemini, OpenAI, GLM, or the in-memory mock) implements this directly —
/// there is no shared base struct, matching the teacher's preference for a
/// single trait over an inheritance hierarchy.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short identifier used in logs, registry lookups, and fallback
    /// bookkeeping (e.g. "deepseek", "glm").
    fn name(&self) -> &str;

    /// Issue one completion request. `system_prompt` is optional because
    /// not every provider's wire format distinguishes system from user
    /// turns the same way.
    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, AdapterError>;
}
