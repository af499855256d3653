//! C2 Provider Registry, generalized from `ai::resolver::ResolvedProvider`.
//!
//! The teacher resolves a single provider from settings persisted in
//! SQLite plus the OS keychain (`ai::settings::load_ai_settings`); that
//! whole persistence layer is out of scope here (spec.md names
//! "configuration/secret loading" as an external collaborator). What
//! remains in scope is the specific responsibility spec.md §4.2 assigns
//! the Registry: resolving a credential from the environment and handing
//! back a ready-to-use [`Adapter`] for a named provider.

use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::{
    claude::ClaudeAdapter, deepseek::DeepSeekAdapter, gemini::GeminiAdapter, glm::GlmAdapter,
    openai::OpenAiAdapter, Adapter,
};
use crate::rate_limiter::RateLimiter;

/// The five vendors spec.md §5 names by their environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    DeepSeek,
    Claude,
    Gemini,
    OpenAi,
    Glm,
}

impl ProviderKind {
    pub fn env_var(self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::Claude => "CLAUDE_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Glm => "GLM_API_KEY",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Glm => "glm",
        }
    }

    fn build(self, api_key: String) -> Arc<dyn Adapter> {
        match self {
            ProviderKind::DeepSeek => Arc::new(DeepSeekAdapter::new(api_key)),
            ProviderKind::Claude => Arc::new(ClaudeAdapter::new(api_key)),
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(api_key)),
            ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(api_key)),
            ProviderKind::Glm => Arc::new(GlmAdapter::new(api_key)),
        }
    }

    const ALL: [ProviderKind; 5] = [
        ProviderKind::DeepSeek,
        ProviderKind::Claude,
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
        ProviderKind::Glm,
    ];
}

/// Resolves provider names to live adapters from process environment
/// variables. A provider whose env var is unset or empty is simply absent
/// from the registry — the caller's `StageExecutor` configuration decides
/// whether that's fatal.
pub struct ProviderRegistry {
    adapters: HashMap<&'static str, Arc<dyn Adapter>>,
    /// One token-bucket limiter per configured provider (§5: LLM vendors
    /// rate-limit around 4-8 concurrent requests), shared across every
    /// caller of that provider so concurrent stages don't each burn through
    /// a separate budget.
    rate_limiters: HashMap<&'static str, Arc<RateLimiter>>,
}

impl ProviderRegistry {
    /// Builds a registry from whichever of the five env vars are present.
    pub fn from_env() -> Self {
        let mut adapters = HashMap::new();
        let mut rate_limiters = HashMap::new();
        for kind in ProviderKind::ALL {
            if let Ok(key) = std::env::var(kind.env_var()) {
                if !key.trim().is_empty() {
                    adapters.insert(kind.name(), kind.build(key));
                    rate_limiters.insert(kind.name(), Arc::new(RateLimiter::provider_default()));
                }
            }
        }
        Self { adapters, rate_limiters }
    }

    /// Builds a registry from an explicit map, bypassing the environment —
    /// primarily for tests that want to register a [`crate::provider::mock::MockAdapter`].
    pub fn from_adapters(adapters: HashMap<&'static str, Arc<dyn Adapter>>) -> Self {
        let rate_limiters = adapters
            .keys()
            .map(|name| (*name, Arc::new(RateLimiter::provider_default())))
            .collect();
        Self { adapters, rate_limiters }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(name).cloned()
    }

    /// Returns the shared rate limiter guarding `name`, if the provider is
    /// configured. Every caller of that provider acquires from the same
    /// instance, so the bound applies across stages, not per-call.
    pub fn rate_limiter(&self, name: &str) -> Option<Arc<RateLimiter>> {
        self.rate_limiters.get(name).cloned()
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn configured_names(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
