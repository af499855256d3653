//! Request/response shapes shared by every adapter, in the style of the
//! teacher's `ai::types` module.

use serde::{Deserialize, Serialize};

/// Per-call tuning knobs, generalizing the scattered temperature/max_tokens
/// literals the original Python clients hardcode per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl CompletionOptions {
    /// Extraction/market/match tasks: default creative-but-grounded setting.
    pub fn default_analysis() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            timeout_ms: 30_000,
        }
    }

    /// Screening: low temperature, short budget, per
    /// `enhanced_job_analyzer.py::_stage1_quick_screening`.
    pub fn screening() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 200,
            timeout_ms: 15_000,
        }
    }
}

/// A completion a provider adapter hands back to the executor.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub source: CompletionSource,
}

/// Which field of the provider's response the text was drawn from, so the
/// parser can apply the lower-confidence salvage path when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    /// The provider's normal content field was non-empty.
    Primary,
    /// The provider's primary content was empty but `reasoning_content`
    /// (or an equivalent trace field) carried text, per
    /// `glm_client.py`'s reasoning-trace salvage.
    ReasoningTrace,
}
