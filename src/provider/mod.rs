//! C1 Provider Adapter: a uniform interface over five LLM vendors plus an
//! in-memory mock, generalizing the teacher's `ai` module.

pub mod adapter;
pub mod claude;
pub mod deepseek;
pub mod errors;
pub mod gemini;
pub mod glm;
pub mod mock;
pub mod openai;
pub mod types;

pub use adapter::Adapter;
pub use errors::{is_recoverable_for_fallback, is_retryable, AdapterError};
pub use types::{Completion, CompletionOptions, CompletionSource};
