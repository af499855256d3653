//! Unified error type for the pipeline, generalized from the teacher's
//! `CareerBenchError` — the database/filesystem variants have no
//! counterpart here, and `AdapterError`/`ParseError` take their place.

use std::fmt;

use crate::parser::errors::ParseError;
use crate::provider::AdapterError;

/// Top-level error every pipeline-facing operation can fail with.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Provider adapter failure (see [`AdapterError`]).
    Adapter(AdapterError),
    /// Response parsing failure (see [`ParseError`]).
    Parse(ParseError),
    /// Configuration errors discovered outside a specific adapter call,
    /// e.g. no provider configured at all.
    Configuration(String),
    /// General orchestration-level errors (cancellation, bad input shape).
    Application(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Adapter(e) => write!(f, "provider error: {}", e),
            PipelineError::Parse(e) => write!(f, "parse error: {}", e),
            PipelineError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            PipelineError::Application(msg) => write!(f, "application error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Adapter(e) => Some(e),
            PipelineError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AdapterError> for PipelineError {
    fn from(err: AdapterError) -> Self {
        PipelineError::Adapter(err)
    }
}

impl From<ParseError> for PipelineError {
    fn from(err: ParseError) -> Self {
        PipelineError::Parse(err)
    }
}

/// The taxonomy label recorded on a failure marker (`MatchAnalysis.error`),
/// matching the adapter-error-kind vocabulary in spec.md §6 so callers can
/// distinguish failure causes without re-parsing a Display string.
pub fn error_kind(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::Adapter(AdapterError::ConfigError(_)) => "ConfigError",
        PipelineError::Adapter(AdapterError::TransportError(_)) => "TransportError",
        PipelineError::Adapter(AdapterError::TimeoutError(_)) => "TimeoutError",
        PipelineError::Adapter(AdapterError::RateLimitError(_)) => "RateLimitError",
        PipelineError::Adapter(AdapterError::UpstreamError { .. }) => "UpstreamError",
        PipelineError::Adapter(AdapterError::ShapeError(_)) => "ShapeError",
        PipelineError::Adapter(AdapterError::EmptyCompletionError) => "EmptyCompletionError",
        PipelineError::Adapter(AdapterError::ParseError(_)) => "ParseError",
        PipelineError::Parse(_) => "ParseError",
        PipelineError::Configuration(_) => "ConfigError",
        PipelineError::Application(_) => "ApplicationError",
    }
}

/// User-facing summary, parallel to the teacher's `to_user_message`.
pub fn to_user_message(error: &PipelineError) -> String {
    match error {
        PipelineError::Adapter(AdapterError::ConfigError(msg)) => {
            format!("Provider is not configured correctly: {}", msg)
        }
        PipelineError::Adapter(AdapterError::RateLimitError(_)) => {
            "The provider's rate limit was exceeded.".to_string()
        }
        PipelineError::Adapter(e) => format!("Provider call failed: {}", e),
        PipelineError::Parse(e) => format!("Could not interpret the model's response: {}", e),
        PipelineError::Configuration(msg) => format!("Configuration error: {}", msg),
        PipelineError::Application(msg) => msg.clone(),
    }
}

impl PipelineError {
    /// Logs the error at an appropriate level and returns it unchanged, for
    /// use at the end of an error-producing chain.
    pub fn log_and_return(self, context: &str) -> Self {
        crate::logging::log_pipeline_error(context, &self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_matches_adapter_variant() {
        let err = PipelineError::Adapter(AdapterError::TimeoutError("slow".into()));
        assert_eq!(error_kind(&err), "TimeoutError");
    }

    #[test]
    fn error_kind_for_parse_error() {
        let err = PipelineError::Parse(ParseError::NoJsonFound);
        assert_eq!(error_kind(&err), "ParseError");
    }
}
