//! Error taxonomy for provider adapters, grounded on the teacher's
//! `ai::errors::AiProviderError` but redrawn to the eight kinds spec.md §6
//! names.

use std::fmt;

/// The eight-kind error taxonomy an adapter call can fail with.
#[derive(Debug, Clone)]
pub enum AdapterError {
    /// Credential/model/endpoint misconfiguration discovered before any
    /// network call is attempted.
    ConfigError(String),
    /// Connection-level failure (DNS, TLS, connection reset).
    TransportError(String),
    /// The call did not complete within the configured deadline.
    TimeoutError(String),
    /// The provider signalled 429 / quota exhaustion.
    RateLimitError(String),
    /// The provider returned a non-2xx status for a reason other than
    /// auth or rate limiting.
    UpstreamError { status: u16, body: String },
    /// The response parsed as JSON but lacked the shape the adapter
    /// contract requires (e.g. no `choices[0]`).
    ShapeError(String),
    /// The provider returned 200 with no usable text in any field,
    /// including `reasoning_content`.
    EmptyCompletionError,
    /// The completion text could not be turned into the requested
    /// structured value.
    ParseError(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            AdapterError::TransportError(msg) => write!(f, "transport error: {}", msg),
            AdapterError::TimeoutError(msg) => write!(f, "timeout: {}", msg),
            AdapterError::RateLimitError(msg) => write!(f, "rate limited: {}", msg),
            AdapterError::UpstreamError { status, body } => {
                write!(f, "upstream error ({}): {}", status, truncate(body, 200))
            }
            AdapterError::ShapeError(msg) => write!(f, "unexpected response shape: {}", msg),
            AdapterError::EmptyCompletionError => write!(f, "completion had no usable text"),
            AdapterError::ParseError(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

/// Classifies which errors are worth retrying against the *same* provider,
/// mirroring `ai::retry::is_retryable_error`'s permanent/transient split.
pub fn is_retryable(error: &AdapterError) -> bool {
    match error {
        AdapterError::TransportError(_) => true,
        AdapterError::TimeoutError(_) => true,
        AdapterError::RateLimitError(_) => true,
        AdapterError::UpstreamError { status, .. } => *status >= 500,
        AdapterError::ConfigError(_) => false,
        AdapterError::ShapeError(_) => false,
        AdapterError::EmptyCompletionError => false,
        AdapterError::ParseError(_) => false,
    }
}

/// Classifies which errors are worth falling back to a *different*
/// provider for, mirroring `ai::hybrid_provider::is_recoverable_error`.
///
/// Per spec.md §7's propagation policy, only transport/timeout/ratelimit/
/// empty-completion trigger a fallback attempt; shape errors and non-5xx
/// upstream errors fail-mark the item immediately instead.
pub fn is_recoverable_for_fallback(error: &AdapterError) -> bool {
    match error {
        AdapterError::TransportError(_) => true,
        AdapterError::TimeoutError(_) => true,
        AdapterError::RateLimitError(_) => true,
        AdapterError::UpstreamError { status, .. } => *status >= 500,
        AdapterError::EmptyCompletionError => true,
        AdapterError::ShapeError(_) => false,
        AdapterError::ConfigError(_) => false,
        AdapterError::ParseError(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_timeout_and_ratelimit_are_retryable() {
        assert!(is_retryable(&AdapterError::TransportError("x".into())));
        assert!(is_retryable(&AdapterError::TimeoutError("x".into())));
        assert!(is_retryable(&AdapterError::RateLimitError("x".into())));
    }

    #[test]
    fn config_and_parse_errors_are_not_retryable() {
        assert!(!is_retryable(&AdapterError::ConfigError("x".into())));
        assert!(!is_retryable(&AdapterError::ParseError("x".into())));
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        assert!(is_retryable(&AdapterError::UpstreamError { status: 503, body: String::new() }));
        assert!(!is_retryable(&AdapterError::UpstreamError { status: 400, body: String::new() }));
    }

    #[test]
    fn config_errors_never_trigger_fallback() {
        assert!(!is_recoverable_for_fallback(&AdapterError::ConfigError("x".into())));
    }

    #[test]
    fn upstream_error_display_truncates_cjk_body_by_chars_not_bytes() {
        let body: String = "错".repeat(300);
        let err = AdapterError::UpstreamError { status: 500, body };
        // Must not panic on a byte-boundary split in the middle of a
        // multi-byte character, and must cap at 200 *characters*.
        let rendered = err.to_string();
        assert!(rendered.contains(&"错".repeat(200)));
        assert!(!rendered.contains(&"错".repeat(201)));
    }
}
