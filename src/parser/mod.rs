//! C3 Response Parser: turns a completion's raw text into a structured
//! JSON value via a multi-step cascade, grounded on
//! `enhanced_job_analyzer.py::_parse_extraction_result` and
//! `_parse_market_cognition_result`, with a lexical fallback for the
//! screening task grounded on `glm_client.py`.

pub mod errors;
pub mod phrases;
pub mod schema;

use regex::Regex;
use serde_json::Value;

pub use errors::ParseError;
pub use schema::Task;

/// Outcome of parsing one completion: the structured value plus whether a
/// lossy fallback step had to be used, so callers can log a lower
/// confidence without treating it as a hard failure.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub value: Value,
    pub used_fallback: bool,
}

/// Runs the full cascade: fenced block -> direct parse -> brace-balanced
/// walk -> permissive regex -> comment/trailing-comma-stripped retry ->
/// (caller-driven) lexical heuristic. This function covers the first five
/// JSON-oriented steps; the lexical heuristic lives in [`phrases`] because
/// it only applies to the screening task and produces a different type.
pub fn extract_json(task: Task, text: &str) -> Result<ParsedResponse, ParseError> {
    if let Some(value) = try_fenced_block(text).and_then(|s| serde_json::from_str(&s).ok()) {
        if schema::validate(task, &value).is_ok() {
            return Ok(ParsedResponse { value, used_fallback: false });
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if schema::validate(task, &value).is_ok() {
            return Ok(ParsedResponse { value, used_fallback: false });
        }
    }

    if let Some(candidate) = brace_balanced_substring(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            if schema::validate(task, &value).is_ok() {
                return Ok(ParsedResponse { value, used_fallback: true });
            }
        }
    }

    if let Some(candidate) = permissive_regex_match(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            if schema::validate(task, &value).is_ok() {
                return Ok(ParsedResponse { value, used_fallback: true });
            }
        }
        let cleaned = strip_comments_and_trailing_commas(&candidate);
        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            if schema::validate(task, &value).is_ok() {
                return Ok(ParsedResponse { value, used_fallback: true });
            }
        }
    }

    Err(ParseError::NoJsonFound)
}

/// Extracts the body of a ```json fenced block, if present.
fn try_fenced_block(text: &str) -> Option<String> {
    let re = Regex::new(r"```(?:json)?\s*([\s\S]*?)```").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

/// Walks the text tracking brace depth to find the first balanced `{...}`
/// span, per `enhanced_job_analyzer.py`'s `brace_count` loop.
fn brace_balanced_substring(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// A more permissive nested-brace regex, used when the balanced walk
/// misses a match because of stray braces inside string literals.
fn permissive_regex_match(text: &str) -> Option<String> {
    let re = Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

/// Strips `//` line comments and trailing commas before `}`/`]`, per
/// `enhanced_job_analyzer.py::_parse_market_cognition_result`'s cleanup
/// pass.
fn strip_comments_and_trailing_commas(text: &str) -> String {
    let no_comments: String = text
        .lines()
        .map(|line| match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let trailing_comma = Regex::new(r",\s*([}\]])").unwrap();
    trailing_comma.replace_all(&no_comments, "$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_fenced_json_block() {
        let text = "here is the result:\n```json\n{\"relevant\": true, \"reason\": \"ok\"}\n```";
        let parsed = extract_json(Task::Screening, text).unwrap();
        assert_eq!(parsed.value, json!({"relevant": true, "reason": "ok"}));
        assert!(!parsed.used_fallback);
    }

    #[test]
    fn parses_direct_json_with_no_wrapper() {
        let text = r#"{"relevant": false, "reason": "不匹配"}"#;
        let parsed = extract_json(Task::Screening, text).unwrap();
        assert!(!parsed.used_fallback);
    }

    #[test]
    fn brace_balanced_walk_recovers_json_surrounded_by_prose() {
        let text = "分析如下：\n{\"relevant\": true, \"reason\": \"符合\"}\n以上为分析结果。";
        let parsed = extract_json(Task::Screening, text).unwrap();
        assert!(parsed.used_fallback);
        assert_eq!(parsed.value["relevant"], json!(true));
    }

    #[test]
    fn strips_trailing_commas_before_parsing() {
        let text = "{\"relevant\": true, \"reason\": \"ok\",}";
        let parsed = extract_json(Task::Screening, text).unwrap();
        assert_eq!(parsed.value["reason"], json!("ok"));
    }

    #[test]
    fn returns_no_json_found_when_nothing_resembles_json() {
        let result = extract_json(Task::Screening, "完全没有结构化内容");
        assert!(matches!(result, Err(ParseError::NoJsonFound)));
    }

    #[test]
    fn rejects_json_missing_required_fields() {
        let text = r#"{"relevant": true}"#;
        let result = extract_json(Task::Screening, text);
        assert!(matches!(result, Err(ParseError::NoJsonFound)));
    }
}
