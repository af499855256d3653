//! Per-task required-field schemas, grounded on the JSON examples embedded
//! in `original_source/analyzer/prompts/job_analysis_prompts.py` and
//! `extraction_prompts.py`.

use serde_json::Value;

use super::errors::ParseError;

/// The five canonical tasks the prompt builder and parser both key off of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Screening,
    Extraction,
    Market,
    MatchFull,
    MatchSimple,
}

impl Task {
    /// Required top-level keys, per the `enhanced_job_analyzer.py` check
    /// `all(field in result for field in ['overall_score', 'recommendation', 'dimension_scores'])`
    /// (match_full) and its sibling schemas for the other four tasks.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Task::Screening => &["relevant", "reason"],
            Task::Extraction => &[
                "responsibilities",
                "hard_skills",
                "soft_skills",
                "experience_required",
                "education_required",
            ],
            Task::Market => &[
                "overview",
                "skill_requirements",
                "core_responsibilities",
                "market_insights",
                "key_findings",
            ],
            Task::MatchFull => &["overall_score", "recommendation", "dimension_scores"],
            Task::MatchSimple => &["score", "recommendation", "reason"],
        }
    }
}

/// Verifies every required key is present at the top level of `value`.
/// Returns the list of keys that are missing, empty when the shape is
/// valid.
pub fn missing_fields(task: Task, value: &Value) -> Vec<String> {
    let object = match value.as_object() {
        Some(object) => object,
        None => return task.required_fields().iter().map(|s| s.to_string()).collect(),
    };
    task.required_fields()
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|s| s.to_string())
        .collect()
}

pub fn validate(task: Task, value: &Value) -> Result<(), ParseError> {
    let missing = missing_fields(task, value);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParseError::MissingFields(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn screening_requires_relevant_and_reason() {
        let value = json!({ "relevant": true });
        assert_eq!(
            missing_fields(Task::Screening, &value),
            vec!["reason".to_string()]
        );
    }

    #[test]
    fn match_full_valid_shape_passes() {
        let value = json!({
            "overall_score": 8.0,
            "recommendation": "推荐",
            "dimension_scores": {},
        });
        assert!(validate(Task::MatchFull, &value).is_ok());
    }

    #[test]
    fn non_object_value_is_entirely_missing() {
        let value = json!([1, 2, 3]);
        assert_eq!(missing_fields(Task::Extraction, &value).len(), 5);
    }
}
