//! Lexical fallback heuristics used when the JSON-extraction cascade in
//! [`super::extract_json`] fails entirely. Grounded on
//! `original_source/analyzer/clients/glm_client.py`'s phrase-based
//! screening classifier and `original_source/analyzer/ai_service.py`'s
//! `_parse_text_job_analysis` numeric-score extraction.
//!
//! The phrase lists are data, not logic — spec.md §9 leaves "should these
//! be configurable" as an Open Question; [`DESIGN.md`] records the decision
//! to keep them as a `Default`-able struct so a caller can swap them
//! without touching this module.

use regex::Regex;

use crate::model::Recommendation;

/// Phrase lists the screening fallback matches against, seeded verbatim
/// from `glm_client.py`.
#[derive(Debug, Clone)]
pub struct ScreeningPhrases {
    pub positive: Vec<&'static str>,
    pub negative: Vec<&'static str>,
    pub positive_hint_chars: Vec<&'static str>,
    pub negative_hint_chars: Vec<&'static str>,
}

impl Default for ScreeningPhrases {
    fn default() -> Self {
        Self {
            positive: vec![
                "符合求职意向",
                "与求职意向相关",
                "属于目标岗位",
                "匹配用户需求",
                "是相关岗位",
                "符合要求",
            ],
            negative: vec![
                "不符合求职意向",
                "与求职意向不相关",
                "不属于目标岗位",
                "属于不接受的岗位类型",
                "明确排除",
                "用户不接受此类岗位",
            ],
            positive_hint_chars: vec!["相关", "符合", "匹配"],
            negative_hint_chars: vec!["不相关", "不符合", "不匹配"],
        }
    }
}

/// Result of the lexical screening fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalScreeningVerdict {
    pub relevant: bool,
    pub reason: String,
}

impl ScreeningPhrases {
    /// Classifies free text that failed JSON extraction, per
    /// `glm_client.py`'s phrase-then-count fallback for screening-type
    /// prompts. Returns `None` if neither the explicit phrase list nor the
    /// count-based hint characters produce a verdict.
    pub fn classify(&self, text: &str) -> Option<LexicalScreeningVerdict> {
        for phrase in &self.negative {
            if text.contains(phrase) {
                return Some(LexicalScreeningVerdict {
                    relevant: false,
                    reason: extract_reason_sentence(text, phrase),
                });
            }
        }
        for phrase in &self.positive {
            if text.contains(phrase) {
                return Some(LexicalScreeningVerdict {
                    relevant: true,
                    reason: extract_reason_sentence(text, phrase),
                });
            }
        }

        let positive_hits = self.positive_hint_chars.iter().filter(|p| text.contains(**p)).count();
        let negative_hits = self.negative_hint_chars.iter().filter(|p| text.contains(**p)).count();
        if positive_hits == 0 && negative_hits == 0 {
            return None;
        }
        let relevant = positive_hits > negative_hits;
        Some(LexicalScreeningVerdict {
            relevant,
            reason: first_non_empty_sentence(text).unwrap_or_else(|| text.trim().to_string()),
        })
    }
}

/// Pulls the sentence containing `phrase` out of `text`, falling back to
/// the whole trimmed text when sentence splitting finds nothing.
fn extract_reason_sentence(text: &str, phrase: &str) -> String {
    for sentence in text.split(['。', '\n', '.']) {
        if sentence.contains(phrase) {
            return sentence.trim().to_string();
        }
    }
    text.trim().to_string()
}

fn first_non_empty_sentence(text: &str) -> Option<String> {
    text.split(['。', '\n', '.'])
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extracts a 0-10 numeric score from free text via regex, per
/// `ai_service.py::_parse_text_job_analysis`, and maps it to a
/// [`Recommendation`] using the same 8/6/4 thresholds.
pub fn extract_numeric_score(text: &str) -> Option<(f32, Recommendation)> {
    let patterns = [
        r"(?:总体评分|总分|overall[_ ]?score)[:：]?\s*(\d+(?:\.\d+)?)",
        r"(\d+(?:\.\d+)?)\s*分",
        r"score[:：]?\s*(\d+(?:\.\d+)?)",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(text) {
            if let Some(raw) = caps.get(1) {
                if let Ok(score) = raw.as_str().parse::<f32>() {
                    let score = score.clamp(0.0, 10.0);
                    return Some((score, Recommendation::from_score(score)));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_phrase_wins_over_positive() {
        let phrases = ScreeningPhrases::default();
        let verdict = phrases
            .classify("该岗位不符合求职意向，虽然部分描述符合要求")
            .unwrap();
        assert!(!verdict.relevant);
    }

    #[test]
    fn positive_phrase_is_detected() {
        let phrases = ScreeningPhrases::default();
        let verdict = phrases.classify("岗位为AI工程师，符合求职意向").unwrap();
        assert!(verdict.relevant);
    }

    #[test]
    fn count_based_fallback_when_no_explicit_phrase() {
        let phrases = ScreeningPhrases::default();
        let verdict = phrases.classify("这个岗位相关度较高，匹配度不错").unwrap();
        assert!(verdict.relevant);
    }

    #[test]
    fn returns_none_when_no_signal_at_all() {
        let phrases = ScreeningPhrases::default();
        assert!(phrases.classify("完全无关的文字内容").is_none());
    }

    #[test]
    fn numeric_score_extraction_maps_to_thresholds() {
        let (score, rec) = extract_numeric_score("总体评分: 8.5").unwrap();
        assert_eq!(score, 8.5);
        assert_eq!(rec, Recommendation::StronglyRecommend);
    }

    #[test]
    fn numeric_score_extraction_handles_fen_suffix() {
        let (score, rec) = extract_numeric_score("这个岗位我打5分").unwrap();
        assert_eq!(score, 5.0);
        assert_eq!(rec, Recommendation::Consider);
    }
}
