//! Core data model shared across the pipeline.
//!
//! Every type here is a plain, serde-derived struct or enum — no builder
//! macros, mirroring the style of the teacher's `ai::types` module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A single raw job posting as supplied by the crawler (out of scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub description: String,
}

impl JobRecord {
    /// Identity per spec.md §3 (I1): `url` when present, else `title+company`.
    pub fn identity(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}\u{0}{}", self.title, self.company),
        }
    }
}

/// Candidate-supplied requirements used when no résumé summary is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub intentions: Vec<String>,
    #[serde(default)]
    pub excluded_types: Vec<String>,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub salary_range: SalaryRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SalaryRange {
    /// Monthly K units (e.g. 15 means 15,000/month).
    pub min_k: u32,
    pub max_k: u32,
}

impl UserProfile {
    /// Renders the free-text requirements block the `match_simple` prompt
    /// needs when no résumé is present, in the shape
    /// `original_source/analyzer/enhanced_job_analyzer.py::_get_user_requirements`
    /// builds.
    pub fn requirements_text(&self) -> String {
        let mut out = String::new();
        out.push_str("求职意向：\n");
        for intention in &self.intentions {
            out.push_str(&format!("- {}\n", intention));
        }
        out.push_str(&format!(
            "\n背景要求：\n- 工作经验: {}年\n- 技能专长: {}\n",
            self.experience_years,
            self.skills.join(", ")
        ));
        out.push_str(&format!(
            "\n薪资期望：\n- {}K-{}K/月\n",
            self.salary_range.min_k, self.salary_range.max_k
        ));
        if !self.excluded_types.is_empty() {
            out.push_str("\n不接受的岗位类型：\n");
            for excluded in &self.excluded_types {
                out.push_str(&format!("- {}\n", excluded));
            }
        }
        out
    }

    /// Compact intentions/exclusions block for the screening prompt.
    pub fn intentions_text(&self) -> String {
        let mut out = String::from("求职意向：\n");
        out.push_str(&self.intentions.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n"));
        if !self.excluded_types.is_empty() {
            out.push_str("\n\n不接受的岗位：\n");
            out.push_str(&self.excluded_types.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n"));
        }
        out
    }
}

/// Optional pre-computed résumé analysis. When present, `match_full` is used
/// instead of `match_simple`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub competitiveness_score: f32,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub dimension_scores: HashMap<String, f32>,
    #[serde(default)]
    pub career_advice: String,
    #[serde(default)]
    pub recommended_jobs: Vec<String>,
}

/// Stage-1 relevance verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningVerdict {
    pub relevant: bool,
    pub reason: String,
}

/// Stage-2 per-job structured extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub responsibilities: Vec<String>,
    pub hard_skills: HardSkills,
    pub soft_skills: Vec<String>,
    pub experience_required: String,
    pub education_required: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardSkills {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub preferred: Vec<String>,
}

impl ExtractedInfo {
    /// The "unknown" sentinel every field is defined to have (spec.md §3).
    pub fn unknown() -> Self {
        Self {
            responsibilities: Vec::new(),
            hard_skills: HardSkills::default(),
            soft_skills: Vec::new(),
            experience_required: "未知".to_string(),
            education_required: "未知".to_string(),
        }
    }
}

/// The closed recommendation enum (see SPEC_FULL.md §3 addition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "强烈推荐")]
    StronglyRecommend,
    #[serde(rename = "推荐")]
    Recommend,
    #[serde(rename = "可以考虑")]
    Consider,
    #[serde(rename = "不推荐")]
    NotRecommended,
    #[serde(rename = "分析失败")]
    AnalysisFailed,
    #[serde(rename = "岗位与求职意向不相关")]
    Irrelevant,
}

impl Recommendation {
    /// Thresholds from `original_source/analyzer/ai_service.py::_parse_text_job_analysis`.
    pub fn from_score(score: f32) -> Self {
        if score >= 8.0 {
            Recommendation::StronglyRecommend
        } else if score >= 6.0 {
            Recommendation::Recommend
        } else if score >= 4.0 {
            Recommendation::Consider
        } else {
            Recommendation::NotRecommended
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Recommendation::AnalysisFailed | Recommendation::Irrelevant)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::StronglyRecommend => "强烈推荐",
            Recommendation::Recommend => "推荐",
            Recommendation::Consider => "可以考虑",
            Recommendation::NotRecommended => "不推荐",
            Recommendation::AnalysisFailed => "分析失败",
            Recommendation::Irrelevant => "岗位与求职意向不相关",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Recommendation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "强烈推荐" => Recommendation::StronglyRecommend,
            "推荐" => Recommendation::Recommend,
            "可以考虑" => Recommendation::Consider,
            "不推荐" => Recommendation::NotRecommended,
            "分析失败" => Recommendation::AnalysisFailed,
            "岗位与求职意向不相关" => Recommendation::Irrelevant,
            _ => return Err(()),
        })
    }
}

/// Per-job match result, the pipeline's primary per-item output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub score: f32,
    pub overall_score: f32,
    pub recommendation: Recommendation,
    pub dimension_scores: HashMap<String, f32>,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub match_points: Vec<String>,
    #[serde(default)]
    pub mismatch_points: Vec<String>,
    pub reason: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub action_recommendation: String,
    /// When set, the record is a failure marker and I2 requires score == 0.
    #[serde(default)]
    pub error: Option<String>,
}

impl MatchAnalysis {
    /// Builds a fail-marker per §7's "user-visible behavior" clause.
    pub fn fail_marker(reason: impl Into<String>, error_kind: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            overall_score: 0.0,
            recommendation: Recommendation::AnalysisFailed,
            dimension_scores: HashMap::new(),
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
            match_points: Vec::new(),
            mismatch_points: Vec::new(),
            reason: reason.into(),
            summary: String::new(),
            action_recommendation: String::new(),
            error: Some(error_kind.into()),
        }
    }

    /// Builds the screening-rejected placeholder MERGE attaches (spec.md §4.6).
    pub fn irrelevant_marker(reason: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            overall_score: 0.0,
            recommendation: Recommendation::Irrelevant,
            dimension_scores: HashMap::new(),
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
            match_points: Vec::new(),
            mismatch_points: Vec::new(),
            reason: reason.into(),
            summary: "经快速筛选，该岗位与您的求职意向不匹配".to_string(),
            action_recommendation: String::new(),
            error: None,
        }
    }

    /// Builds the "cancelled" marker §5 requires for unfinished items.
    pub fn cancelled_marker() -> Self {
        Self::fail_marker("分析已取消", "cancelled")
    }

    /// Invariant I2: score == 0 iff recommendation/error indicate failure.
    pub fn satisfies_i2(&self) -> bool {
        let failure_signal = self.error.is_some() || self.recommendation.is_failure();
        (self.score == 0.0) == failure_signal
    }
}

/// One bucketed skill-demand entry in the market report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDemand {
    pub name: String,
    /// In [0, 1].
    pub frequency: f32,
    pub importance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillBuckets {
    pub core_required: Vec<SkillDemand>,
    pub important_preferred: Vec<SkillDemand>,
    pub special_scenarios: Vec<SkillDemand>,
}

impl SkillBuckets {
    /// Places a scored skill into the bucket spec.md §3 assigns it to.
    pub fn insert(&mut self, name: String, frequency: f32) {
        let entry = SkillDemand {
            name,
            frequency,
            importance: String::new(),
        };
        if frequency >= 0.7 {
            self.core_required.push(SkillDemand { importance: "核心必备".to_string(), ..entry });
        } else if frequency >= 0.3 {
            self.important_preferred.push(SkillDemand { importance: "重要加分".to_string(), ..entry });
        } else {
            self.special_scenarios.push(SkillDemand { importance: "特定场景".to_string(), ..entry });
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillRequirements {
    pub hard_skills: SkillBuckets,
    pub soft_skills: SkillBuckets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub total_jobs_analyzed: usize,
    pub analysis_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketInsights {
    #[serde(default)]
    pub tech_stack_trends: Vec<String>,
    #[serde(default)]
    pub emerging_skills: Vec<String>,
    #[serde(default)]
    pub experience_distribution: HashMap<String, String>,
    #[serde(default)]
    pub education_requirements: HashMap<String, String>,
}

/// Cross-sectional market cognition report, the pipeline's batch-level output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketReport {
    pub overview: MarketOverview,
    pub skill_requirements: SkillRequirements,
    pub core_responsibilities: Vec<String>,
    pub market_insights: MarketInsights,
    pub key_findings: Vec<String>,
}

impl MarketReport {
    /// Shape-valid empty report per spec.md §8's "empty input" boundary case
    /// and the Aggregator's §4.7 fallback, grounded on
    /// `enhanced_job_analyzer.py::_get_default_market_report`.
    pub fn empty(total_jobs_analyzed: usize, analysis_date: impl Into<String>) -> Self {
        Self {
            overview: MarketOverview {
                total_jobs_analyzed,
                analysis_date: analysis_date.into(),
            },
            skill_requirements: SkillRequirements::default(),
            core_responsibilities: Vec::new(),
            market_insights: MarketInsights::default(),
            key_findings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_identity_prefers_url() {
        let job = JobRecord {
            title: "A".into(),
            company: "B".into(),
            salary: None,
            location: None,
            url: Some("https://x/1".into()),
            description: String::new(),
        };
        assert_eq!(job.identity(), "https://x/1");
    }

    #[test]
    fn job_identity_falls_back_to_title_company() {
        let job = JobRecord {
            title: "A".into(),
            company: "B".into(),
            salary: None,
            location: None,
            url: None,
            description: String::new(),
        };
        assert_eq!(job.identity(), "A\u{0}B");
    }

    #[test]
    fn recommendation_roundtrips_through_display_and_fromstr() {
        for r in [
            Recommendation::StronglyRecommend,
            Recommendation::Recommend,
            Recommendation::Consider,
            Recommendation::NotRecommended,
            Recommendation::AnalysisFailed,
            Recommendation::Irrelevant,
        ] {
            let s = r.to_string();
            assert_eq!(s.parse::<Recommendation>().unwrap(), r);
        }
    }

    #[test]
    fn fail_marker_satisfies_i2() {
        let m = MatchAnalysis::fail_marker("boom", "TimeoutError");
        assert!(m.satisfies_i2());
        assert_eq!(m.score, 0.0);
    }

    #[test]
    fn non_failure_analysis_satisfies_i2() {
        let mut m = MatchAnalysis::fail_marker("x", "y");
        m.error = None;
        m.score = 7.0;
        m.overall_score = 7.0;
        m.recommendation = Recommendation::Recommend;
        assert!(m.satisfies_i2());
    }
}
