//! C6 Pipeline Orchestrator: the five-state machine
//! `INIT -> S1_SCREEN? -> S2_EXTRACT -> S3_MARKET -> S4_MATCH -> MERGE -> DONE`,
//! grounded on `enhanced_job_analyzer.py::analyze_jobs_three_stages` and
//! `_merge_with_irrelevant_jobs`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::aggregator::Aggregator;
use crate::errors::{error_kind, PipelineError};
use crate::executor::{StageExecutor, StageProviders, StageRequest};
use crate::model::{
    ExtractedInfo, JobRecord, MarketReport, MatchAnalysis, Recommendation, ResumeSummary,
    ScreeningVerdict, UserProfile,
};
use crate::parser::{self, phrases::ScreeningPhrases, Task};
use crate::progress::{ProgressEvent, SharedProgressListener, Stage};
use crate::prompt;
use crate::provider::{Completion, CompletionOptions, CompletionSource};
use crate::registry::ProviderRegistry;

/// Which named provider (primary and optional fallback) backs each stage.
#[derive(Debug, Clone)]
pub struct PipelineProviders {
    pub screening: StageProviders,
    pub extraction: StageProviders,
    pub market: StageProviders,
    pub matching: StageProviders,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// When true, run stage-1 screening first and drop irrelevant jobs
    /// before extraction; when false, every job goes straight to
    /// extraction (the "full mode" branch in the original analyzer).
    pub screening_mode: bool,
    pub concurrency: usize,
    pub providers: PipelineProviders,
    /// Present when a résumé-based analysis should use the six-dimension
    /// `match_full` prompt instead of `match_simple`.
    pub resume: Option<ResumeSummary>,
}

/// One job's final outcome plus the reason it took that path, for callers
/// that want to distinguish "screened out" from "analyzed" from "failed".
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub identity: String,
    pub analysis: MatchAnalysis,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub outcomes: Vec<JobOutcome>,
    pub market_report: MarketReport,
}

pub struct Orchestrator {
    executor: StageExecutor,
}

impl Orchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, concurrency: usize) -> Self {
        Self {
            executor: StageExecutor::new(registry, concurrency),
        }
    }

    /// Runs the full pipeline over `jobs`, preserving input order in the
    /// returned outcomes (invariant I1).
    pub async fn run(
        &self,
        jobs: Vec<JobRecord>,
        profile: Option<&UserProfile>,
        config: &PipelineConfig,
        progress: SharedProgressListener,
        cancelled: Arc<AtomicBool>,
    ) -> PipelineResult {
        if jobs.is_empty() {
            return PipelineResult {
                outcomes: Vec::new(),
                market_report: MarketReport::empty(0, analysis_date()),
            };
        }

        let identities: Vec<String> = jobs.iter().map(JobRecord::identity).collect();

        // S1_SCREEN (optional).
        let (survivors, screened_out): (Vec<usize>, HashMap<usize, String>) = if config.screening_mode {
            self.screen(&jobs, profile, config, progress.clone(), cancelled.clone()).await
        } else {
            ((0..jobs.len()).collect(), HashMap::new())
        };

        if survivors.is_empty() {
            let market_report = MarketReport::empty(0, analysis_date());
            let outcomes = jobs
                .iter()
                .zip(identities.iter())
                .enumerate()
                .map(|(i, (_, identity))| JobOutcome {
                    identity: identity.clone(),
                    analysis: MatchAnalysis::irrelevant_marker(
                        screened_out.get(&i).cloned().unwrap_or_default(),
                    ),
                })
                .collect();
            return PipelineResult { outcomes, market_report };
        }

        // S2_EXTRACT: only survivors count toward total_jobs_analyzed (I4).
        let extracted = self
            .extract(&jobs, &survivors, config, progress.clone(), cancelled.clone())
            .await;

        // S3_MARKET: one aggregated call, falling back to the deterministic
        // Aggregator on any failure.
        let market_report = self
            .market(&extracted, config, progress.clone(), cancelled.clone())
            .await;

        // S4_MATCH: per-survivor match analysis.
        let matches = self
            .matching(&jobs, &survivors, profile, config, &market_report, progress.clone(), cancelled)
            .await;

        // MERGE: reassemble in original order, attaching irrelevant markers
        // for screened-out jobs.
        let mut survivor_iter = survivors.into_iter().zip(matches.into_iter());
        let mut next_survivor = survivor_iter.next();

        let outcomes = identities
            .into_iter()
            .enumerate()
            .map(|(i, identity)| {
                if let Some((survivor_index, analysis)) = &next_survivor {
                    if *survivor_index == i {
                        let analysis = analysis.clone();
                        next_survivor = survivor_iter.next();
                        return JobOutcome { identity, analysis };
                    }
                }
                JobOutcome {
                    identity,
                    analysis: MatchAnalysis::irrelevant_marker(
                        screened_out.get(&i).cloned().unwrap_or_default(),
                    ),
                }
            })
            .collect();

        PipelineResult { outcomes, market_report }
    }

    async fn screen(
        &self,
        jobs: &[JobRecord],
        profile: Option<&UserProfile>,
        config: &PipelineConfig,
        progress: SharedProgressListener,
        cancelled: Arc<AtomicBool>,
    ) -> (Vec<usize>, HashMap<usize, String>) {
        let Some(profile) = profile else {
            return ((0..jobs.len()).collect(), HashMap::new());
        };

        let requests = jobs
            .iter()
            .map(|job| StageRequest {
                system_prompt: Some(prompt::system_prompt().to_string()),
                user_prompt: prompt::screening_prompt(job, profile),
            })
            .collect();

        let results = self
            .executor
            .run(
                Stage::Screening,
                requests,
                &config.providers.screening,
                CompletionOptions::screening(),
                progress,
                cancelled,
            )
            .await;

        let phrases = ScreeningPhrases::default();
        let mut survivors = Vec::new();
        let mut rejected = HashMap::new();

        for (index, result) in results.into_iter().enumerate() {
            let verdict = match result {
                Ok(completion) => parse_screening(&completion, &phrases),
                Err(_) => None,
            };
            match verdict {
                Some(v) if v.relevant => survivors.push(index),
                Some(v) => {
                    rejected.insert(index, v.reason);
                }
                // Failures are excluded from screening entirely (not counted
                // as relevant or irrelevant) per
                // `enhanced_job_analyzer.py::_stage1_quick_screening`'s
                // silent-exclusion behavior — treated here as irrelevant
                // with a generic reason so MERGE still accounts for them.
                None => {
                    rejected.insert(index, "筛选失败".to_string());
                }
            }
        }

        (survivors, rejected)
    }

    async fn extract(
        &self,
        jobs: &[JobRecord],
        survivors: &[usize],
        config: &PipelineConfig,
        progress: SharedProgressListener,
        cancelled: Arc<AtomicBool>,
    ) -> Vec<ExtractedInfo> {
        let requests = survivors
            .iter()
            .map(|&i| StageRequest {
                system_prompt: Some(prompt::system_prompt().to_string()),
                user_prompt: prompt::extraction_prompt(&jobs[i]),
            })
            .collect();

        let results = self
            .executor
            .run(
                Stage::Extraction,
                requests,
                &config.providers.extraction,
                CompletionOptions::default_analysis(),
                progress,
                cancelled,
            )
            .await;

        results
            .into_iter()
            .map(|result| match result {
                Ok(completion) => parse_extraction(&completion).unwrap_or_else(|_| ExtractedInfo::unknown()),
                Err(_) => ExtractedInfo::unknown(),
            })
            .collect()
    }

    async fn market(
        &self,
        extracted: &[ExtractedInfo],
        config: &PipelineConfig,
        progress: SharedProgressListener,
        cancelled: Arc<AtomicBool>,
    ) -> MarketReport {
        let requests = vec![StageRequest {
            system_prompt: Some(prompt::system_prompt().to_string()),
            user_prompt: prompt::market_prompt(extracted),
        }];

        let mut results = self
            .executor
            .run(
                Stage::Market,
                requests,
                &config.providers.market,
                CompletionOptions::default_analysis(),
                progress,
                cancelled,
            )
            .await;

        match results.pop() {
            Some(Ok(completion)) => parse_market(&completion, extracted.len())
                .unwrap_or_else(|| Aggregator::aggregate(extracted, analysis_date())),
            _ => Aggregator::aggregate(extracted, analysis_date()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn matching(
        &self,
        jobs: &[JobRecord],
        survivors: &[usize],
        profile: Option<&UserProfile>,
        config: &PipelineConfig,
        market_report: &MarketReport,
        progress: SharedProgressListener,
        cancelled: Arc<AtomicBool>,
    ) -> Vec<MatchAnalysis> {
        let use_full = config.resume.is_some();

        let requests = survivors
            .iter()
            .map(|&i| {
                let user_prompt = if let (true, Some(resume)) = (use_full, config.resume.as_ref()) {
                    prompt::match_full_prompt(&jobs[i], resume, market_report)
                } else if let Some(profile) = profile {
                    prompt::match_simple_prompt(&jobs[i], profile)
                } else {
                    prompt::match_simple_prompt(&jobs[i], &UserProfile {
                        intentions: Vec::new(),
                        excluded_types: Vec::new(),
                        skills: Vec::new(),
                        experience_years: 0,
                        salary_range: crate::model::SalaryRange { min_k: 0, max_k: 0 },
                    })
                };
                StageRequest {
                    system_prompt: Some(prompt::system_prompt().to_string()),
                    user_prompt,
                }
            })
            .collect();

        let results = self
            .executor
            .run(
                Stage::Match,
                requests,
                &config.providers.matching,
                CompletionOptions::default_analysis(),
                progress,
                cancelled,
            )
            .await;

        results
            .into_iter()
            .map(|result| match result {
                Ok(completion) => {
                    let task = if use_full { Task::MatchFull } else { Task::MatchSimple };
                    parse_match(&completion, task)
                        .unwrap_or_else(|| MatchAnalysis::fail_marker("无法解析模型输出", "ParseError"))
                }
                Err(error) if is_cancelled(&error) => MatchAnalysis::cancelled_marker(),
                Err(error) => MatchAnalysis::fail_marker(error.to_string(), error_kind(&error)),
            })
            .collect()
    }
}

/// Distinguishes a cooperative-cancellation short-circuit (§5: "explicit
/// cancelled markers for the rest") from an ordinary application error.
fn is_cancelled(error: &PipelineError) -> bool {
    matches!(error, PipelineError::Application(msg) if msg.contains("取消"))
}

fn analysis_date() -> String {
    // Dates are supplied by the caller at a higher layer in a real
    // deployment; this crate has no wall-clock dependency, so the report
    // carries a fixed placeholder when one isn't provided by the caller.
    "unknown".to_string()
}

fn parse_screening(completion: &Completion, phrases: &ScreeningPhrases) -> Option<ScreeningVerdict> {
    match parser::extract_json(Task::Screening, &completion.text) {
        Ok(parsed) => serde_json::from_value(parsed.value).ok(),
        Err(_) => phrases.classify(&completion.text).map(|v| ScreeningVerdict {
            relevant: v.relevant,
            reason: v.reason,
        }),
    }
}

fn parse_extraction(completion: &Completion) -> Result<ExtractedInfo, ()> {
    let parsed = parser::extract_json(Task::Extraction, &completion.text).map_err(|_| ())?;
    serde_json::from_value(parsed.value).map_err(|_| ())
}

fn parse_market(completion: &Completion, total_jobs: usize) -> Option<MarketReport> {
    let parsed = parser::extract_json(Task::Market, &completion.text).ok()?;
    let mut report: MarketReport = serde_json::from_value(parsed.value).ok()?;
    // I4 must hold regardless of what the model reports for this field.
    report.overview.total_jobs_analyzed = total_jobs;
    Some(report)
}

fn parse_match(completion: &Completion, task: Task) -> Option<MatchAnalysis> {
    let parsed = parser::extract_json(task, &completion.text).ok();
    let value: Value = match parsed {
        Some(p) => p.value,
        None => {
            if completion.source == CompletionSource::ReasoningTrace {
                if let Some((score, recommendation)) =
                    crate::parser::phrases::extract_numeric_score(&completion.text)
                {
                    return Some(MatchAnalysis {
                        score,
                        overall_score: score,
                        recommendation,
                        dimension_scores: HashMap::new(),
                        matched_skills: Vec::new(),
                        missing_skills: Vec::new(),
                        match_points: Vec::new(),
                        mismatch_points: Vec::new(),
                        reason: "基于推理内容的文本启发式解析".to_string(),
                        summary: String::new(),
                        action_recommendation: String::new(),
                        error: None,
                    });
                }
            }
            return None;
        }
    };

    match task {
        Task::MatchFull => build_match_full(&value),
        Task::MatchSimple => build_match_simple(&value),
        _ => None,
    }
}

fn build_match_full(value: &Value) -> Option<MatchAnalysis> {
    let overall_score = clamp_score(value.get("overall_score")?.as_f64()? as f32);
    let recommendation = value
        .get("recommendation")?
        .as_str()?
        .parse::<Recommendation>()
        .ok()?;
    let dimension_scores = value
        .get("dimension_scores")
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), clamp_score(n as f32))))
                .collect()
        })
        .unwrap_or_default();

    Some(MatchAnalysis {
        score: overall_score,
        overall_score,
        recommendation,
        dimension_scores,
        matched_skills: string_array(value, "matched_skills"),
        missing_skills: string_array(value, "missing_skills"),
        match_points: Vec::new(),
        mismatch_points: Vec::new(),
        reason: value.get("action_recommendation").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        summary: String::new(),
        action_recommendation: value.get("action_recommendation").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        error: None,
    })
}

fn build_match_simple(value: &Value) -> Option<MatchAnalysis> {
    let score = clamp_score(value.get("score")?.as_f64()? as f32);
    let recommendation = value
        .get("recommendation")?
        .as_str()?
        .parse::<Recommendation>()
        .ok()?;
    let reason = value.get("reason")?.as_str()?.to_string();

    Some(MatchAnalysis {
        score,
        overall_score: score,
        recommendation,
        dimension_scores: HashMap::new(),
        matched_skills: Vec::new(),
        missing_skills: Vec::new(),
        match_points: string_array(value, "match_points"),
        mismatch_points: string_array(value, "mismatch_points"),
        reason,
        summary: value.get("summary").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        action_recommendation: String::new(),
        error: None,
    })
}

/// Clamps a model-reported score to [0, 10] per invariant I3 — a model is
/// free to score on its own scale (some return 0-100), but nothing
/// downstream should see it unclamped.
fn clamp_score(score: f32) -> f32 {
    score.clamp(0.0, 10.0)
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_match_simple_clamps_out_of_range_score() {
        let value = json!({ "score": 95.0, "recommendation": "强烈推荐", "reason": "x" });
        let analysis = build_match_simple(&value).unwrap();
        assert_eq!(analysis.score, 10.0);
        assert_eq!(analysis.overall_score, 10.0);
    }

    #[test]
    fn build_match_full_clamps_overall_and_dimension_scores() {
        let value = json!({
            "overall_score": -3.0,
            "recommendation": "推荐",
            "dimension_scores": { "job_match": 100.0, "skill_match": 4.0 },
        });
        let analysis = build_match_full(&value).unwrap();
        assert_eq!(analysis.overall_score, 0.0);
        assert_eq!(analysis.dimension_scores["job_match"], 10.0);
        assert_eq!(analysis.dimension_scores["skill_match"], 4.0);
    }

    #[test]
    fn parse_market_always_uses_real_survivor_count() {
        let completion = Completion {
            text: r#"{"overview": {"total_jobs_analyzed": 999, "analysis_date": "d"}, "skill_requirements": {"hard_skills": {"core_required": [], "important_preferred": [], "special_scenarios": []}, "soft_skills": {"core_required": [], "important_preferred": [], "special_scenarios": []}}, "core_responsibilities": [], "market_insights": {"tech_stack_trends": [], "emerging_skills": [], "experience_distribution": {}, "education_requirements": {}}, "key_findings": []}"#.to_string(),
            source: CompletionSource::Primary,
        };
        let report = parse_market(&completion, 2).unwrap();
        assert_eq!(report.overview.total_jobs_analyzed, 2);
    }
}
