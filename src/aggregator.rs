//! C7 Aggregator: deterministic fallback market-cognition computation used
//! when the market-analysis LLM call fails outright, grounded on
//! `enhanced_job_analyzer.py::_get_default_market_report` for the
//! shape-valid-empty-report behavior and on
//! `job_analysis_prompts.py::get_market_cognition_prompt`'s bucket
//! thresholds for how extracted skills are distributed into
//! core/important/special buckets.

use std::collections::HashMap;

use crate::model::{ExtractedInfo, MarketInsights, MarketOverview, MarketReport, SkillBuckets, SkillRequirements};

pub struct Aggregator;

impl Aggregator {
    /// Computes a market report purely from stage-2 extractions, with no
    /// LLM call — the same computation the market-cognition prompt asks
    /// the model to approximate, done exactly instead of approximately.
    pub fn aggregate(extracted: &[ExtractedInfo], analysis_date: impl Into<String>) -> MarketReport {
        let total = extracted.len();
        let analysis_date = analysis_date.into();

        if total == 0 {
            return MarketReport::empty(0, analysis_date);
        }

        let hard_skills = bucket_skills(extracted.iter().flat_map(|e| {
            e.hard_skills
                .required
                .iter()
                .chain(e.hard_skills.preferred.iter())
        }), total);
        let soft_skills = bucket_skills(extracted.iter().flat_map(|e| e.soft_skills.iter()), total);

        let core_responsibilities = top_frequency_items(
            extracted.iter().flat_map(|e| e.responsibilities.iter()),
            total,
            10,
        );

        let mut experience_distribution: HashMap<String, String> = HashMap::new();
        let mut education_distribution: HashMap<String, String> = HashMap::new();
        for info in extracted {
            *experience_distribution
                .entry(info.experience_required.clone())
                .or_insert_with(|| "0".to_string()) = increment_count(
                experience_distribution.get(&info.experience_required),
            );
            *education_distribution
                .entry(info.education_required.clone())
                .or_insert_with(|| "0".to_string()) = increment_count(
                education_distribution.get(&info.education_required),
            );
        }

        MarketReport {
            overview: MarketOverview {
                total_jobs_analyzed: total,
                analysis_date,
            },
            skill_requirements: SkillRequirements { hard_skills, soft_skills },
            core_responsibilities,
            market_insights: MarketInsights {
                tech_stack_trends: Vec::new(),
                emerging_skills: Vec::new(),
                experience_distribution,
                education_requirements: education_distribution,
            },
            key_findings: Vec::new(),
        }
    }
}

fn increment_count(existing: Option<&String>) -> String {
    let n: u32 = existing.and_then(|s| s.parse().ok()).unwrap_or(0);
    (n + 1).to_string()
}

/// Counts occurrences of each skill, converts to a frequency in [0, 1],
/// and places it into the bucket that frequency falls into.
fn bucket_skills<'a>(skills: impl Iterator<Item = &'a String>, total: usize) -> SkillBuckets {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for skill in skills {
        *counts.entry(skill.as_str()).or_insert(0) += 1;
    }

    let mut buckets = SkillBuckets::default();
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (skill, count) in entries {
        let frequency = count as f32 / total as f32;
        buckets.insert(skill.to_string(), frequency);
    }
    buckets
}

/// Returns the `limit` most frequently occurring distinct strings, each
/// annotated implicitly by its rank (the text itself is returned verbatim
/// since `core_responsibilities` in spec.md §3 is a flat string list).
fn top_frequency_items<'a>(
    items: impl Iterator<Item = &'a String>,
    _total: usize,
    limit: usize,
) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.as_str()).or_insert(0) += 1;
    }
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().take(limit).map(|(s, _)| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HardSkills;

    fn info(required: &[&str], preferred: &[&str]) -> ExtractedInfo {
        ExtractedInfo {
            responsibilities: vec!["编写代码".to_string()],
            hard_skills: HardSkills {
                required: required.iter().map(|s| s.to_string()).collect(),
                preferred: preferred.iter().map(|s| s.to_string()).collect(),
            },
            soft_skills: vec!["沟通".to_string()],
            experience_required: "3-5年".to_string(),
            education_required: "本科".to_string(),
        }
    }

    #[test]
    fn empty_input_yields_shape_valid_empty_report() {
        let report = Aggregator::aggregate(&[], "2026-07-28");
        assert_eq!(report.overview.total_jobs_analyzed, 0);
        assert!(report.skill_requirements.hard_skills.core_required.is_empty());
    }

    #[test]
    fn skill_present_in_every_job_lands_in_core_required() {
        let extracted = vec![info(&["Rust"], &[]), info(&["Rust"], &[]), info(&["Rust"], &[])];
        let report = Aggregator::aggregate(&extracted, "2026-07-28");
        let names: Vec<&str> = report
            .skill_requirements
            .hard_skills
            .core_required
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert!(names.contains(&"Rust"));
    }

    #[test]
    fn skill_present_in_minority_lands_in_special_scenarios() {
        let extracted = vec![info(&["Rust"], &[]), info(&["Go"], &[]), info(&["Python"], &[]), info(&["Java"], &[])];
        let report = Aggregator::aggregate(&extracted, "2026-07-28");
        let names: Vec<&str> = report
            .skill_requirements
            .hard_skills
            .special_scenarios
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert!(names.contains(&"Rust"));
    }

    #[test]
    fn total_jobs_analyzed_counts_all_extracted_entries() {
        let extracted = vec![info(&[], &[]), info(&[], &[])];
        let report = Aggregator::aggregate(&extracted, "2026-07-28");
        assert_eq!(report.overview.total_jobs_analyzed, 2);
    }
}
