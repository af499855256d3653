//! C4 Prompt Builder: renders the five canonical task prompts, grounded on
//! `original_source/analyzer/prompts/extraction_prompts.py` and
//! `job_analysis_prompts.py`. Truncation budgets (300/500/1000 characters)
//! are carried over verbatim from those modules.

use crate::model::{ExtractedInfo, JobRecord, MarketReport, ResumeSummary, UserProfile};

/// The persona system prompt shared by every task, per
/// `job_analysis_prompts.py::get_hr_system_prompt`.
pub fn system_prompt() -> &'static str {
    "你是一位拥有15年经验的资深猎头顾问和HR总监，擅长精准评估岗位与候选人的匹配程度。\
     你的分析客观、专业，严格依据给定信息作答，绝不编造岗位描述中不存在的内容。"
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Stage-1 relevance screening prompt. Description truncated to 500 chars
/// per `extraction_prompts.py::get_job_relevance_screening_prompt`.
pub fn screening_prompt(job: &JobRecord, profile: &UserProfile) -> String {
    let description = truncate_chars(&job.description, 500);
    format!(
        "请判断以下岗位是否与求职意向相关：\n\n{}\n\n岗位信息：\n职位：{}\n公司：{}\n描述：{}\n\n\
         判断标准：\n1. 岗位类型是否匹配求职意向\n2. 核心工作内容是否相关\n3. 技能要求是否对口\n\n\
         输出要求：\n- 只输出一个JSON对象\n- 格式：{{\"relevant\": true/false, \"reason\": \"简短说明原因\"}}\n\
         - relevant为true表示相关，false表示不相关",
        profile.intentions_text(),
        job.title,
        job.company,
        description,
    )
}

/// Stage-2 structured extraction prompt. Description truncated to 300
/// chars per `extraction_prompts.py::get_job_info_extraction_prompt`.
pub fn extraction_prompt(job: &JobRecord) -> String {
    let description = truncate_chars(&job.description, 300);
    format!(
        "分析以下岗位信息，提取关键要素：\n\n岗位名称：{}\n公司：{}\n岗位描述：\n{}\n\n\
         请从上述岗位描述中提取以下信息：\n\
         1. 岗位职责（responsibilities）：主要工作内容\n\
         2. 硬技能要求（hard_skills）：技术、工具、专业能力等\n   - required：必须掌握的技能\n   - preferred：加分项技能\n\
         3. 软技能要求（soft_skills）：沟通、团队协作等\n\
         4. 经验要求（experience_required）：工作年限要求\n\
         5. 学历要求（education_required）：最低学历要求\n\n\
         输出格式要求：\n- 必须是标准JSON格式\n- 不要输出任何其他文字\n- 如果某项信息未提及，使用\"未提及\"或空数组\n\n\
         示例输出格式（请根据实际岗位信息填充）：\n\
         {{\"responsibilities\": [\"实际职责1\", \"实际职责2\"], \"hard_skills\": {{\"required\": [\"必备技能1\"], \
         \"preferred\": [\"加分技能1\"]}}, \"soft_skills\": [\"软技能1\"], \"experience_required\": \"3-5年\", \
         \"education_required\": \"本科\"}}",
        job.title, job.company, description,
    )
}

/// Stage-3 market cognition prompt, aggregating extracted info across the
/// whole batch. Grounded on
/// `job_analysis_prompts.py::get_market_cognition_prompt`'s bucket
/// thresholds (>=70% core, 30-70% important, <30% special-scenario).
pub fn market_prompt(extracted: &[ExtractedInfo]) -> String {
    let summaries: Vec<String> = extracted
        .iter()
        .enumerate()
        .map(|(i, info)| {
            format!(
                "岗位{}: 必备技能[{}] 加分技能[{}] 软技能[{}] 经验[{}] 学历[{}]",
                i + 1,
                info.hard_skills.required.join(","),
                info.hard_skills.preferred.join(","),
                info.soft_skills.join(","),
                info.experience_required,
                info.education_required,
            )
        })
        .collect();

    format!(
        "基于以下{}个岗位的提取信息，生成市场认知分析报告：\n\n{}\n\n\
         分桶规则：\n- 出现频率>=70%的技能归为核心必备（core_required）\n\
         - 出现频率30%-70%的技能归为重要加分（important_preferred）\n\
         - 出现频率<30%的技能归为特定场景（special_scenarios）\n\n\
         输出一个JSON对象，包含：overview（含total_jobs_analyzed/analysis_date）、skill_requirements\
         （含hard_skills与soft_skills，各自含core_required/important_preferred/special_scenarios）、\
         core_responsibilities、market_insights（含tech_stack_trends/emerging_skills/\
         experience_distribution/education_requirements）、key_findings。",
        extracted.len(),
        summaries.join("\n"),
    )
}

/// Stage-4 résumé-based match prompt (`match_full`), grounded on
/// `job_analysis_prompts.py::get_job_match_analysis_prompt`'s six
/// dimensions.
pub fn match_full_prompt(job: &JobRecord, resume: &ResumeSummary, market: &MarketReport) -> String {
    format!(
        "请基于候选人简历与岗位信息，生成详细匹配分析：\n\n\
         岗位：{} @ {}\n岗位描述：{}\n\n\
         候选人竞争力评分：{:.1}\n候选人优势：{}\n候选人职业建议：{}\n\n\
         市场背景：共分析{}个同类岗位。\n\n\
         请从以下6个维度评分（0-10）：job_match, skill_match, experience_match, skill_coverage, \
         keyword_match, hard_requirements\n\n\
         输出一个JSON对象，包含：overall_score, recommendation, dimension_scores, matched_skills, \
         missing_skills, interview_preparation, skill_coverage_detail, priority_level, \
         action_recommendation。recommendation必须是以下之一：强烈推荐/推荐/可以考虑/不推荐。",
        job.title,
        job.company,
        truncate_chars(&job.description, 1000),
        resume.competitiveness_score,
        resume.strengths.join(", "),
        resume.career_advice,
        market.overview.total_jobs_analyzed,
    )
}

/// Stage-4 requirements-based match prompt (`match_simple`), used when no
/// résumé summary is available. Description truncated to 1000 chars per
/// `job_analysis_prompts.py::get_simple_job_match_prompt`.
pub fn match_simple_prompt(job: &JobRecord, profile: &UserProfile) -> String {
    format!(
        "请基于求职者的要求与岗位信息进行匹配度分析：\n\n\
         {}\n\n岗位信息：\n职位：{}\n公司：{}\n描述：{}\n\n\
         输出一个JSON对象，包含：score（0-10）, recommendation（强烈推荐/推荐/可以考虑/不推荐）, reason, \
         summary, match_points, mismatch_points。",
        profile.requirements_text(),
        job.title,
        job.company,
        truncate_chars(&job.description, 1000),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SalaryRange;

    fn sample_job() -> JobRecord {
        JobRecord {
            title: "AI工程师".into(),
            company: "Acme".into(),
            salary: None,
            location: None,
            url: None,
            description: "a".repeat(1200),
        }
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            intentions: vec!["人工智能".into()],
            excluded_types: vec![],
            skills: vec!["Rust".into()],
            experience_years: 3,
            salary_range: SalaryRange { min_k: 20, max_k: 30 },
        }
    }

    #[test]
    fn screening_prompt_truncates_description_to_500_chars() {
        let prompt = screening_prompt(&sample_job(), &sample_profile());
        // The truncated segment should be exactly 500 'a's, not the full 1200.
        assert!(prompt.contains(&"a".repeat(500)));
        assert!(!prompt.contains(&"a".repeat(501)));
    }

    #[test]
    fn extraction_prompt_truncates_description_to_300_chars() {
        let prompt = extraction_prompt(&sample_job());
        assert!(prompt.contains(&"a".repeat(300)));
        assert!(!prompt.contains(&"a".repeat(301)));
    }

    #[test]
    fn match_simple_prompt_truncates_description_to_1000_chars() {
        let prompt = match_simple_prompt(&sample_job(), &sample_profile());
        assert!(prompt.contains(&"a".repeat(1000)));
        assert!(!prompt.contains(&"a".repeat(1001)));
    }

    #[test]
    fn market_prompt_includes_job_count() {
        let extracted = vec![ExtractedInfo::unknown()];
        let prompt = market_prompt(&extracted);
        assert!(prompt.contains("基于以下1个岗位"));
    }
}
