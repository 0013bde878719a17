use review_config::Config;
use review_content::filter_diff_by_file_patterns;
use review_core::agent_def::AgentDefinition;
use review_core::agent_result::AgentResult;
use review_core::exit_code::ExitCode;
use review_core::report::{EngineResult, ReviewReport, ReviewSummary};
use review_core::target::ReviewTarget;
use review_prompt::build_review_instruction;

/// A per-agent diff filter only makes sense when the agent isn't already
/// marked `always` (which signals "I care about everything, don't
/// narrow me"), actually declares file patterns to filter by, and the
/// target is diff-shaped content in the first place — filtering file
/// contents by "which file touched which path" is meaningless.
pub fn should_filter_diff(agent_def: &AgentDefinition, target: &ReviewTarget) -> bool {
    if agent_def.applicability.always {
        return false;
    }
    if agent_def.applicability.file_patterns.is_empty() {
        return false;
    }
    !matches!(target, ReviewTarget::File { .. })
}

pub fn build_agent_user_message(
    target: &ReviewTarget,
    agent_def: &AgentDefinition,
    resolved_content: &str,
    context_section: &str,
) -> String {
    let content_for_agent = if should_filter_diff(agent_def, target) {
        filter_diff_by_file_patterns(resolved_content, &agent_def.applicability.file_patterns)
    } else {
        resolved_content.to_string()
    };
    let instruction = build_review_instruction(target, &content_for_agent);
    if context_section.is_empty() {
        instruction
    } else {
        format!("{instruction}\n\n{context_section}")
    }
}

pub fn get_disabled_names(config: &Config) -> Vec<String> {
    config
        .agents
        .iter()
        .filter(|(_, agent_config)| !agent_config.enabled)
        .map(|(name, _)| name.clone())
        .collect()
}

pub fn build_report(results: Vec<AgentResult>, load_errors: Vec<String>) -> ReviewReport {
    let issues = ReviewReport::collect_issues(&results);
    let total_elapsed = ReviewReport::total_elapsed(&results);
    let total_cost = ReviewReport::aggregate_cost(&results).and_then(|cost| cost.total_cost);
    let summary = ReviewSummary::new(&issues, total_elapsed, total_cost);
    ReviewReport {
        results,
        summary,
        load_errors,
        aggregated: None,
        aggregation_error: None,
    }
}

pub fn determine_exit_code(report: &ReviewReport) -> ExitCode {
    let has_valid = report.results.iter().any(|r| r.is_valid());
    if !has_valid {
        return ExitCode::ExecutionError;
    }
    ExitCode::from_max_severity(report.summary.max_severity())
}

pub fn build_empty_engine_result(load_errors: Vec<String>, exit_code: ExitCode) -> EngineResult {
    let report = build_report(Vec::new(), load_errors);
    EngineResult { report, exit_code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_core::agent_def::ApplicabilityRule;
    use review_core::phase::Phase;

    fn agent_def(always: bool, file_patterns: Vec<String>) -> AgentDefinition {
        AgentDefinition {
            name: "a".to_string(),
            description: "d".to_string(),
            model: "anthropic:x".to_string(),
            phase: Phase::Main,
            timeout: None,
            max_turns: None,
            applicability: ApplicabilityRule {
                always,
                file_patterns,
                content_patterns: vec![],
            },
            allowed_tools: vec![],
            system_prompt: "p".to_string(),
        }
    }

    #[test]
    fn always_agents_never_filter() {
        let def = agent_def(true, vec!["*.rs".to_string()]);
        let target = ReviewTarget::Diff {
            base_branch: "main".to_string(),
            issue_number: None,
        };
        assert!(!should_filter_diff(&def, &target));
    }

    #[test]
    fn file_targets_never_filter() {
        let def = agent_def(false, vec!["*.rs".to_string()]);
        let target = ReviewTarget::File {
            paths: vec!["a.rs".to_string()],
            issue_number: None,
        };
        assert!(!should_filter_diff(&def, &target));
    }

    #[test]
    fn diff_target_with_file_patterns_filters() {
        let def = agent_def(false, vec!["*.rs".to_string()]);
        let target = ReviewTarget::Diff {
            base_branch: "main".to_string(),
            issue_number: None,
        };
        assert!(should_filter_diff(&def, &target));
    }

    #[test]
    fn no_valid_results_is_execution_error() {
        let report = build_report(
            vec![AgentResult::Timeout {
                agent_name: "a".to_string(),
                timeout_seconds: 1.0,
            }],
            vec![],
        );
        assert_eq!(determine_exit_code(&report), ExitCode::ExecutionError);
    }
}
