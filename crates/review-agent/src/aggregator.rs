use std::time::Duration;

use review_config::{AggregationConfig, Config};
use review_core::agent_def::AggregatorDefinition;
use review_core::agent_result::AgentResult;
use review_core::error::AggregatorError;
use review_core::report::AggregatedReport;

#[async_trait::async_trait]
pub trait AggregatorBackend: Send + Sync {
    async fn run(&self, model: &str, system_prompt: &str, message: &str, max_turns: u32) -> Result<AggregatedReport, String>;
}

fn resolve<T: Clone>(config_value: Option<T>, def_value: Option<T>, global_value: T) -> T {
    config_value.or(def_value).unwrap_or(global_value)
}

/// Renders every agent's outcome into the Markdown the aggregator model
/// reads: issues per successful/truncated agent, a dedicated section for
/// agents that errored or timed out.
pub fn build_aggregator_message(results: &[AgentResult]) -> String {
    let mut message = String::from("# Agent Review Results\n");
    let mut failed_section = String::new();

    for result in results {
        match result {
            AgentResult::Success { agent_name, issues, .. } | AgentResult::Truncated { agent_name, issues, .. } => {
                message.push_str(&format!("\n## Agent: {agent_name}\n"));
                if issues.is_empty() {
                    message.push_str("- No issues found.\n");
                } else {
                    for issue in issues {
                        let location_str = issue
                            .location
                            .as_ref()
                            .map(|loc| match loc.line_number {
                                Some(line) => format!(" ({}:{line})", loc.file_path),
                                None => format!(" ({})", loc.file_path),
                            })
                            .unwrap_or_default();
                        message.push_str(&format!("- [{}]{} {}", issue.severity, location_str, issue.description));
                        if let Some(suggestion) = &issue.suggestion {
                            message.push_str(&format!("\n  Suggestion: {suggestion}"));
                        }
                        if let Some(category) = &issue.category {
                            message.push_str(&format!("\n  Category: {category}"));
                        }
                        message.push('\n');
                    }
                }
            }
            AgentResult::Error { agent_name, error_message, .. } => {
                failed_section.push_str(&format!("- {agent_name}: error — {error_message}\n"));
            }
            AgentResult::Timeout { agent_name, timeout_seconds } => {
                failed_section.push_str(&format!("- {agent_name}: timeout ({timeout_seconds}s)\n"));
            }
        }
    }

    if !failed_section.is_empty() {
        message.push_str("\n# Failed Agents\n");
        message.push_str(&failed_section);
    }

    message
}

pub async fn run_aggregator(
    aggregator_definition: &AggregatorDefinition,
    aggregation_config: &AggregationConfig,
    global: &Config,
    results: &[AgentResult],
    backend: &dyn AggregatorBackend,
) -> Result<AggregatedReport, AggregatorError> {
    let model = aggregation_config
        .model
        .clone()
        .unwrap_or_else(|| aggregator_definition.model.clone());
    let timeout_seconds = resolve(aggregation_config.timeout, aggregator_definition.timeout, global.timeout);
    let max_turns = resolve(aggregation_config.max_turns, aggregator_definition.max_turns, global.max_turns);

    let message = build_aggregator_message(results);
    let timeout = Duration::from_secs_f64(timeout_seconds.max(0.0));

    match tokio::time::timeout(timeout, backend.run(&model, &aggregator_definition.system_prompt, &message, max_turns)).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(message)) => Err(AggregatorError::Failed(message)),
        Err(_elapsed) => Err(AggregatorError::Failed(format!("aggregator timed out after {timeout_seconds}s"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_core::review::{FileLocation, ReviewIssue};
    use review_core::severity::Severity;

    #[test]
    fn renders_no_issues_line_for_empty_agent() {
        let results = vec![AgentResult::Success {
            agent_name: "style".to_string(),
            issues: vec![],
            elapsed_time: 1.0,
            cost: None,
        }];
        let message = build_aggregator_message(&results);
        assert!(message.contains("## Agent: style"));
        assert!(message.contains("No issues found."));
    }

    #[test]
    fn renders_failed_agents_section() {
        let results = vec![AgentResult::Timeout {
            agent_name: "slow".to_string(),
            timeout_seconds: 600.0,
        }];
        let message = build_aggregator_message(&results);
        assert!(message.contains("# Failed Agents"));
        assert!(message.contains("slow: timeout (600s)"));
    }

    #[test]
    fn renders_issue_with_location_and_suggestion() {
        let results = vec![AgentResult::Success {
            agent_name: "correctness".to_string(),
            issues: vec![ReviewIssue {
                agent_name: "correctness".to_string(),
                severity: Severity::Critical,
                description: "null deref".to_string(),
                location: Some(FileLocation {
                    file_path: "src/lib.rs".to_string(),
                    line_number: Some(42),
                }),
                suggestion: Some("add a check".to_string()),
                category: None,
            }],
            elapsed_time: 1.0,
            cost: None,
        }];
        let message = build_aggregator_message(&results);
        assert!(message.contains("[Critical] (src/lib.rs:42) null deref"));
        assert!(message.contains("Suggestion: add a check"));
    }
}
