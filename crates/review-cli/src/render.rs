use review_core::agent_result::AgentResult;
use review_core::report::{AggregatedReport, ReviewReport, ReviewSummary};
use review_core::review::ReviewIssue;
use review_core::severity::Severity;
use review_config::OutputFormat;

pub fn render(report: &ReviewReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Markdown => render_markdown(report),
        OutputFormat::Json => serde_json::to_string_pretty(report).expect("report always serializes"),
    }
}

fn render_markdown(report: &ReviewReport) -> String {
    let mut sections = vec!["# Review Report".to_string(), format_summary(&report.summary)];

    let issues = ReviewReport::collect_issues(&report.results);
    let issues_section = format_issues(&issues);
    if !issues_section.is_empty() {
        sections.push(issues_section);
    }

    if let Some(aggregated) = &report.aggregated {
        sections.push(format_aggregated(aggregated));
    }

    sections.push(format_agent_results(&report.results));

    let load_errors_section = format_load_errors(&report.load_errors);
    if !load_errors_section.is_empty() {
        sections.push(load_errors_section);
    }

    if let Some(error) = &report.aggregation_error {
        sections.push(format!("## Aggregation Error\n\n{error}"));
    }

    format!("{}\n", sections.join("\n\n"))
}

fn format_summary(summary: &ReviewSummary) -> String {
    let severity_display = summary.max_severity().map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
    let elapsed_display = format!("{:.1}s", summary.total_elapsed_time);

    let mut rows = vec![
        format!("| Total Issues | {} |", summary.total_issues()),
        format!("| Max Severity | {severity_display} |"),
        format!("| Elapsed Time | {elapsed_display} |"),
    ];

    if let Some(cost) = summary.total_cost {
        rows.push(format!("| Total Cost | ${cost:.4} |"));
    }

    format!("## Summary\n\n| Metric | Value |\n|--------|-------|\n{}", rows.join("\n"))
}

fn format_issues(issues: &[ReviewIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }

    let severities = [Severity::Critical, Severity::Important, Severity::Suggestion, Severity::Nitpick];
    let mut parts = vec!["## Issues".to_string()];
    for severity in severities {
        let group: Vec<&ReviewIssue> = issues.iter().filter(|i| i.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        parts.push(format!("\n### {severity} ({})", group.len()));
        for (idx, issue) in group.iter().enumerate() {
            parts.push(format_single_issue(idx + 1, issue));
        }
    }
    parts.join("\n")
}

fn format_single_issue(index: usize, issue: &ReviewIssue) -> String {
    let mut lines = vec![format!("\n#### {index}. {}\n", issue.description), format!("- **Agent**: {}", issue.agent_name)];
    if let Some(location) = &issue.location {
        match location.line_number {
            Some(line) => lines.push(format!("- **Location**: `{}:{}`", location.file_path, line)),
            None => lines.push(format!("- **Location**: `{}`", location.file_path)),
        }
    }
    if let Some(category) = &issue.category {
        lines.push(format!("- **Category**: {category}"));
    }
    if let Some(suggestion) = &issue.suggestion {
        lines.push(format!("- **Suggestion**: {suggestion}"));
    }
    lines.join("\n")
}

fn format_agent_results(results: &[AgentResult]) -> String {
    let rows: Vec<String> = results.iter().map(format_agent_result_row).collect();
    format!("## Agent Results\n\n| Agent | Status | Issues | Time |\n|-------|--------|--------|------|\n{}", rows.join("\n"))
}

fn format_agent_result_row(result: &AgentResult) -> String {
    match result {
        AgentResult::Success { agent_name, issues, elapsed_time, .. } => {
            format!("| {agent_name} | success | {} | {elapsed_time:.1}s |", issues.len())
        }
        AgentResult::Truncated { agent_name, issues, elapsed_time, .. } => {
            format!("| {agent_name} | truncated | {} | {elapsed_time:.1}s |", issues.len())
        }
        AgentResult::Error { agent_name, .. } => format!("| {agent_name} | error | - | - |"),
        AgentResult::Timeout { agent_name, timeout_seconds } => {
            format!("| {agent_name} | timeout ({timeout_seconds:.0}s) | - | - |")
        }
    }
}

fn format_aggregated(aggregated: &AggregatedReport) -> String {
    let mut parts = vec!["## Aggregated Analysis".to_string()];

    if !aggregated.issues.is_empty() {
        let lines: Vec<String> = aggregated.issues.iter().map(|i| format!("- [{}] {}", i.severity, i.description)).collect();
        parts.push(format!("\n### Issues\n\n{}", lines.join("\n")));
    }

    if !aggregated.strengths.is_empty() {
        let lines: Vec<String> = aggregated.strengths.iter().map(|s| format!("- {s}")).collect();
        parts.push(format!("\n### Strengths\n\n{}", lines.join("\n")));
    }

    if !aggregated.recommended_actions.is_empty() {
        let lines: Vec<String> = aggregated
            .recommended_actions
            .iter()
            .enumerate()
            .map(|(idx, a)| format!("{}. **[{}]** {}", idx + 1, a.priority, a.description))
            .collect();
        parts.push(format!("\n### Recommended Actions\n\n{}", lines.join("\n")));
    }

    if !aggregated.agent_failures.is_empty() {
        let lines: Vec<String> = aggregated.agent_failures.iter().map(|f| format!("- {}: {}", f.agent_name, f.reason)).collect();
        parts.push(format!("\n### Agent Failures\n\n{}", lines.join("\n")));
    }

    parts.join("\n")
}

fn format_load_errors(load_errors: &[String]) -> String {
    if load_errors.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = load_errors.iter().map(|e| format!("- {e}")).collect();
    format!("## Load Errors\n\n{}", lines.join("\n"))
}
