use std::sync::OnceLock;

use regex::Regex;
use review_core::agent_def::AgentDefinition;
use review_core::target::ReviewTarget;
use review_prefetch::PrefetchedReference;

pub const DEFAULT_REFERENCED_CONTENT_MAX_CHARS: usize = 5000;

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(`{3,}|~{3,})").expect("static pattern is valid"))
}

pub fn build_review_instruction(target: &ReviewTarget, resolved_content: &str) -> String {
    let mut instruction = build_mode_section(target, resolved_content);
    if let Some(issue_number) = target.issue_number() {
        instruction.push_str(&format!(
            "\nRelated Issue: #{issue_number}\nUse gh tools to fetch issue details for additional context."
        ));
    }
    instruction
}

fn build_mode_section(target: &ReviewTarget, resolved_content: &str) -> String {
    match target {
        ReviewTarget::Diff { base_branch, .. } => {
            format!("Review the changes in the current branch compared to '{base_branch}'.\n\n{resolved_content}")
        }
        ReviewTarget::Pr { pr_number, .. } => format!(
            "Review Pull Request #{pr_number}.\nUse `gh pr view {pr_number}` to get PR metadata (title, labels, linked issues).\n\n{resolved_content}"
        ),
        ReviewTarget::File { paths, .. } => {
            let bullets: Vec<String> = paths.iter().map(|p| format!("- {p}")).collect();
            format!("Review the following files:\n{}\n\n{resolved_content}", bullets.join("\n"))
        }
    }
}

fn format_applicability(def: &AgentDefinition) -> String {
    if def.applicability.always {
        return ", always".to_string();
    }
    if !def.applicability.file_patterns.is_empty() {
        return format!(", files=[{}]", def.applicability.file_patterns.join(", "));
    }
    if !def.applicability.content_patterns.is_empty() {
        return format!(", content=[{}]", def.applicability.content_patterns.join(", "));
    }
    String::new()
}

fn build_agents_section(available_agents: &[AgentDefinition]) -> String {
    available_agents
        .iter()
        .map(|def| {
            format!(
                "- **{}**: {} (phase={}{})",
                def.name,
                def.description,
                def.phase,
                format_applicability(def)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_selector_instruction(target: &ReviewTarget, available_agents: &[AgentDefinition], resolved_content: &str) -> String {
    let review_section = build_review_instruction(target, resolved_content);
    let agents_section = build_agents_section(available_agents);
    format!("{review_section}\n\n## Available Agents\n\n{agents_section}\n\nSelect the agents that are most applicable for this review.")
}

/// If the text ends with an unclosed code fence (counting only fences
/// whose marker type and length can actually close an earlier one),
/// appends a closing fence of the same marker so truncated output never
/// leaves a dangling fence for the model to "continue" into.
fn close_unclosed_fences(text: &str) -> String {
    let mut open_fence: Option<String> = None;
    for captures in fence_pattern().captures_iter(text) {
        let marker = captures.get(1).unwrap().as_str();
        match &open_fence {
            None => open_fence = Some(marker.to_string()),
            Some(current) => {
                let same_type = current.starts_with('`') == marker.starts_with('`');
                if same_type && marker.len() >= current.len() {
                    open_fence = None;
                }
            }
        }
    }
    match open_fence {
        Some(fence) => format!("{text}\n{fence}"),
        None => text.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("max_chars must be at least 1, got {0}")]
pub struct InvalidMaxChars(usize);

/// Fence-aware truncation used for the free-form content embedded in
/// instructions: slices to `max_chars`, re-closes any fence left dangling
/// by the cut, then appends a double-newline truncation marker.
pub fn truncate_content(content: &str, max_chars: usize) -> Result<String, InvalidMaxChars> {
    if max_chars < 1 {
        return Err(InvalidMaxChars(max_chars));
    }
    let original_len = content.chars().count();
    if original_len <= max_chars {
        return Ok(content.to_string());
    }
    let sliced: String = content.chars().take(max_chars).collect();
    let closed = close_unclosed_fences(&sliced);
    Ok(format!("{closed}\n\n... (truncated, original: {original_len} chars)"))
}

fn wrap_in_fence(content: &str) -> String {
    let mut fence = "```".to_string();
    while content.contains(&fence) {
        fence.push('`');
    }
    fence
}

pub struct SelectorContextInput<'a> {
    pub change_intent: &'a str,
    pub affected_files: &'a [String],
    pub relevant_conventions: &'a [String],
    pub issue_context: &'a str,
    pub referenced_content: &'a [PrefetchedReference],
    pub referenced_content_max_chars: usize,
}

impl Default for SelectorContextInput<'_> {
    fn default() -> Self {
        SelectorContextInput {
            change_intent: "",
            affected_files: &[],
            relevant_conventions: &[],
            issue_context: "",
            referenced_content: &[],
            referenced_content_max_chars: DEFAULT_REFERENCED_CONTENT_MAX_CHARS,
        }
    }
}

/// Builds the "## Selector Analysis Context" section from whichever
/// prefetched subsections are non-empty; returns "" if every subsection
/// is empty (nothing to add to the prompt). Each referenced-content entry
/// is truncated to `referenced_content_max_chars` before being fenced, so
/// the fence is computed from (and balanced against) the truncated text.
pub fn build_selector_context_section(input: &SelectorContextInput) -> String {
    let mut subsections = Vec::new();

    if !input.change_intent.is_empty() {
        subsections.push(format!("### Change Intent\n\n{}", input.change_intent));
    }
    if !input.affected_files.is_empty() {
        let bullets: Vec<String> = input.affected_files.iter().map(|f| format!("- {f}")).collect();
        subsections.push(format!("### Affected Files (Outside Diff)\n\n{}", bullets.join("\n")));
    }
    if !input.relevant_conventions.is_empty() {
        let bullets: Vec<String> = input.relevant_conventions.iter().map(|c| format!("- {c}")).collect();
        subsections.push(format!("### Relevant Project Conventions\n\n{}", bullets.join("\n")));
    }
    if !input.issue_context.is_empty() {
        subsections.push(format!("### Issue Context\n\n{}", input.issue_context));
    }
    if !input.referenced_content.is_empty() {
        let entries: Vec<String> = input
            .referenced_content
            .iter()
            .map(|reference| {
                let truncated = truncate_content(&reference.content, input.referenced_content_max_chars)
                    .unwrap_or_else(|_| reference.content.clone());
                let fence = wrap_in_fence(&truncated);
                format!(
                    "#### [{}] {}\n{fence}\n{}\n{fence}",
                    reference.reference_type, reference.reference_id, truncated
                )
            })
            .collect();
        subsections.push(format!("### Referenced Content\n\n{}", entries.join("\n\n")));
    }

    if subsections.is_empty() {
        return String::new();
    }
    format!("## Selector Analysis Context\n\n{}", subsections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_mode_includes_base_branch() {
        let target = ReviewTarget::Diff {
            base_branch: "main".to_string(),
            issue_number: None,
        };
        let instruction = build_review_instruction(&target, "diff text");
        assert!(instruction.contains("'main'"));
        assert!(instruction.contains("diff text"));
    }

    #[test]
    fn appends_related_issue_when_present() {
        let target = ReviewTarget::Pr {
            pr_number: 7,
            issue_number: Some(42),
        };
        let instruction = build_review_instruction(&target, "diff text");
        assert!(instruction.contains("Related Issue: #42"));
    }

    #[test]
    fn truncate_rejects_non_positive_max_chars() {
        assert!(truncate_content("x", 0).is_err());
    }

    #[test]
    fn truncate_reopens_closed_fence_left_dangling() {
        let content = "before\n```rust\nfn x() {}\n```\nafter this point keeps going";
        let truncated = truncate_content(content, 15).unwrap();
        assert!(truncated.trim_end().split('\n').last().unwrap().starts_with("```"));
    }

    #[test]
    fn selector_context_section_empty_when_all_fields_empty() {
        let input = SelectorContextInput::default();
        assert_eq!(build_selector_context_section(&input), "");
    }

    #[test]
    fn wrap_in_fence_widens_past_existing_backticks() {
        let fence = wrap_in_fence("some ```code``` inside");
        assert_eq!(fence, "````");
    }

    #[test]
    fn referenced_content_is_capped_before_fencing() {
        let long = "x".repeat(100);
        let references = [PrefetchedReference {
            reference_type: "issue".to_string(),
            reference_id: "42".to_string(),
            content: long,
        }];
        let input = SelectorContextInput {
            referenced_content: &references,
            referenced_content_max_chars: 10,
            ..Default::default()
        };
        let section = build_selector_context_section(&input);
        assert!(section.contains("truncated, original: 100 chars"));
        assert!(!section.contains(&"x".repeat(100)));
    }
}
