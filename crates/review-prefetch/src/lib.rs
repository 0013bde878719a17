use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use review_core::error::PrefetchError;
use review_core::target::ReviewTarget;
use review_tools::gh::{run_gh, GhToolError};
use review_tools::subprocess::SubprocessError;

pub const ISSUE_CONTEXT_MAX_CHARS: usize = 5000;
pub const PR_METADATA_MAX_CHARS: usize = 3000;
pub const CONVENTIONS_MAX_CHARS: usize = 5000;
pub const REFERENCED_ISSUE_MAX_CHARS: usize = 3000;

pub fn default_convention_files() -> Vec<String> {
    vec!["CLAUDE.md".to_string(), ".hachimoku/config.toml".to_string()]
}

#[derive(Debug, Clone)]
pub struct PrefetchedReference {
    pub reference_type: String,
    pub reference_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct PrefetchedContext {
    pub issue_context: String,
    pub pr_metadata: String,
    pub project_conventions: String,
    pub referenced_issues: Vec<PrefetchedReference>,
}

fn issue_ref_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\d+)").expect("static pattern is valid"))
}

/// Heuristic `#NNN` scan used to opportunistically prefetch issues the
/// diff/PR body mentions. `exclude` keeps out numbers already fetched
/// explicitly (e.g. the target's own issue_number).
pub fn extract_issue_references(content: &str, exclude: &HashSet<u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for captures in issue_ref_pattern().captures_iter(content) {
        if let Ok(num) = captures[1].parse::<u64>() {
            if num > 0 && !exclude.contains(&num) && seen.insert(num) {
                out.push(num);
            }
        }
    }
    out
}

/// Simpler than the fence-aware truncation in the instruction builder:
/// just a slice plus a marker, no code-fence bookkeeping.
fn truncate(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_chars).collect();
    format!("{truncated}\n... (truncated, original: {} chars)", content.chars().count())
}

fn map_gh_error(err: GhToolError) -> PrefetchError {
    match err {
        GhToolError::Policy(_) => PrefetchError::CommandNotFound { command: "gh".to_string() },
        GhToolError::Subprocess(sub) => map_subprocess_error(sub),
    }
}

fn map_subprocess_error(err: SubprocessError) -> PrefetchError {
    match err {
        SubprocessError::NotFound { command } => PrefetchError::CommandNotFound { command },
        SubprocessError::TimedOut { command, seconds } => PrefetchError::Timeout { command, seconds },
        SubprocessError::NonZeroExit { command, status, stderr } => PrefetchError::NonZeroExit { command, status, stderr },
        SubprocessError::InvalidUtf8 { .. } | SubprocessError::Spawn { .. } => {
            PrefetchError::CommandNotFound { command: "gh".to_string() }
        }
    }
}

async fn fetch_issue_context(issue_number: u64) -> Result<String, PrefetchError> {
    let number = issue_number.to_string();
    let output = run_gh(&["issue", "view", &number]).await.map_err(map_gh_error)?;
    Ok(truncate(&output.stdout, ISSUE_CONTEXT_MAX_CHARS))
}

async fn fetch_pr_metadata(pr_number: u64) -> Result<String, PrefetchError> {
    let number = pr_number.to_string();
    let output = run_gh(&["pr", "view", &number]).await.map_err(map_gh_error)?;
    Ok(truncate(&output.stdout, PR_METADATA_MAX_CHARS))
}

/// Missing convention files are silently skipped (most projects won't
/// have all of them); an existing-but-unreadable file is a real error.
fn read_project_conventions(convention_files: &[String], project_root: &Path) -> Result<String, PrefetchError> {
    let mut sections = Vec::new();
    for rel_path in convention_files {
        let file_path = project_root.join(rel_path);
        if !file_path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&file_path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::InvalidData {
                PrefetchError::InvalidUtf8 { path: rel_path.clone() }
            } else {
                PrefetchError::Io { path: rel_path.clone(), source }
            }
        })?;
        sections.push(format!("--- {rel_path} ---\n{}", truncate(&content, CONVENTIONS_MAX_CHARS)));
    }
    Ok(sections.join("\n\n"))
}

/// Heuristic references are best-effort: a failure to fetch one is logged
/// and skipped rather than propagated, since these numbers were merely
/// guessed out of free text.
async fn fetch_referenced_issues(issue_numbers: &[u64]) -> Vec<PrefetchedReference> {
    let mut out = Vec::new();
    for &number in issue_numbers {
        match fetch_issue_context(number).await {
            Ok(content) => out.push(PrefetchedReference {
                reference_type: "issue".to_string(),
                reference_id: number.to_string(),
                content: truncate(&content, REFERENCED_ISSUE_MAX_CHARS),
            }),
            Err(err) => {
                tracing::warn!(issue_number = number, error = %err, "skipping unreachable referenced issue");
            }
        }
    }
    out
}

/// Orchestrates every prefetch source for a review target. Explicitly
/// named resources (the target's own issue/PR) propagate failures;
/// convention files only propagate on unreadable-but-present files;
/// heuristic `#NNN` references never propagate failures.
pub async fn prefetch_selector_context(
    target: &ReviewTarget,
    resolved_content: &str,
    convention_files: &[String],
    project_root: &Path,
) -> Result<PrefetchedContext, PrefetchError> {
    let mut context = PrefetchedContext::default();

    if let Some(issue_number) = target.issue_number() {
        context.issue_context = fetch_issue_context(issue_number).await?;
    }
    if let ReviewTarget::Pr { pr_number, .. } = target {
        context.pr_metadata = fetch_pr_metadata(*pr_number).await?;
    }

    context.project_conventions = read_project_conventions(convention_files, project_root)?;

    let exclude: HashSet<u64> = target.issue_number().into_iter().collect();
    let heuristic_refs = extract_issue_references(resolved_content, &exclude);
    context.referenced_issues = fetch_referenced_issues(&heuristic_refs).await;

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_issue_numbers_excluding_given_set() {
        let mut exclude = HashSet::new();
        exclude.insert(42);
        let refs = extract_issue_references("see #42 and #7, also #7 again", &exclude);
        assert_eq!(refs, vec![7]);
    }

    #[test]
    fn truncate_uses_single_newline_marker() {
        let long = "a".repeat(10);
        let truncated = truncate(&long, 3);
        assert_eq!(truncated, "aaa\n... (truncated, original: 10 chars)");
    }

    #[test]
    fn truncate_is_noop_under_limit() {
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn missing_convention_file_is_silently_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_project_conventions(&["CLAUDE.md".to_string()], dir.path()).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn present_convention_file_is_included() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CLAUDE.md"), "be terse").unwrap();
        let result = read_project_conventions(&["CLAUDE.md".to_string()], dir.path()).unwrap();
        assert!(result.contains("be terse"));
    }
}
