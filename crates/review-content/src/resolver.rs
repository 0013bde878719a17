use review_core::error::ContentResolveError;
use review_core::target::ReviewTarget;
use review_tools::gh::{run_gh, GhToolError};
use review_tools::git::{run_git, GitToolError};
use review_tools::subprocess::SubprocessError;

fn map_git_error(err: GitToolError) -> ContentResolveError {
    match err {
        GitToolError::Policy(_) => ContentResolveError::CommandNotFound { command: "git".to_string() },
        GitToolError::Subprocess(sub) => map_subprocess_error("git", sub),
    }
}

fn map_gh_error(err: GhToolError) -> ContentResolveError {
    match err {
        GhToolError::Policy(_) => ContentResolveError::CommandNotFound { command: "gh".to_string() },
        GhToolError::Subprocess(sub) => map_subprocess_error("gh", sub),
    }
}

fn map_subprocess_error(command: &str, err: SubprocessError) -> ContentResolveError {
    match err {
        SubprocessError::NotFound { .. } => ContentResolveError::CommandNotFound { command: command.to_string() },
        SubprocessError::TimedOut { seconds, .. } => ContentResolveError::Timeout { command: command.to_string(), seconds },
        SubprocessError::NonZeroExit { status, stderr, .. } => {
            ContentResolveError::NonZeroExit { command: command.to_string(), status, stderr }
        }
        SubprocessError::InvalidUtf8 { .. } => ContentResolveError::InvalidUtf8 { path: command.to_string() },
        SubprocessError::Spawn { source, .. } => ContentResolveError::Io { path: command.to_string(), source },
    }
}

/// Resolves a review target into the raw text an agent should see: a
/// unified diff for Diff/Pr targets, or concatenated file contents for
/// File targets.
pub async fn resolve_content(target: &ReviewTarget) -> Result<String, ContentResolveError> {
    match target {
        ReviewTarget::Diff { base_branch, .. } => resolve_diff(base_branch).await,
        ReviewTarget::Pr { pr_number, .. } => resolve_pr_diff(*pr_number).await,
        ReviewTarget::File { paths, .. } => resolve_file_content(paths),
    }
}

async fn resolve_diff(base_branch: &str) -> Result<String, ContentResolveError> {
    let merge_base_output = run_git(&["merge-base", base_branch, "HEAD"]).await.map_err(map_git_error)?;
    let merge_base = merge_base_output.stdout.trim();
    if merge_base.is_empty() {
        return Err(ContentResolveError::NoMergeBase {
            base_branch: base_branch.to_string(),
        });
    }
    let diff_output = run_git(&["diff", merge_base]).await.map_err(map_git_error)?;
    Ok(diff_output.stdout)
}

async fn resolve_pr_diff(pr_number: u64) -> Result<String, ContentResolveError> {
    let pr_number_str = pr_number.to_string();
    let output = run_gh(&["pr", "diff", &pr_number_str]).await.map_err(map_gh_error)?;
    Ok(output.stdout)
}

fn resolve_file_content(paths: &[String]) -> Result<String, ContentResolveError> {
    let mut sections = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::InvalidData {
                ContentResolveError::InvalidUtf8 { path: path.clone() }
            } else {
                ContentResolveError::Io { path: path.clone(), source }
            }
        })?;
        sections.push(format!("--- {path} ---\n{content}"));
    }
    Ok(sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_target_joins_sections_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();
        let content = resolve_file_content(&[path.to_string_lossy().into_owned()]).unwrap();
        assert!(content.starts_with("--- "));
        assert!(content.ends_with("hello"));
    }

    #[test]
    fn file_target_propagates_missing_file_as_io_error() {
        let result = resolve_file_content(&["/no/such/file".to_string()]);
        assert!(matches!(result, Err(ContentResolveError::Io { .. })));
    }
}
