use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use review_core::report::{ReviewReport, ReviewSummary};
use review_core::target::ReviewTarget;
use review_tools::git::run_git;

const DIFF_FILENAME: &str = "diff.jsonl";
const FILES_FILENAME: &str = "files.jsonl";

#[derive(Debug, thiserror::Error)]
pub enum HistoryWriteError {
    #[error("failed to create reviews directory {path}: {source}")]
    CreateDir { path: String, source: std::io::Error },
    #[error("failed to write review history to {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("failed to read git info: {0}")]
    GitInfo(String),
}

fn jsonl_path(reviews_dir: &Path, target: &ReviewTarget) -> PathBuf {
    match target {
        ReviewTarget::Diff { .. } => reviews_dir.join(DIFF_FILENAME),
        ReviewTarget::Pr { pr_number, .. } => reviews_dir.join(format!("pr-{pr_number}.jsonl")),
        ReviewTarget::File { .. } => reviews_dir.join(FILES_FILENAME),
    }
}

async fn git_info() -> Result<(String, String), HistoryWriteError> {
    let commit = run_git(&["rev-parse", "HEAD"]).await.map_err(|err| HistoryWriteError::GitInfo(err.to_string()))?;
    let branch = run_git(&["rev-parse", "--abbrev-ref", "HEAD"])
        .await
        .map_err(|err| HistoryWriteError::GitInfo(err.to_string()))?;
    Ok((commit.stdout.trim().to_string(), branch.stdout.trim().to_string()))
}

#[derive(Debug, serde::Serialize)]
#[serde(tag = "review_mode", rename_all = "lowercase")]
enum ReviewHistoryRecord<'a> {
    Diff {
        commit_hash: String,
        branch_name: String,
        reviewed_at: DateTime<Utc>,
        results: &'a [review_core::AgentResult],
        summary: &'a ReviewSummary,
    },
    Pr {
        commit_hash: String,
        pr_number: u64,
        branch_name: String,
        reviewed_at: DateTime<Utc>,
        results: &'a [review_core::AgentResult],
        summary: &'a ReviewSummary,
    },
    File {
        file_paths: Vec<String>,
        reviewed_at: DateTime<Utc>,
        working_directory: String,
        results: &'a [review_core::AgentResult],
        summary: &'a ReviewSummary,
    },
}

/// Appends one JSON-object-per-line record describing this run to
/// `<project_root>/.hachimoku/reviews/`, picking the filename by target
/// shape. Diff/PR records carry the current commit hash and branch name;
/// file records carry the deduplicated, order-preserving path list and
/// the working directory instead.
pub async fn save_review_history(project_root: &Path, target: &ReviewTarget, report: &ReviewReport, reviewed_at: DateTime<Utc>) -> Result<PathBuf, HistoryWriteError> {
    let reviews_dir = project_root.join(".hachimoku/reviews");
    std::fs::create_dir_all(&reviews_dir).map_err(|source| HistoryWriteError::CreateDir {
        path: reviews_dir.display().to_string(),
        source,
    })?;

    let record = match target {
        ReviewTarget::Diff { .. } => {
            let (commit_hash, branch_name) = git_info().await?;
            ReviewHistoryRecord::Diff {
                commit_hash,
                branch_name,
                reviewed_at,
                results: &report.results,
                summary: &report.summary,
            }
        }
        ReviewTarget::Pr { pr_number, .. } => {
            let (commit_hash, branch_name) = git_info().await?;
            ReviewHistoryRecord::Pr {
                commit_hash,
                pr_number: *pr_number,
                branch_name,
                reviewed_at,
                results: &report.results,
                summary: &report.summary,
            }
        }
        ReviewTarget::File { paths, .. } => {
            let mut seen = BTreeSet::new();
            let file_paths: Vec<String> = paths.iter().filter(|p| seen.insert((*p).clone())).cloned().collect();
            let working_directory = std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_default();
            ReviewHistoryRecord::File {
                file_paths,
                reviewed_at,
                working_directory,
                results: &report.results,
                summary: &report.summary,
            }
        }
    };

    let path = jsonl_path(&reviews_dir, target);
    let line = serde_json::to_string(&record).expect("history record always serializes");
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path).map_err(|source| HistoryWriteError::Write {
        path: path.display().to_string(),
        source,
    })?;
    writeln!(file, "{line}").map_err(|source| HistoryWriteError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_core::report::ReviewSummary;

    #[tokio::test]
    async fn file_target_writes_to_files_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReviewReport {
            results: vec![],
            summary: ReviewSummary::new(&[], 0.0, None),
            load_errors: vec![],
            aggregated: None,
            aggregation_error: None,
        };
        let target = ReviewTarget::File {
            paths: vec!["a.rs".to_string(), "a.rs".to_string()],
            issue_number: None,
        };
        let path = save_review_history(dir.path(), &target, &report, Utc::now()).await.unwrap();
        assert!(path.ends_with("files.jsonl"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn pr_target_names_file_after_pr_number() {
        let reviews_dir = Path::new(".hachimoku/reviews");
        let target = ReviewTarget::Pr {
            pr_number: 7,
            issue_number: None,
        };
        assert_eq!(jsonl_path(reviews_dir, &target), reviews_dir.join("pr-7.jsonl"));
    }
}
