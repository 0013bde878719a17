use std::path::Path;

use review_core::error::InputResolveError;
use review_core::target::ReviewTarget;

use crate::cli::ReviewArgs;

/// Resolves the CLI's positional arguments (plus `--diff`/`--pr`) into a
/// single `ReviewTarget`. An integer-only positional argument means a PR
/// number; anything path-shaped means File targets; no positional
/// arguments at all falls back to a Diff against `--diff` or the
/// configured base branch. Mixing an integer with path-shaped arguments
/// is rejected rather than guessed at.
pub fn resolve_target(args: &ReviewArgs, default_base_branch: &str) -> Result<ReviewTarget, InputResolveError> {
    if let Some(pr_number) = args.pr {
        if !args.paths.is_empty() {
            return Err(InputResolveError::AmbiguousTarget);
        }
        return Ok(ReviewTarget::Pr {
            pr_number,
            issue_number: args.issue,
        });
    }

    if !args.paths.is_empty() {
        let mut pr_like = Vec::new();
        let mut path_like = Vec::new();
        for raw in &args.paths {
            if raw.parse::<u64>().is_ok() {
                pr_like.push(raw.clone());
            } else {
                path_like.push(raw.clone());
            }
        }

        if !pr_like.is_empty() && !path_like.is_empty() {
            return Err(InputResolveError::AmbiguousTarget);
        }

        if path_like.is_empty() && pr_like.len() == 1 {
            let pr_number: u64 = pr_like[0].parse().expect("validated above");
            return Ok(ReviewTarget::Pr {
                pr_number,
                issue_number: args.issue,
            });
        }

        if !pr_like.is_empty() {
            return Err(InputResolveError::AmbiguousTarget);
        }

        for raw in &path_like {
            if !Path::new(raw).exists() {
                return Err(InputResolveError::PathNotFound(raw.clone()));
            }
        }
        return Ok(ReviewTarget::File {
            paths: path_like,
            issue_number: args.issue,
        });
    }

    Ok(ReviewTarget::Diff {
        base_branch: args.diff.clone().unwrap_or_else(|| default_base_branch.to_string()),
        issue_number: args.issue,
    })
}
