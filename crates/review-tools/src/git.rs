use review_core::error::ToolPolicyError;

use crate::subprocess::{self, SubprocessError, SubprocessOutput};

const ALLOWED_SUBCOMMANDS: &[&str] = &[
    "diff",
    "log",
    "show",
    "status",
    "merge-base",
    "rev-parse",
    "branch",
    "ls-files",
];

pub fn validate(args: &[&str]) -> Result<(), ToolPolicyError> {
    let first = args.first().copied().unwrap_or("(empty)");
    if !ALLOWED_SUBCOMMANDS.contains(&first) {
        return Err(ToolPolicyError::SubcommandNotAllowed {
            command: "git".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum GitToolError {
    #[error(transparent)]
    Policy(#[from] ToolPolicyError),
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

pub async fn run_git(args: &[&str]) -> Result<SubprocessOutput, GitToolError> {
    validate(args)?;
    Ok(subprocess::run("git", args).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_whitelisted_subcommand() {
        assert!(validate(&["diff", "HEAD"]).is_ok());
    }

    #[test]
    fn rejects_unlisted_subcommand() {
        assert!(matches!(validate(&["push"]), Err(ToolPolicyError::SubcommandNotAllowed { .. })));
    }

    #[test]
    fn rejects_empty_args() {
        assert!(validate(&[]).is_err());
    }
}
