use review_core::error::ToolPolicyError;

use crate::subprocess::{self, SubprocessError, SubprocessOutput};

const ALLOWED_TWO_WORD: &[(&str, &str)] = &[("pr", "view"), ("pr", "diff"), ("issue", "view")];
const ALLOWED_ONE_WORD: &[&str] = &["api"];

const IMPLICIT_POST_FLAGS: &[&str] = &["-f", "--field", "-F", "--raw-field", "--input"];

pub fn validate(args: &[&str]) -> Result<(), ToolPolicyError> {
    let allowed = match (args.first(), args.get(1)) {
        (Some(&a), Some(&b)) if ALLOWED_TWO_WORD.contains(&(a, b)) => true,
        (Some(&a), _) if ALLOWED_ONE_WORD.contains(&a) => true,
        _ => false,
    };
    if !allowed {
        return Err(ToolPolicyError::SubcommandNotAllowed {
            command: "gh".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
    }
    if args.first() == Some(&"api") {
        validate_api_call(args)?;
    }
    Ok(())
}

fn validate_api_call(args: &[&str]) -> Result<(), ToolPolicyError> {
    for flag in IMPLICIT_POST_FLAGS {
        if args.iter().any(|a| a == flag) {
            return Err(ToolPolicyError::ImplicitPostFlag((*flag).to_string()));
        }
    }
    let mut iter = args.iter().peekable();
    while let Some(&arg) = iter.next() {
        let method = if arg == "-X" || arg == "--method" {
            iter.next().copied()
        } else if let Some(value) = arg.strip_prefix("--method=") {
            Some(value)
        } else {
            None
        };
        if let Some(method) = method {
            if method.to_uppercase() != "GET" {
                return Err(ToolPolicyError::NonGetApiMethod);
            }
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum GhToolError {
    #[error(transparent)]
    Policy(#[from] ToolPolicyError),
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

pub async fn run_gh(args: &[&str]) -> Result<SubprocessOutput, GhToolError> {
    validate(args)?;
    Ok(subprocess::run("gh", args).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_pr_view_and_diff() {
        assert!(validate(&["pr", "view", "42"]).is_ok());
        assert!(validate(&["pr", "diff", "42"]).is_ok());
    }

    #[test]
    fn allows_get_api_calls() {
        assert!(validate(&["api", "repos/x/y"]).is_ok());
        assert!(validate(&["api", "-X", "GET", "repos/x/y"]).is_ok());
    }

    #[test]
    fn rejects_non_get_api_method() {
        assert!(matches!(validate(&["api", "-X", "POST", "repos/x/y"]), Err(ToolPolicyError::NonGetApiMethod)));
        assert!(matches!(validate(&["api", "--method=post", "repos/x/y"]), Err(ToolPolicyError::NonGetApiMethod)));
    }

    #[test]
    fn rejects_implicit_post_flags() {
        assert!(matches!(validate(&["api", "-f", "key=value"]), Err(ToolPolicyError::ImplicitPostFlag(_))));
    }

    #[test]
    fn rejects_unlisted_subcommands() {
        assert!(validate(&["pr", "merge"]).is_err());
        assert!(validate(&["repo", "clone"]).is_err());
    }
}
