use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

pub const SUBPROCESS_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone)]
pub struct SubprocessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("command not found: {command}")]
    NotFound { command: String },
    #[error("{command} timed out after {seconds}s")]
    TimedOut { command: String, seconds: u64 },
    #[error("{command} exited with status {status}: {stderr}")]
    NonZeroExit { command: String, status: i32, stderr: String },
    #[error("failed to decode {command} output as UTF-8")]
    InvalidUtf8 { command: String },
    #[error("failed to spawn {command}: {source}")]
    Spawn { command: String, #[source] source: std::io::Error },
}

/// Runs `program args...` with a fixed timeout, killing the whole process
/// group (not just the direct child) if it expires. stdout/stderr are
/// decoded strictly as UTF-8 — a lossy decode would silently corrupt diff
/// content, so decode failures become errors instead.
pub async fn run(program: &str, args: &[&str]) -> Result<SubprocessOutput, SubprocessError> {
    run_with_timeout(program, args, Duration::from_secs(SUBPROCESS_TIMEOUT_SECONDS)).await
}

pub async fn run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<SubprocessOutput, SubprocessError> {
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    unsafe {
        command.pre_exec(|| {
            libc::setpgid(0, 0);
            Ok(())
        });
    }

    let mut child = command.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SubprocessError::NotFound { command: program.to_string() }
        } else {
            SubprocessError::Spawn { command: program.to_string(), source }
        }
    })?;

    let pid = child.id().map(|p| p as i32);

    let result = tokio::time::timeout(timeout, child.wait_with_output()).await;
    match result {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8(output.stdout)
                .map_err(|_| SubprocessError::InvalidUtf8 { command: program.to_string() })?;
            let stderr = String::from_utf8(output.stderr)
                .map_err(|_| SubprocessError::InvalidUtf8 { command: program.to_string() })?;
            let status = output.status.code().unwrap_or(-1);
            if status != 0 {
                return Err(SubprocessError::NonZeroExit { command: program.to_string(), status, stderr });
            }
            Ok(SubprocessOutput { stdout, stderr, status })
        }
        Ok(Err(source)) => Err(SubprocessError::Spawn { command: program.to_string(), source }),
        Err(_) => {
            if let Some(pid) = pid {
                unsafe {
                    libc::kill(-pid, libc::SIGKILL);
                }
            }
            Err(SubprocessError::TimedOut {
                command: program.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_a_simple_command() {
        let output = run("echo", &["hello"]).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn missing_command_is_not_found() {
        let err = run("definitely-not-a-real-binary-xyz", &[]).await.unwrap_err();
        assert!(matches!(err, SubprocessError::NotFound { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let err = run("sh", &["-c", "exit 3"]).await.unwrap_err();
        match err {
            SubprocessError::NonZeroExit { status, .. } => assert_eq!(status, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_kills_the_process() {
        let err = run_with_timeout("sleep", &["5"], Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, SubprocessError::TimedOut { .. }));
    }
}
