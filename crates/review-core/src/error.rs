use thiserror::Error;

/// Errors surfaced while resolving the content a review target points at
/// (diffs, PR diffs, file reads).
#[derive(Debug, Error)]
pub enum ContentResolveError {
    #[error("command not found: {command}. Ensure {command} is installed and available in PATH.")]
    CommandNotFound { command: String },
    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
    #[error("{command} exited with status {status}: {stderr}")]
    NonZeroExit { command: String, status: i32, stderr: String },
    #[error("base branch has no merge base with HEAD: {base_branch}")]
    NoMergeBase { base_branch: String },
    #[error("failed to decode {path} as UTF-8")]
    InvalidUtf8 { path: String },
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("command not found: {command}. Ensure {command} is installed and available in PATH.")]
    CommandNotFound { command: String },
    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
    #[error("{command} exited with status {status}: {stderr}")]
    NonZeroExit { command: String, status: i32, stderr: String },
    #[error("failed to read convention file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to decode convention file {path} as UTF-8")]
    InvalidUtf8 { path: String },
}

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("selector run failed: {message}")]
    Failed {
        message: String,
        exit_code: Option<i32>,
        error_type: Option<String>,
        stderr: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("aggregator run failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum DefinitionLoadError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
    #[error("failed to read {file}: {source}")]
    Io { file: String, #[source] source: std::io::Error },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
    #[error("failed to read config {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to write config {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },
    #[error("invalid agent name in config: {0}")]
    InvalidAgentName(String),
}

#[derive(Debug, Error)]
pub enum ToolPolicyError {
    #[error("unknown tool category: {0}")]
    UnknownCategory(String),
    #[error("subcommand not allowed: {command} {args:?}")]
    SubcommandNotAllowed { command: String, args: Vec<String> },
    #[error("gh api calls must be GET; rejected method override")]
    NonGetApiMethod,
    #[error("gh api calls may not use implicit-POST flag: {0}")]
    ImplicitPostFlag(String),
}

#[derive(Debug, Error)]
pub enum InputResolveError {
    #[error("ambiguous target: cannot combine a PR number with file paths")]
    AmbiguousTarget,
    #[error("no such path: {0}")]
    PathNotFound(String),
}
