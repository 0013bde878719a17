use clap::{Parser, Subcommand};

fn build_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[derive(Parser)]
#[command(name = "hachimoku", version = build_version())]
#[command(about = "Multi-agent code review orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a review against a diff, a pull request, or a set of files.
    Review(ReviewArgs),
    /// Scaffold .hachimoku/config.toml and a starter agent definition.
    Init(InitArgs),
}

#[derive(clap::Args)]
#[command(group(
    clap::ArgGroup::new("target")
        .args(["diff", "pr"])
        .multiple(false)
))]
pub struct ReviewArgs {
    /// Review the diff against this base branch (default: config.base_branch).
    #[arg(long)]
    pub diff: Option<String>,

    /// Review a pull request by number.
    #[arg(long)]
    pub pr: Option<u64>,

    /// Review specific files or directories instead of a diff.
    pub paths: Vec<String>,

    /// Related issue number to pre-fetch context for.
    #[arg(long)]
    pub issue: Option<u64>,

    /// Run selected agents concurrently (overrides config.parallel).
    #[arg(long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Run selected agents one at a time (overrides config.parallel).
    #[arg(long)]
    pub sequential: bool,

    /// Output format: markdown or json (overrides config.output_format).
    #[arg(long)]
    pub format: Option<String>,

    /// Model to use for every agent (overrides config.model).
    #[arg(long)]
    pub model: Option<String>,

    /// Per-agent timeout in seconds (overrides config.timeout).
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Run from a different project root instead of the current directory.
    #[arg(long)]
    pub cd: Option<String>,
}

#[derive(clap::Args)]
pub struct InitArgs {
    /// Overwrite an existing .hachimoku/config.toml if present.
    #[arg(long)]
    pub force: bool,

    /// Run from a different project root instead of the current directory.
    #[arg(long)]
    pub cd: Option<String>,
}
