mod backend;
mod cli;
mod history;
mod init;
mod render;
mod target;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ReviewArgs};
use review_config::{Config, ConfigOverrides};
use review_core::exit_code::ExitCode;
use review_engine::EngineDeps;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Review(args) => run_review_command(args).await?,
        Commands::Init(args) => run_init_command(args)?,
    };

    std::process::exit(exit_code);
}

fn project_root_for(cd: Option<&str>) -> Result<PathBuf> {
    match cd {
        Some(path) => Ok(PathBuf::from(path)),
        None => std::env::current_dir().context("failed to determine current directory"),
    }
}

async fn run_review_command(args: ReviewArgs) -> Result<i32> {
    let project_root = project_root_for(args.cd.as_deref())?;

    let overrides = ConfigOverrides {
        model: args.model.clone(),
        timeout: args.timeout,
        max_turns: None,
        parallel: if args.parallel {
            Some(true)
        } else if args.sequential {
            Some(false)
        } else {
            None
        },
        base_branch: args.diff.clone(),
        output_format: match &args.format {
            Some(raw) => Some(raw.parse().map_err(|e: String| anyhow::anyhow!(e))?),
            None => None,
        },
    };

    let base_branch_for_target = args.diff.clone().unwrap_or_else(|| "main".to_string());
    let target = match target::resolve_target(&args, &base_branch_for_target) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(ExitCode::InputError.code());
        }
    };

    let config = Config::load(&project_root, &overrides).context("failed to load configuration")?;
    let output_format = config.output_format;

    let backend = Arc::new(backend::UnconfiguredBackend);
    let deps = EngineDeps {
        project_root: project_root.clone(),
        custom_agents_dir: Some(project_root.join(".hachimoku/agents")),
        agent_backend: backend.clone(),
        selector_backend: backend.clone(),
        aggregator_backend: backend,
    };

    let result = review_engine::run_review(target.clone(), overrides, &deps).await;

    if config.save_reviews {
        let reviewed_at = chrono::Utc::now();
        if let Err(err) = history::save_review_history(&project_root, &target, &result.report, reviewed_at).await {
            eprintln!("Warning: failed to save review history: {err}");
        }
    }

    print!("{}", render::render(&result.report, output_format));
    Ok(result.exit_code.code())
}

fn run_init_command(args: cli::InitArgs) -> Result<i32> {
    let project_root = project_root_for(args.cd.as_deref())?;
    match init::run_init(&project_root, args.force) {
        Ok(result) => {
            for path in &result.created {
                println!("created: {}", path.display());
            }
            for path in &result.skipped {
                println!("skipped (already exists): {}", path.display());
            }
            Ok(ExitCode::Success.code())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::InputError.code())
        }
    }
}
