use std::path::{Path, PathBuf};

use review_config::builtin::BUILTIN_AGENTS;
use review_config::DEFAULT_MAX_TURNS;

const CONFIG_TEMPLATE: &str = r#"# hachimoku configuration
# Uncomment and modify settings as needed.

# --- Execution Settings ---

# LLM model name
# model = "anthropic:claude-3-5-sonnet-latest"

# Timeout in seconds
# timeout = 600

# Maximum agent turns
# max_turns = {max_turns}

# Enable parallel execution
# parallel = true

# Base branch for diff mode
# base_branch = "main"

# --- Output Settings ---

# Output format: "markdown" or "json"
# output_format = "markdown"

# Save review results to .hachimoku/reviews/
# save_reviews = true

# Show cost information
# show_cost = false

# --- File Mode Settings ---

# Maximum files per review
# max_files_per_review = 100

# --- Selector Agent Settings ---

# [selector]
# model = "anthropic:claude-3-5-sonnet-latest"
# timeout = 600
# max_turns = {max_turns}

# --- Agent-Specific Settings ---
# Override settings for individual agents. Agent names must match
# definition file names (without .toml).
#
# [agents.correctness]
# enabled = true
# timeout = 600
# max_turns = {max_turns}
"#;

const GITIGNORE_ENTRY: &str = "/.hachimoku/";

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("not a Git repository: {0}\nRun 'git init' to initialize a Git repository first.")]
    NotAGitRepository(String),
    #[error("failed to write {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

#[derive(Debug, Default)]
pub struct InitResult {
    pub created: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

fn write_if_absent(result: &mut InitResult, path: &Path, contents: &str, force: bool) -> Result<(), InitError> {
    if path.exists() && !force {
        result.skipped.push(path.to_path_buf());
        return Ok(());
    }
    std::fs::write(path, contents).map_err(|source| InitError::Io {
        path: path.display().to_string(),
        source,
    })?;
    result.created.push(path.to_path_buf());
    Ok(())
}

fn ensure_gitignore(project_root: &Path) -> Result<(), InitError> {
    let gitignore_path = project_root.join(".gitignore");
    let existing = std::fs::read_to_string(&gitignore_path).unwrap_or_default();
    if existing.lines().any(|line| line == GITIGNORE_ENTRY) {
        return Ok(());
    }
    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str("# hachimoku\n");
    content.push_str(GITIGNORE_ENTRY);
    content.push('\n');
    std::fs::write(&gitignore_path, content).map_err(|source| InitError::Io {
        path: gitignore_path.display().to_string(),
        source,
    })
}

/// Scaffolds `.hachimoku/config.toml`, the built-in agent definitions
/// under `.hachimoku/agents/`, an empty `.hachimoku/reviews/` directory,
/// and a `/.hachimoku/` entry in `.gitignore`. Existing files are left
/// alone unless `force` is set.
pub fn run_init(project_root: &Path, force: bool) -> Result<InitResult, InitError> {
    if !project_root.join(".git").exists() {
        return Err(InitError::NotAGitRepository(project_root.display().to_string()));
    }

    let hachimoku_dir = project_root.join(".hachimoku");
    let agents_dir = hachimoku_dir.join("agents");
    let reviews_dir = hachimoku_dir.join("reviews");
    for dir in [&hachimoku_dir, &agents_dir, &reviews_dir] {
        std::fs::create_dir_all(dir).map_err(|source| InitError::Io {
            path: dir.display().to_string(),
            source,
        })?;
    }

    let mut result = InitResult::default();

    let config_path = hachimoku_dir.join("config.toml");
    let config_contents = CONFIG_TEMPLATE.replace("{max_turns}", &DEFAULT_MAX_TURNS.to_string());
    write_if_absent(&mut result, &config_path, &config_contents, force)?;

    for (filename, contents) in BUILTIN_AGENTS {
        let dest = agents_dir.join(filename);
        write_if_absent(&mut result, &dest, contents, force)?;
    }

    ensure_gitignore(project_root)?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_outside_a_git_repository() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_init(dir.path(), false).unwrap_err();
        assert!(matches!(err, InitError::NotAGitRepository(_)));
    }

    #[test]
    fn scaffolds_config_and_builtin_agents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let result = run_init(dir.path(), false).unwrap();
        assert!(dir.path().join(".hachimoku/config.toml").exists());
        assert!(dir.path().join(".hachimoku/reviews").is_dir());
        assert!(!result.created.is_empty());
    }

    #[test]
    fn second_run_skips_existing_files_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        run_init(dir.path(), false).unwrap();
        let second = run_init(dir.path(), false).unwrap();
        assert!(second.created.is_empty());
        assert!(!second.skipped.is_empty());
    }
}
