use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use review_core::agent_def::is_valid_agent_name;
use review_core::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 600.0;
pub const DEFAULT_MAX_TURNS: u32 = 30;
pub const DEFAULT_MODEL: &str = "anthropic:claude-3-5-sonnet-latest";
pub const DEFAULT_REFERENCED_CONTENT_MAX_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Markdown
    }
}

fn default_true() -> bool {
    true
}

fn default_convention_files() -> Vec<String> {
    review_prefetch_convention_defaults()
}

// Kept as a free function (rather than a dependency on review-prefetch,
// which would create a cycle back through review-prompt) so the default
// list stays in one place; review-prefetch re-exports the same constant.
fn review_prefetch_convention_defaults() -> Vec<String> {
    vec!["CLAUDE.md".to_string(), ".hachimoku/config.toml".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub model: Option<String>,
    pub timeout: Option<f64>,
    pub max_turns: Option<u32>,
    #[serde(default = "default_referenced_content_max_chars")]
    pub referenced_content_max_chars: usize,
    #[serde(default = "default_convention_files")]
    pub convention_files: Vec<String>,
}

fn default_referenced_content_max_chars() -> usize {
    DEFAULT_REFERENCED_CONTENT_MAX_CHARS
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            model: None,
            timeout: None,
            max_turns: None,
            referenced_content_max_chars: DEFAULT_REFERENCED_CONTENT_MAX_CHARS,
            convention_files: default_convention_files(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub model: Option<String>,
    pub timeout: Option<f64>,
    pub max_turns: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            enabled: true,
            model: None,
            timeout: None,
            max_turns: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub model: Option<String>,
    pub timeout: Option<f64>,
    pub max_turns: Option<u32>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            enabled: true,
            model: None,
            timeout: None,
            max_turns: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_true")]
    pub save_reviews: bool,
    #[serde(default)]
    pub show_cost: bool,
    #[serde(default = "default_max_files_per_review")]
    pub max_files_per_review: u32,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_max_files_per_review() -> u32 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: default_model(),
            timeout: default_timeout(),
            max_turns: default_max_turns(),
            parallel: true,
            base_branch: default_base_branch(),
            output_format: OutputFormat::default(),
            save_reviews: true,
            show_cost: false,
            max_files_per_review: default_max_files_per_review(),
            selector: SelectorConfig::default(),
            aggregation: AggregationConfig::default(),
            agents: HashMap::new(),
        }
    }
}

/// Per-field CLI overrides. `None` means "not specified on the command
/// line" and is dropped before merging, never treated as "reset to null".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub timeout: Option<f64>,
    pub max_turns: Option<u32>,
    pub parallel: Option<bool>,
    pub base_branch: Option<String>,
    pub output_format: Option<OutputFormat>,
}

/// Mirrors `SelectorConfig` with every field optional, so a layer that
/// sets only one key doesn't clobber the keys other layers set.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialSelectorConfig {
    model: Option<String>,
    timeout: Option<f64>,
    max_turns: Option<u32>,
    referenced_content_max_chars: Option<usize>,
    convention_files: Option<Vec<String>>,
}

/// Mirrors `AgentConfig`/`AggregationConfig` (same shape) with every
/// field optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialAgentConfig {
    enabled: Option<bool>,
    model: Option<String>,
    timeout: Option<f64>,
    max_turns: Option<u32>,
}

/// Mirrors `Config` with every field optional (or, for sub-tables, built
/// from the matching `Partial*Config`). One of these is parsed per config
/// layer so that only the keys actually present in that layer's TOML ever
/// override a lower-priority layer.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    model: Option<String>,
    timeout: Option<f64>,
    max_turns: Option<u32>,
    parallel: Option<bool>,
    base_branch: Option<String>,
    output_format: Option<OutputFormat>,
    save_reviews: Option<bool>,
    show_cost: Option<bool>,
    max_files_per_review: Option<u32>,
    #[serde(default)]
    selector: PartialSelectorConfig,
    #[serde(default)]
    aggregation: PartialAgentConfig,
    #[serde(default)]
    agents: HashMap<String, PartialAgentConfig>,
}

impl SelectorConfig {
    fn merge_partial(mut self, other: PartialSelectorConfig) -> Self {
        if let Some(v) = other.model {
            self.model = Some(v);
        }
        if let Some(v) = other.timeout {
            self.timeout = Some(v);
        }
        if let Some(v) = other.max_turns {
            self.max_turns = Some(v);
        }
        if let Some(v) = other.referenced_content_max_chars {
            self.referenced_content_max_chars = v;
        }
        if let Some(v) = other.convention_files {
            self.convention_files = v;
        }
        self
    }
}

impl AgentConfig {
    fn merge_partial(mut self, other: PartialAgentConfig) -> Self {
        if let Some(v) = other.enabled {
            self.enabled = v;
        }
        if let Some(v) = other.model {
            self.model = Some(v);
        }
        if let Some(v) = other.timeout {
            self.timeout = Some(v);
        }
        if let Some(v) = other.max_turns {
            self.max_turns = Some(v);
        }
        self
    }
}

impl AggregationConfig {
    fn merge_partial(mut self, other: PartialAgentConfig) -> Self {
        if let Some(v) = other.enabled {
            self.enabled = v;
        }
        if let Some(v) = other.model {
            self.model = Some(v);
        }
        if let Some(v) = other.timeout {
            self.timeout = Some(v);
        }
        if let Some(v) = other.max_turns {
            self.max_turns = Some(v);
        }
        self
    }
}

impl Config {
    pub fn validate_agent_names(&self) -> Result<(), ConfigError> {
        for name in self.agents.keys() {
            if !is_valid_agent_name(name) {
                return Err(ConfigError::InvalidAgentName(name.clone()));
            }
        }
        Ok(())
    }

    /// Applies one config layer on top of `self`, overriding only the
    /// keys the layer actually set. `selector`/`aggregation`/per-agent
    /// entries merge field-wise rather than replacing the whole table.
    fn merge_from(mut self, other: PartialConfig) -> Config {
        if let Some(v) = other.model {
            self.model = v;
        }
        if let Some(v) = other.timeout {
            self.timeout = v;
        }
        if let Some(v) = other.max_turns {
            self.max_turns = v;
        }
        if let Some(v) = other.parallel {
            self.parallel = v;
        }
        if let Some(v) = other.base_branch {
            self.base_branch = v;
        }
        if let Some(v) = other.output_format {
            self.output_format = v;
        }
        if let Some(v) = other.save_reviews {
            self.save_reviews = v;
        }
        if let Some(v) = other.show_cost {
            self.show_cost = v;
        }
        if let Some(v) = other.max_files_per_review {
            self.max_files_per_review = v;
        }
        self.selector = self.selector.merge_partial(other.selector);
        self.aggregation = self.aggregation.merge_partial(other.aggregation);
        for (name, partial_agent) in other.agents {
            let base = self.agents.remove(&name).unwrap_or_default();
            self.agents.insert(name, base.merge_partial(partial_agent));
        }
        self
    }

    fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Config {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(max_turns) = overrides.max_turns {
            self.max_turns = max_turns;
        }
        if let Some(parallel) = overrides.parallel {
            self.parallel = parallel;
        }
        if let Some(base_branch) = &overrides.base_branch {
            self.base_branch = base_branch.clone();
        }
        if let Some(output_format) = overrides.output_format {
            self.output_format = output_format;
        }
        self
    }

    /// Five-layer precedence, lowest to highest: built-in defaults,
    /// the user's global config, `<project>/hachimoku.toml`,
    /// `<project>/.hachimoku/config.toml`, then CLI overrides.
    pub fn load(project_root: &Path, overrides: &ConfigOverrides) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(global_dir) = directories::BaseDirs::new() {
            let global_path = global_dir.home_dir().join(".config/hachimoku/config.toml");
            if let Some(layer) = load_layer(&global_path)? {
                config = config.merge_from(layer);
            }
        }

        let project_config_path = project_root.join("hachimoku.toml");
        if let Some(layer) = load_layer(&project_config_path)? {
            config = config.merge_from(layer);
        }

        let local_config_path = project_root.join(".hachimoku/config.toml");
        if let Some(layer) = load_layer(&local_config_path)? {
            config = config.merge_from(layer);
        }

        config = config.apply_overrides(overrides);
        config.validate_agent_names()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let serialized = toml::to_string_pretty(self).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, serialized).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn is_agent_enabled(&self, name: &str) -> bool {
        self.agents.get(name).map(|a| a.enabled).unwrap_or(true)
    }
}

fn load_layer(path: &PathBuf) -> Result<Option<PartialConfig>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: PartialConfig = toml::from_str(&raw).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.max_turns, DEFAULT_MAX_TURNS);
        assert!(config.parallel);
        assert_eq!(config.base_branch, "main");
    }

    #[test]
    fn project_layer_overrides_global_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hachimoku.toml"), "base_branch = \"develop\"\n").unwrap();
        let config = Config::load(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.base_branch, "develop");
    }

    #[test]
    fn local_config_overrides_project_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hachimoku.toml"), "base_branch = \"develop\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join(".hachimoku")).unwrap();
        std::fs::write(dir.path().join(".hachimoku/config.toml"), "base_branch = \"trunk\"\n").unwrap();
        let config = Config::load(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.base_branch, "trunk");
    }

    #[test]
    fn merging_a_layer_does_not_clobber_keys_a_lower_layer_set() {
        let lower: PartialConfig = toml::from_str("timeout = 300.0\n").unwrap();
        let higher: PartialConfig = toml::from_str("parallel = false\n").unwrap();
        let config = Config::default().merge_from(lower).merge_from(higher);
        assert_eq!(config.timeout, 300.0);
        assert!(!config.parallel);
    }

    #[test]
    fn selector_table_merges_field_wise_across_layers() {
        let lower: PartialConfig = toml::from_str("[selector]\nmodel = \"review-model\"\n").unwrap();
        let higher: PartialConfig = toml::from_str("[selector]\ntimeout = 45.0\n").unwrap();
        let config = Config::default().merge_from(lower).merge_from(higher);
        assert_eq!(config.selector.model.as_deref(), Some("review-model"));
        assert_eq!(config.selector.timeout, Some(45.0));
    }

    #[test]
    fn per_agent_table_merges_field_wise_across_layers() {
        let lower: PartialConfig = toml::from_str("[agents.style]\nenabled = false\n").unwrap();
        let higher: PartialConfig = toml::from_str("[agents.style]\nmodel = \"review-model\"\n").unwrap();
        let config = Config::default().merge_from(lower).merge_from(higher);
        let style = config.agents.get("style").unwrap();
        assert!(!style.enabled);
        assert_eq!(style.model.as_deref(), Some("review-model"));
    }

    #[test]
    fn cli_overrides_win_over_every_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hachimoku.toml"), "base_branch = \"develop\"\n").unwrap();
        let overrides = ConfigOverrides {
            base_branch: Some("release".to_string()),
            ..Default::default()
        };
        let config = Config::load(dir.path(), &overrides).unwrap();
        assert_eq!(config.base_branch, "release");
    }

    #[test]
    fn rejects_invalid_agent_names() {
        let mut config = Config::default();
        config.agents.insert("Bad Name".to_string(), AgentConfig::default());
        assert!(matches!(config.validate_agent_names(), Err(ConfigError::InvalidAgentName(_))));
    }

    #[test]
    fn disabled_agent_is_not_enabled_by_default_lookup() {
        let mut config = Config::default();
        config.agents.insert(
            "style".to_string(),
            AgentConfig {
                enabled: false,
                ..Default::default()
            },
        );
        assert!(!config.is_agent_enabled("style"));
        assert!(config.is_agent_enabled("unconfigured"));
    }
}
