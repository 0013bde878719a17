use std::path::Path;

use review_core::agent_def::{AgentDefinition, AggregatorDefinition, LoadError, LoadResult, SelectorDefinition};
use review_core::error::DefinitionLoadError;

use crate::builtin;

pub const SELECTOR_FILENAME: &str = "selector.toml";
pub const AGGREGATOR_FILENAME: &str = "aggregator.toml";

fn parse_agent(source: &str, file: &str) -> Result<AgentDefinition, DefinitionLoadError> {
    toml::from_str(source).map_err(|err| DefinitionLoadError::Parse {
        file: file.to_string(),
        message: err.to_string(),
    })
}

/// Loads every agent definition: the embedded built-in set first, then
/// `custom_dir` (a project's `.hachimoku/agents/`) if present, with a
/// custom agent whose name matches a built-in replacing it. Files named
/// `selector.toml`/`aggregator.toml` are excluded — they're not agents.
/// A single file's parse failure is recorded as a `LoadError` and does
/// not abort loading the rest.
pub fn load_agents(custom_dir: Option<&Path>) -> LoadResult {
    let mut result = LoadResult::default();

    for (file, source) in builtin::BUILTIN_AGENTS {
        match parse_agent(source, file) {
            Ok(def) => result.agents.push(def),
            Err(err) => result.errors.push(LoadError {
                source: "builtin".to_string(),
                file: (*file).to_string(),
                message: err.to_string(),
            }),
        }
    }

    let Some(dir) = custom_dir else {
        return result;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return result;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name == SELECTOR_FILENAME || file_name == AGGREGATOR_FILENAME {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        match std::fs::read_to_string(&path).map_err(|source| DefinitionLoadError::Io {
            file: file_name.to_string(),
            source,
        }) {
            Ok(raw) => match parse_agent(&raw, file_name) {
                Ok(def) => {
                    result.agents.retain(|existing| existing.name != def.name);
                    result.agents.push(def);
                }
                Err(err) => result.errors.push(LoadError {
                    source: "custom".to_string(),
                    file: file_name.to_string(),
                    message: err.to_string(),
                }),
            },
            Err(err) => result.errors.push(LoadError {
                source: "custom".to_string(),
                file: file_name.to_string(),
                message: err.to_string(),
            }),
        }
    }

    result
}

pub fn load_selector(custom_dir: Option<&Path>) -> Result<SelectorDefinition, DefinitionLoadError> {
    if let Some(dir) = custom_dir {
        let custom_path = dir.join(SELECTOR_FILENAME);
        if custom_path.is_file() {
            let raw = std::fs::read_to_string(&custom_path).map_err(|source| DefinitionLoadError::Io {
                file: SELECTOR_FILENAME.to_string(),
                source,
            })?;
            return toml::from_str(&raw).map_err(|err| DefinitionLoadError::Parse {
                file: SELECTOR_FILENAME.to_string(),
                message: err.to_string(),
            });
        }
    }
    toml::from_str(builtin::BUILTIN_SELECTOR).map_err(|err| DefinitionLoadError::Parse {
        file: SELECTOR_FILENAME.to_string(),
        message: err.to_string(),
    })
}

pub fn load_aggregator(custom_dir: Option<&Path>) -> Result<AggregatorDefinition, DefinitionLoadError> {
    if let Some(dir) = custom_dir {
        let custom_path = dir.join(AGGREGATOR_FILENAME);
        if custom_path.is_file() {
            let raw = std::fs::read_to_string(&custom_path).map_err(|source| DefinitionLoadError::Io {
                file: AGGREGATOR_FILENAME.to_string(),
                source,
            })?;
            return toml::from_str(&raw).map_err(|err| DefinitionLoadError::Parse {
                file: AGGREGATOR_FILENAME.to_string(),
                message: err.to_string(),
            });
        }
    }
    toml::from_str(builtin::BUILTIN_AGGREGATOR).map_err(|err| DefinitionLoadError::Parse {
        file: AGGREGATOR_FILENAME.to_string(),
        message: err.to_string(),
    })
}

/// Removes agents the config disables by name, per `config.agents.*.enabled`.
pub fn filter_disabled_agents(load_result: LoadResult, disabled_names: &[String]) -> LoadResult {
    let agents = load_result
        .agents
        .into_iter()
        .filter(|agent| !disabled_names.contains(&agent.name))
        .collect();
    LoadResult {
        agents,
        errors: load_result.errors,
    }
}
