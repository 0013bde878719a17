use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::phase::Phase;

fn agent_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("static pattern is valid"))
}

pub fn is_valid_agent_name(name: &str) -> bool {
    agent_name_pattern().is_match(name)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicabilityRule {
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub content_patterns: Vec<String>,
}

impl ApplicabilityRule {
    /// Pure pre-filter: does this rule apply to the given file set / content?
    /// `always` short-circuits, then file-pattern basename globs, then
    /// content regex search. An empty rule (no always, no patterns) never
    /// matches.
    pub fn matches(&self, file_paths: &[String], content: &str) -> bool {
        if self.always {
            return true;
        }
        if !self.file_patterns.is_empty() {
            let matched = self.file_patterns.iter().any(|pattern| {
                file_paths.iter().any(|path| {
                    let basename = path.rsplit('/').next().unwrap_or(path);
                    glob::Pattern::new(pattern)
                        .map(|p| p.matches(basename))
                        .unwrap_or(false)
                })
            });
            if matched {
                return true;
            }
        }
        if !self.content_patterns.is_empty() {
            return self.content_patterns.iter().any(|pattern| {
                Regex::new(pattern).map(|re| re.is_match(content)).unwrap_or(false)
            });
        }
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    /// Mandatory: unlike timeout/max_turns, there is no definition-level
    /// fallback model, so resolution against it is only ever two-layer.
    pub model: String,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub applicability: ApplicabilityRule,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorDefinition {
    pub model: String,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorDefinition {
    pub model: String,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadError {
    pub source: String,
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadResult {
    pub agents: Vec<AgentDefinition>,
    pub errors: Vec<LoadError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_rule_matches_anything() {
        let rule = ApplicabilityRule {
            always: true,
            ..Default::default()
        };
        assert!(rule.matches(&[], ""));
    }

    #[test]
    fn file_pattern_matches_by_basename() {
        let rule = ApplicabilityRule {
            always: false,
            file_patterns: vec!["*.rs".to_string()],
            content_patterns: vec![],
        };
        assert!(rule.matches(&["src/lib.rs".to_string()], ""));
        assert!(!rule.matches(&["src/lib.py".to_string()], ""));
    }

    #[test]
    fn content_pattern_searches_diff_text() {
        let rule = ApplicabilityRule {
            always: false,
            file_patterns: vec![],
            content_patterns: vec!["TODO".to_string()],
        };
        assert!(rule.matches(&[], "// TODO: fix this"));
        assert!(!rule.matches(&[], "nothing interesting"));
    }

    #[test]
    fn empty_rule_never_matches() {
        let rule = ApplicabilityRule::default();
        assert!(!rule.matches(&["a.rs".to_string()], "anything"));
    }

    #[test]
    fn agent_name_pattern_rejects_uppercase_and_leading_digit() {
        assert!(is_valid_agent_name("style-review"));
        assert!(is_valid_agent_name("security_audit"));
        assert!(!is_valid_agent_name("Style"));
        assert!(!is_valid_agent_name("1agent"));
    }
}
