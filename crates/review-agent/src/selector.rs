use std::time::Duration;

use review_config::{Config, SelectorConfig};
use review_core::agent_def::{AgentDefinition, SelectorDefinition};
use review_core::error::SelectorError;
use review_core::target::ReviewTarget;
use review_prefetch::PrefetchedContext;
use review_prompt::build_selector_instruction;
use review_tools::catalog::{resolve_tools, ResolvedTools};

#[derive(Debug, Clone, Default)]
pub struct ReferencedContent {
    pub reference_type: String,
    pub reference_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct SelectorOutput {
    pub selected_agents: Vec<String>,
    pub reasoning: String,
    pub change_intent: String,
    pub affected_files: Vec<String>,
    pub relevant_conventions: Vec<String>,
    pub issue_context: String,
    pub referenced_content: Vec<ReferencedContent>,
}

#[derive(Debug, Clone)]
pub struct SelectorExecutionContext {
    pub model: String,
    pub timeout_seconds: f64,
    pub max_turns: u32,
    pub system_prompt: String,
    pub guardrail_instructions: String,
    pub user_message: String,
    pub tools: ResolvedTools,
}

#[async_trait::async_trait]
pub trait SelectorBackend: Send + Sync {
    async fn run(&self, ctx: &SelectorExecutionContext) -> Result<SelectorOutput, String>;
}

fn resolve<T: Clone>(config_value: Option<T>, def_value: Option<T>, global_value: T) -> T {
    config_value.or(def_value).unwrap_or(global_value)
}

/// For each non-empty prefetched field, generates an instruction telling
/// the model not to re-fetch that data via tools — it was already
/// gathered. `referenced_issues` are intentionally excluded: those were
/// only heuristically relevant, not an authoritative fetch the model
/// should treat as settled.
pub fn build_prefetch_guardrail(prefetched: &PrefetchedContext) -> String {
    let mut blocks = Vec::new();
    if !prefetched.issue_context.is_empty() {
        blocks.push(
            "IMPORTANT: The linked issue's details have already been pre-fetched and are included above. \
             Do NOT use gh tools to re-fetch the issue. Use the pre-fetched data directly."
                .to_string(),
        );
    }
    if !prefetched.pr_metadata.is_empty() {
        blocks.push(
            "IMPORTANT: The pull request's metadata has already been pre-fetched and is included above. \
             Do NOT use gh tools to re-fetch the PR. Use the pre-fetched data directly."
                .to_string(),
        );
    }
    if !prefetched.project_conventions.is_empty() {
        blocks.push(
            "IMPORTANT: The project's convention files have already been pre-fetched and are included above. \
             Do NOT use file tools to re-read them. Use the pre-fetched data directly."
                .to_string(),
        );
    }
    blocks.join("\n\n")
}

#[allow(clippy::too_many_arguments)]
pub async fn run_selector(
    target: &ReviewTarget,
    available_agents: &[AgentDefinition],
    selector_definition: &SelectorDefinition,
    selector_config: &SelectorConfig,
    global: &Config,
    resolved_content: &str,
    prefetched: &PrefetchedContext,
    backend: &dyn SelectorBackend,
) -> Result<SelectorOutput, SelectorError> {
    let model = selector_config
        .model
        .clone()
        .unwrap_or_else(|| selector_definition.model.clone());
    let timeout_seconds = resolve(selector_config.timeout, selector_definition.timeout, global.timeout);
    let max_turns = resolve(selector_config.max_turns, selector_definition.max_turns, global.max_turns);

    let tools = resolve_tools(&selector_definition.allowed_tools).map_err(|err| SelectorError::Failed {
        message: err.to_string(),
        exit_code: None,
        error_type: Some("tool_policy".to_string()),
        stderr: None,
    })?;

    let user_message = build_selector_instruction(target, available_agents, resolved_content);
    let guardrail_instructions = build_prefetch_guardrail(prefetched);

    let ctx = SelectorExecutionContext {
        model,
        timeout_seconds,
        max_turns,
        system_prompt: selector_definition.system_prompt.clone(),
        guardrail_instructions,
        user_message,
        tools,
    };

    let timeout = Duration::from_secs_f64(timeout_seconds.max(0.0));
    match tokio::time::timeout(timeout, backend.run(&ctx)).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(message)) => Err(SelectorError::Failed {
            message,
            exit_code: None,
            error_type: None,
            stderr: None,
        }),
        Err(_elapsed) => Err(SelectorError::Failed {
            message: format!("selector timed out after {timeout_seconds}s"),
            exit_code: None,
            error_type: Some("timeout".to_string()),
            stderr: None,
        }),
    }
}

/// Drops selected names that do not correspond to any loaded agent,
/// silently — the selector is free to suggest names it thinks fit even if
/// a name no longer exists.
pub fn resolve_selected_agents<'a>(agents: &'a [AgentDefinition], selected_names: &[String]) -> Vec<&'a AgentDefinition> {
    agents.iter().filter(|def| selected_names.contains(&def.name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardrail_is_empty_when_nothing_prefetched() {
        let prefetched = PrefetchedContext::default();
        assert_eq!(build_prefetch_guardrail(&prefetched), "");
    }

    #[test]
    fn guardrail_mentions_each_nonempty_field() {
        let prefetched = PrefetchedContext {
            issue_context: "issue body".to_string(),
            ..Default::default()
        };
        let guardrail = build_prefetch_guardrail(&prefetched);
        assert!(guardrail.contains("issue"));
    }

    #[test]
    fn unknown_selected_names_are_silently_dropped() {
        let agents = vec![];
        let resolved = resolve_selected_agents(&agents, &["ghost".to_string()]);
        assert!(resolved.is_empty());
    }
}
